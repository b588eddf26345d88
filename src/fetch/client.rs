use reqwest::blocking::Request;
use thiserror::Error;

/// Status code and raw body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as lossy UTF-8, truncated for log and error messages.
    pub fn body_snippet(&self) -> String {
        String::from_utf8_lossy(&self.body).chars().take(200).collect()
    }
}

/// The request never produced a response (DNS, TLS, timeout, bad header...).
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError(err.to_string())
    }
}

/// Blocking request executor. Decorators in [`crate::fetch::auth`] wrap an
/// implementation to add headers or query parameters.
pub trait HttpClient {
    fn execute(&self, req: Request) -> Result<HttpResponse, TransportError>;
}

impl<C: HttpClient + ?Sized> HttpClient for &C {
    fn execute(&self, req: Request) -> Result<HttpResponse, TransportError> {
        (**self).execute(req)
    }
}
