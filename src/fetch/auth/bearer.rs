use reqwest::header::{AUTHORIZATION, HeaderValue};

use super::AuthHeader;
use crate::fetch::client::{HttpClient, HttpResponse, TransportError};

/// An [`HttpClient`] wrapper that sends `authorization: Bearer <token>` on
/// every request it forwards.
pub struct Bearer<C> {
    pub inner: C,
    pub header: AuthHeader,
}

impl<C> Bearer<C> {
    pub fn new(inner: C, header: AuthHeader) -> Self {
        Self { inner, header }
    }
}

impl<C: HttpClient> HttpClient for Bearer<C> {
    fn execute(
        &self,
        mut req: reqwest::blocking::Request,
    ) -> Result<HttpResponse, TransportError> {
        let value = HeaderValue::from_str(self.header.value())
            .map_err(|e| TransportError(format!("invalid authorization header: {e}")))?;
        req.headers_mut().insert(AUTHORIZATION, value);
        self.inner.execute(req)
    }
}
