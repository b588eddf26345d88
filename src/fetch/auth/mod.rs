//! OAuth2 client-credentials exchange and request decorators.
//!
//! [`acquire_token`] trades an application id/key pair for an [`AuthHeader`].
//! [`Bearer`] attaches that header to outgoing requests and [`UrlParam`]
//! appends the `$format=JSON` flag every resource endpoint expects.

mod bearer;
mod url_param;

pub use bearer::Bearer;
pub use url_param::UrlParam;

use reqwest::Method;
use reqwest::blocking::{Body, Request};
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Result, TdxError};
use crate::fetch::client::HttpClient;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// `authorization` header value of the form `Bearer <token>`.
///
/// Immutable; obtained once and passed into every resource call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeader(String);

impl AuthHeader {
    pub fn from_token(token: &str) -> Self {
        Self(format!("Bearer {token}"))
    }

    /// Full header value, `Bearer ` prefix included.
    pub fn value(&self) -> &str {
        &self.0
    }
}

/// Form fields of the client-credentials grant.
pub fn credentials_form(app_id: &str, app_secret: &str) -> Vec<(&'static str, String)> {
    vec![
        ("content-type", FORM_CONTENT_TYPE.to_string()),
        ("grant_type", "client_credentials".to_string()),
        ("client_id", app_id.to_string()),
        ("client_secret", app_secret.to_string()),
    ]
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
}

/// Pulls `access_token` out of a token endpoint response body.
pub fn bearer_from_response(body: &[u8]) -> Result<AuthHeader> {
    let resp: TokenResponse =
        serde_json::from_slice(body).map_err(|_| TdxError::MissingAccessToken)?;
    if let Some(expires_in) = resp.expires_in {
        debug!(expires_in, "Token lifetime");
    }
    resp.access_token
        .as_deref()
        .map(AuthHeader::from_token)
        .ok_or(TdxError::MissingAccessToken)
}

/// Exchanges `app_id`/`app_secret` for a bearer header at `auth_url`.
///
/// A single attempt is made. Transport failures, non-2xx responses and bodies
/// without `access_token` come back as distinct [`TdxError`] variants.
#[tracing::instrument(skip(client, app_secret), fields(app_id = %app_id))]
pub fn acquire_token<C: HttpClient>(
    client: &C,
    auth_url: &str,
    app_id: &str,
    app_secret: &str,
) -> Result<AuthHeader> {
    let url = auth_url
        .parse()
        .map_err(|e| TdxError::TokenTransport(format!("invalid token url {auth_url}: {e}")))?;
    let form = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(credentials_form(app_id, app_secret))
        .finish();

    let mut req = Request::new(Method::POST, url);
    req.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
    *req.body_mut() = Some(Body::from(form));

    let resp = client
        .execute(req)
        .map_err(|e| TdxError::TokenTransport(e.to_string()))?;

    if !resp.is_success() {
        warn!(status = resp.status, "Token endpoint rejected credentials");
        return Err(TdxError::TokenStatus {
            status: resp.status,
            body: resp.body_snippet(),
        });
    }

    let header = bearer_from_response(&resp.body)?;
    debug!("Access token acquired");
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::mock::MockClient;

    const AUTH_URL: &str = "https://auth.example.test/token";

    #[test]
    fn test_header_has_bearer_prefix() {
        let header = AuthHeader::from_token("abc");
        assert_eq!(header.value(), "Bearer abc");
    }

    #[test]
    fn test_credentials_form_fields() {
        let form = credentials_form("id", "secret");
        let keys: Vec<_> = form.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, ["content-type", "grant_type", "client_id", "client_secret"]);
        assert_eq!(form[1].1, "client_credentials");
    }

    #[test]
    fn test_acquire_token_success() {
        let client = MockClient::new().json("/token", r#"{"access_token":"t0k3n","expires_in":86400}"#);
        let header = acquire_token(&client, AUTH_URL, "my-id", "my-secret").unwrap();
        assert_eq!(header.value(), "Bearer t0k3n");

        let sent = client.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, "POST");
        let body = sent[0].body.as_deref().unwrap();
        assert!(body.contains("grant_type=client_credentials"));
        assert!(body.contains("client_id=my-id"));
        assert!(body.contains("client_secret=my-secret"));
    }

    #[test]
    fn test_acquire_token_missing_field() {
        let client = MockClient::new().json("/token", r#"{"error":"invalid_client"}"#);
        let err = acquire_token(&client, AUTH_URL, "id", "secret").unwrap_err();
        assert!(matches!(err, TdxError::MissingAccessToken));
    }

    #[test]
    fn test_acquire_token_bad_status() {
        let client = MockClient::new().respond("/token", 401, r#"{"error":"unauthorized"}"#);
        let err = acquire_token(&client, AUTH_URL, "id", "secret").unwrap_err();
        assert!(matches!(err, TdxError::TokenStatus { status: 401, .. }));
    }

    #[test]
    fn test_acquire_token_transport_failure() {
        let client = MockClient::new().fail("/token", "connection refused");
        let err = acquire_token(&client, AUTH_URL, "id", "secret").unwrap_err();
        match err {
            TdxError::TokenTransport(msg) => assert!(msg.contains("connection refused")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
