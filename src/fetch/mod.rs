mod basic;
mod client;
pub mod auth;
pub mod mock;

pub use basic::BasicClient;
pub use client::{HttpClient, HttpResponse, TransportError};

use reqwest::Method;
use reqwest::blocking::Request;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Result, TdxError};
use crate::parser::parse_payload;
use auth::{AuthHeader, Bearer, UrlParam};

/// Performs one authorized GET against a resource endpoint and parses the
/// JSON body.
///
/// Transport failures, non-2xx statuses and unparseable bodies all surface
/// as [`TdxError::Unreachable`]; from the caller's side they are the same
/// "invalid token or unreachable service" condition.
pub fn fetch_json<C: HttpClient>(
    client: &C,
    url: &str,
    auth: &AuthHeader,
    query: &[(&str, &str)],
) -> Result<Value> {
    let unreachable = |reason: String| {
        warn!(url, reason = %reason, "Invalid token or unreachable service");
        TdxError::Unreachable {
            url: url.to_string(),
            reason,
        }
    };

    let mut parsed: reqwest::Url = url
        .parse()
        .map_err(|e| unreachable(format!("invalid url: {e}")))?;
    if !query.is_empty() {
        parsed.query_pairs_mut().extend_pairs(query);
    }

    let client = UrlParam::json_format(Bearer::new(client, auth.clone()));
    debug!(url = %parsed, "GET");
    let resp = client
        .execute(Request::new(Method::GET, parsed))
        .map_err(|e| unreachable(e.to_string()))?;

    if !resp.is_success() {
        return Err(unreachable(format!(
            "status {}: {}",
            resp.status,
            resp.body_snippet()
        )));
    }

    parse_payload(&resp.body).map_err(|e| unreachable(format!("unparseable body: {e}")))
}
