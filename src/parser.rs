//! JSON payload decoding and response-shape normalization.

use serde_json::Value;

/// Decodes a response body into a JSON document.
///
/// # Errors
///
/// Returns an error if the bytes are not valid JSON.
pub fn parse_payload(bytes: &[u8]) -> Result<Value, serde_json::Error> {
    serde_json::from_slice(bytes)
}

/// Returns the record list of a payload.
///
/// Version-2 endpoints answer with a bare array; version-3 endpoints wrap it
/// in an object under `wrapper` (e.g. `Stations`). Anything else yields an
/// empty slice.
pub fn records<'a>(payload: &'a Value, wrapper: &str) -> &'a [Value] {
    match payload {
        Value::Array(items) => items,
        Value::Object(map) => map
            .get(wrapper)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]),
        _ => &[],
    }
}

/// `true` when the platform signals that it has no data for the requested
/// area: an empty list or a `{"Message": ...}` object instead of records.
pub fn reports_no_service(payload: &Value, wrapper: &str) -> bool {
    match payload {
        Value::Object(map) if map.contains_key("Message") => true,
        _ => records(payload, wrapper).is_empty(),
    }
}
