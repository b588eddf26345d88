//! Error types for the TDX client and the flattening pipeline.
//!
//! Every condition a caller can run into is a variant of [`TdxError`]. None of
//! them are retried internally; batch callers use
//! [`TdxError::is_recoverable`] to decide whether to keep going.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, TdxError>;

#[derive(Debug, Error)]
pub enum TdxError {
    /// Selector (county, city or operator code) outside its closed set.
    #[error("invalid {kind} '{value}', valid values are: {}", valid.join(", "))]
    InvalidSelector {
        kind: &'static str,
        value: String,
        valid: Vec<String>,
    },

    /// Route id that cannot name a single route: empty, a dot segment or
    /// containing control characters.
    #[error("invalid route id '{0}'")]
    InvalidRouteId(String),

    /// Output mode other than `text` or `geometry`.
    #[error("invalid output mode '{0}', expected 'text' or 'geometry'")]
    InvalidOutputMode(String),

    /// Destination file extension does not match the output mode.
    #[error("destination {} does not match {mode} output (expected {expected})", path.display())]
    ExtensionMismatch {
        mode: &'static str,
        path: PathBuf,
        expected: &'static str,
    },

    /// Transport failure, non-2xx status or unparseable body on a resource call.
    #[error("invalid token or unreachable service ({url}): {reason}")]
    Unreachable { url: String, reason: String },

    /// The platform does not publish this resource for the selector.
    #[error("{resource} is not offered for '{selector}'")]
    NotOffered {
        resource: &'static str,
        selector: String,
    },

    /// The HTTP client itself could not be built.
    #[error("HTTP client setup failed: {0}")]
    ClientSetup(String),

    /// Token endpoint could not be reached.
    #[error("token request failed: {0}")]
    TokenTransport(String),

    /// Token endpoint answered with a non-success status.
    #[error("token endpoint returned status {status}: {body}")]
    TokenStatus { status: u16, body: String },

    /// Token endpoint answered without an `access_token` string.
    #[error("token response has no access_token field")]
    MissingAccessToken,

    /// A fare document mixes records of different pricing types.
    #[error("fare records for one route use more than one FarePricingType")]
    MixedFarePricing,

    #[error("unknown FarePricingType {0}")]
    UnknownFarePricing(String),

    /// The shapefile set could not be written.
    #[error("shapefile output failed: {0}")]
    Shapefile(String),

    /// A WKT string could not be turned into a geometry.
    #[error("malformed geometry '{wkt}': {message}")]
    Geometry { wkt: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl TdxError {
    /// `true` for the warning-level signals a batch caller may skip past:
    /// an unreachable service or a resource not offered for the selector.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TdxError::Unreachable { .. } | TdxError::NotOffered { .. }
        )
    }

    /// `true` when the error was raised by input validation, before any request.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TdxError::InvalidSelector { .. }
                | TdxError::InvalidRouteId(_)
                | TdxError::InvalidOutputMode(_)
                | TdxError::ExtensionMismatch { .. }
        )
    }
}
