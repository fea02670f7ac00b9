//! Shared error type across tripmeter crates.

use thiserror::Error;

use crate::metrics::MetricKind;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed request.
    BadRequest,
    /// Requested resource does not exist.
    NotFound,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, TripmeterError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum TripmeterError {
    /// A family with this name exists under a different signature.
    #[error("metric {name} already registered with a different signature")]
    DuplicateMetricName { name: String },
    /// Label names presented do not match the family's declaration.
    #[error("label mismatch on {metric}: expected {expected:?}, got {got:?}")]
    LabelMismatch {
        metric: String,
        expected: Vec<String>,
        got: Vec<String>,
    },
    #[error("metric {metric} is a {actual}, not a {expected}")]
    WrongMetricKind {
        metric: String,
        expected: MetricKind,
        actual: MetricKind,
    },
    #[error("invalid metric or label name: {0}")]
    InvalidMetricName(String),
    #[error("invalid buckets: {0}")]
    InvalidBuckets(String),
    #[error("invalid observation on {metric}: {value}")]
    InvalidObservation { metric: String, value: f64 },
    #[error("exposition failed: {0}")]
    ExpositionFailure(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl TripmeterError {
    /// Map internal error to a stable client-facing code.
    ///
    /// Metric registration and recording errors are programmer errors and
    /// surface as `INTERNAL`.
    pub fn client_code(&self) -> ClientCode {
        match self {
            TripmeterError::BadRequest(_) | TripmeterError::InvalidBuckets(_) => {
                ClientCode::BadRequest
            }
            TripmeterError::NotFound(_) => ClientCode::NotFound,
            TripmeterError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            TripmeterError::DuplicateMetricName { .. }
            | TripmeterError::LabelMismatch { .. }
            | TripmeterError::WrongMetricKind { .. }
            | TripmeterError::InvalidMetricName(_)
            | TripmeterError::InvalidObservation { .. }
            | TripmeterError::ExpositionFailure(_)
            | TripmeterError::Internal(_) => ClientCode::Internal,
        }
    }
}
