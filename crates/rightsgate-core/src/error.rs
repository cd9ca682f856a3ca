//! Shared error type across rightsgate crates.

use std::time::Duration;

use thiserror::Error;

/// Caller-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid input / malformed configuration.
    BadRequest,
    /// Unsupported configuration version.
    UnsupportedVersion,
    /// A stored policy could not be decoded.
    MalformedPolicy,
    /// The policy store failed.
    StoreUnavailable,
    /// The policy store did not answer in time.
    StoreTimeout,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in JSON output and metrics labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::MalformedPolicy => "MALFORMED_POLICY",
            ErrorCode::StoreUnavailable => "STORE_UNAVAILABLE",
            ErrorCode::StoreTimeout => "STORE_TIMEOUT",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, RightsGateError>;

/// Unified error type used by core and engine.
#[derive(Debug, Error)]
pub enum RightsGateError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("malformed policy {policy_id}: {reason}")]
    MalformedPolicy { policy_id: u64, reason: String },
    #[error("policy store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("policy store timed out after {0:?}")]
    StoreTimeout(Duration),
    #[error("internal: {0}")]
    Internal(String),
}

impl RightsGateError {
    /// Map internal error to a stable caller-facing code.
    pub fn code(&self) -> ErrorCode {
        match self {
            RightsGateError::BadRequest(_) => ErrorCode::BadRequest,
            RightsGateError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            RightsGateError::MalformedPolicy { .. } => ErrorCode::MalformedPolicy,
            RightsGateError::StoreUnavailable(_) => ErrorCode::StoreUnavailable,
            RightsGateError::StoreTimeout(_) => ErrorCode::StoreTimeout,
            RightsGateError::Internal(_) => ErrorCode::Internal,
        }
    }

    pub(crate) fn malformed(policy_id: u64, reason: impl Into<String>) -> Self {
        RightsGateError::MalformedPolicy {
            policy_id,
            reason: reason.into(),
        }
    }
}
