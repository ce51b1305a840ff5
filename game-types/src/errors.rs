use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

/// Failure taxonomy shared by every coordinator operation. Each failure maps
/// to exactly one kind; partial success is never reported as an error, and
/// idempotent no-ops are successes carrying an explicit flag instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, Error)]
#[ts(export)]
pub enum CoordinatorError {
    #[error("caller identity required")]
    Unauthenticated,
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },
    #[error("{what} not found")]
    NotFound { what: String },
    #[error("permission denied: {reason}")]
    PermissionDenied { reason: String },
    #[error("precondition failed: {reason}")]
    FailedPrecondition { reason: String },
    #[error("internal error: {reason}")]
    Internal { reason: String },
}

impl CoordinatorError {
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        CoordinatorError::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        CoordinatorError::NotFound { what: what.into() }
    }

    pub fn permission_denied(reason: impl Into<String>) -> Self {
        CoordinatorError::PermissionDenied {
            reason: reason.into(),
        }
    }

    pub fn failed_precondition(reason: impl Into<String>) -> Self {
        CoordinatorError::FailedPrecondition {
            reason: reason.into(),
        }
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        CoordinatorError::Internal {
            reason: reason.into(),
        }
    }
}
