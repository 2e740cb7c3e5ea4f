//! Failures reported by command handlers.

use thiserror::Error;

use crate::ipc::{ParameterError, ResultCode};
use crate::module::ModuleError;

/// A handler's refusal to complete a request.
///
/// The dispatcher does not interpret the failure; it answers the guest with a
/// one-word error response carrying [`HandlerFailure::result`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("handler failed with {result}: {reason}")]
pub struct HandlerFailure {
    result: ResultCode,
    reason: String,
}

impl HandlerFailure {
    /// Builds a failure answered with `result`.
    #[must_use]
    pub fn new(result: ResultCode, reason: impl Into<String>) -> Self {
        Self {
            result,
            reason: reason.into(),
        }
    }

    /// Result code written into the error response.
    #[must_use]
    pub const fn result(&self) -> ResultCode {
        self.result
    }

    /// Human-readable reason for diagnostics.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl From<ParameterError> for HandlerFailure {
    fn from(error: ParameterError) -> Self {
        Self::new(ResultCode::INVALID_PARAMETERS, error.to_string())
    }
}

impl From<ModuleError> for HandlerFailure {
    fn from(error: ModuleError) -> Self {
        Self::new(ResultCode::MODULE_UNAVAILABLE, error.to_string())
    }
}
