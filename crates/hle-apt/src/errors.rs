//! APT failures and the result codes the guest sees for them.

use hle_ipc::{ErrorDescription, ErrorLevel, ErrorModule, ErrorSummary, HandlerFailure, ResultCode};
use thiserror::Error;

use crate::applet::AppletId;

const fn applet_code(description: ErrorDescription, summary: ErrorSummary) -> ResultCode {
    ResultCode::new(description, ErrorModule::Applet, summary, ErrorLevel::Status)
}

/// A parameter is already waiting for its destination.
pub const PARAMETER_PRESENT: ResultCode =
    applet_code(ErrorDescription::AlreadyExists, ErrorSummary::InvalidState);
/// No parameter is waiting for the caller.
pub const NO_PARAMETER: ResultCode =
    applet_code(ErrorDescription::NotFound, ErrorSummary::InvalidState);
/// The applet slot is already registered.
pub const ALREADY_REGISTERED: ResultCode =
    applet_code(ErrorDescription::AlreadyInitialized, ErrorSummary::InvalidState);
/// No registered applet matches the request.
pub const APPLET_NOT_FOUND: ResultCode =
    applet_code(ErrorDescription::NotFound, ErrorSummary::NotSupported);
/// The library applet slot is in the wrong stage for the request.
pub const LIBRARY_APPLET_STATE: ResultCode =
    applet_code(ErrorDescription::InvalidCombination, ErrorSummary::InvalidState);
/// An application jump was requested without preparing it.
pub const JUMP_NOT_PREPARED: ResultCode =
    applet_code(ErrorDescription::NotInitialized, ErrorSummary::InvalidState);
/// An argument is outside the accepted range.
pub const ARGUMENT_OUT_OF_RANGE: ResultCode = ResultCode::new(
    ErrorDescription::OutOfRange,
    ErrorModule::Applet,
    ErrorSummary::InvalidArgument,
    ErrorLevel::Usage,
);

/// Errors raised by APT state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AptError {
    /// A parameter is pending and has not been received yet.
    #[error("a parameter from {sender} to {destination} is still pending")]
    ParameterPresent {
        sender: AppletId,
        destination: AppletId,
    },

    /// No parameter is pending for the caller.
    #[error("no parameter is pending for {applet}")]
    NoParameter { applet: AppletId },

    /// The applet already registered.
    #[error("applet {applet} is already registered")]
    AlreadyRegistered { applet: AppletId },

    /// No registered applet matches.
    #[error("no registered applet matches attributes {attributes:#010X}")]
    AppletNotFound { attributes: u32 },

    /// The library applet slot is in the wrong stage.
    #[error("library applet slot cannot {operation} while {stage}")]
    LibraryAppletState {
        operation: &'static str,
        stage: &'static str,
    },

    /// The requested applet is not the one occupying the library slot.
    #[error("library applet {requested} does not occupy the library slot")]
    LibraryAppletMismatch { requested: AppletId },

    /// No application jump was prepared.
    #[error("application jump was not prepared")]
    JumpNotPrepared,

    /// A value is outside its accepted range.
    #[error("{name} = {value} is out of range")]
    OutOfRange { name: &'static str, value: u32 },
}

impl AptError {
    /// Result code reported to the guest.
    #[must_use]
    pub const fn result_code(&self) -> ResultCode {
        match self {
            Self::ParameterPresent { .. } => PARAMETER_PRESENT,
            Self::NoParameter { .. } => NO_PARAMETER,
            Self::AlreadyRegistered { .. } => ALREADY_REGISTERED,
            Self::AppletNotFound { .. } => APPLET_NOT_FOUND,
            Self::LibraryAppletState { .. } | Self::LibraryAppletMismatch { .. } => {
                LIBRARY_APPLET_STATE
            }
            Self::JumpNotPrepared => JUMP_NOT_PREPARED,
            Self::OutOfRange { .. } => ARGUMENT_OUT_OF_RANGE,
        }
    }
}

impl From<AptError> for HandlerFailure {
    fn from(error: AptError) -> Self {
        Self::new(error.result_code(), error.to_string())
    }
}
