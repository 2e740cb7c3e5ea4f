//! Result codes written into the first normal word of every response.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error description field (bits 0..10).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorDescription {
    /// No error.
    Success = 0,
    /// A size argument is out of bounds.
    InvalidSize = 1004,
    /// The arguments are individually valid but not together.
    InvalidCombination = 1006,
    /// The operation is not implemented.
    NotImplemented = 1012,
    /// The handle argument is invalid.
    InvalidHandle = 1015,
    /// The target has not been initialised.
    NotInitialized = 1016,
    /// The target was already initialised.
    AlreadyInitialized = 1017,
    /// Nothing matched the request.
    NotFound = 1018,
    /// An equivalent object already exists.
    AlreadyExists = 1020,
    /// A value is out of range.
    OutOfRange = 1021,
}

/// Module field (bits 10..18), naming the component that raised the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorModule {
    /// Generic errors.
    Common = 0,
    /// Kernel, including IPC plumbing.
    Kernel = 1,
    /// Service manager.
    Srv = 25,
    /// Applet manager.
    Applet = 51,
}

/// Summary field (bits 21..27).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorSummary {
    /// No error.
    Success = 0,
    /// The call had no effect.
    NothingHappened = 1,
    /// The target is not in a state that allows the call.
    InvalidState = 5,
    /// The call is not supported.
    NotSupported = 6,
    /// An argument was rejected.
    InvalidArgument = 7,
    /// An argument has the wrong shape.
    WrongArgument = 8,
    /// Internal failure.
    Internal = 11,
}

/// Level field (bits 27..32).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorLevel {
    /// No error.
    Success = 0,
    /// Informational result.
    Info = 1,
    /// State-dependent failure.
    Status = 25,
    /// Transient failure, retry may succeed.
    Temporary = 26,
    /// Permanent failure.
    Permanent = 27,
    /// The caller misused the interface.
    Usage = 28,
}

/// Packed 32-bit result code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultCode(u32);

impl ResultCode {
    /// The success code.
    pub const SUCCESS: Self = Self(0);

    /// Returned by handlers whose request parameters cannot be decoded.
    pub const INVALID_PARAMETERS: Self = Self::new(
        ErrorDescription::OutOfRange,
        ErrorModule::Kernel,
        ErrorSummary::InvalidArgument,
        ErrorLevel::Usage,
    );

    /// Returned by handlers whose backing module is not active.
    pub const MODULE_UNAVAILABLE: Self = Self::new(
        ErrorDescription::NotInitialized,
        ErrorModule::Common,
        ErrorSummary::InvalidState,
        ErrorLevel::Status,
    );

    /// Packs the four fields into a code.
    #[must_use]
    pub const fn new(
        description: ErrorDescription,
        module: ErrorModule,
        summary: ErrorSummary,
        level: ErrorLevel,
    ) -> Self {
        Self(
            (description as u32 & 0x3FF)
                | ((module as u32 & 0xFF) << 10)
                | ((summary as u32 & 0x3F) << 21)
                | ((level as u32 & 0x1F) << 27),
        )
    }

    /// Wraps a raw code, typically read from configuration.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw code.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Success codes have the sign bit clear.
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 & 0x8000_0000 == 0
    }

    /// Raw description field.
    #[must_use]
    pub const fn description(self) -> u32 {
        self.0 & 0x3FF
    }

    /// Raw module field.
    #[must_use]
    pub const fn module(self) -> u32 {
        (self.0 >> 10) & 0xFF
    }

    /// Raw summary field.
    #[must_use]
    pub const fn summary(self) -> u32 {
        (self.0 >> 21) & 0x3F
    }

    /// Raw level field.
    #[must_use]
    pub const fn level(self) -> u32 {
        self.0 >> 27
    }
}

impl Default for ResultCode {
    fn default() -> Self {
        Self::SUCCESS
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010X}", self.0)
    }
}
