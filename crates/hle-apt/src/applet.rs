//! Applet identifiers and parameter signal types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of an applet slot as the guest names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppletId(pub u32);

impl AppletId {
    /// No applet.
    pub const NONE: Self = Self(0);
    /// Any system applet.
    pub const ANY_SYSTEM_APPLET: Self = Self(0x100);
    /// The home menu.
    pub const HOME_MENU: Self = Self(0x101);
    /// The running application.
    pub const APPLICATION: Self = Self(0x300);
    /// Any library applet.
    pub const ANY_LIBRARY_APPLET: Self = Self(0x400);
    /// Software keyboard library applet.
    pub const SOFTWARE_KEYBOARD: Self = Self(0x401);
    /// Error display library applet.
    pub const ERROR_DISPLAY: Self = Self(0x406);

    /// Library applet ids live in `0x400..0x500`.
    #[must_use]
    pub const fn is_library_applet(self) -> bool {
        self.0 & 0xF00 == 0x400
    }
}

impl From<u32> for AppletId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for AppletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#05X}", self.0)
    }
}

/// Signal attached to a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SignalType {
    /// No signal.
    None = 0,
    /// Wake the destination applet.
    Wakeup = 1,
    /// Request sent to a library applet.
    Request = 2,
    /// Response from a library applet.
    Response = 3,
    /// The destination should exit.
    Exit = 4,
    /// Free-form message.
    Message = 5,
    /// Wake the application after a library applet exits.
    WakeupByExit = 10,
    /// Wake the application after a library applet is paused.
    WakeupByPause = 11,
    /// Wake the application after a library applet is cancelled.
    WakeupByCancel = 12,
}

impl SignalType {
    /// Raw signal word.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self as u32
    }
}
