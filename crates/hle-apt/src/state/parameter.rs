//! Parameters exchanged between applets.

use serde::{Deserialize, Serialize};

use crate::applet::{AppletId, SignalType};

/// Message queued by one applet for another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageParameter {
    /// Applet that sent the parameter.
    pub sender: AppletId,
    /// Applet the parameter is for.
    pub destination: AppletId,
    /// Raw signal word.
    pub signal: u32,
    /// Handle passed along with the parameter, zero when absent.
    pub object: u32,
    /// Payload bytes.
    pub buffer: Vec<u8>,
}

impl MessageParameter {
    /// A parameter carrying only a signal.
    #[must_use]
    pub const fn signal(sender: AppletId, destination: AppletId, signal: SignalType) -> Self {
        Self {
            sender,
            destination,
            signal: signal.raw(),
            object: 0,
            buffer: Vec::new(),
        }
    }

    /// Whether `applet` may receive the parameter. Parameters addressed to
    /// [`AppletId::ANY_LIBRARY_APPLET`] go to whichever library applet asks.
    #[must_use]
    pub const fn is_for(&self, applet: AppletId) -> bool {
        self.destination.0 == applet.0
            || (self.destination.0 == AppletId::ANY_LIBRARY_APPLET.0 && applet.is_library_applet())
    }
}
