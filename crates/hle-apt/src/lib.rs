//! Applet manager (APT) service.
//!
//! APT coordinates the applets running on the console: it hands out the
//! lock mutex, tracks which applets registered, relays parameters between
//! them and sequences library applet launches and application jumps. The
//! three facades [`APT_U`], [`APT_A`] and [`APT_S`] expose the same command
//! table over one [`AptState`], so an applet talking to `APT:U` and the home
//! menu talking to `APT:S` see the same pending parameter.
//!
//! ```
//! use hle_apt::{AptServices, AptState, MAX_APT_SESSIONS};
//! use hle_ipc::{DispatchPolicy, Dispatcher, ServiceManager, SharedModule};
//!
//! let module = SharedModule::active("apt", AptState::new(false));
//! let dispatcher = Dispatcher::with_policy(DispatchPolicy::default());
//! let services = AptServices::new(module, MAX_APT_SESSIONS, &dispatcher)?;
//! let manager = ServiceManager::new();
//! services.register(&manager)?;
//! assert_eq!(manager.names(), ["APT:U", "APT:A", "APT:S"]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod applet;
mod commands;
mod errors;
mod facades;
mod state;

#[cfg(test)]
mod tests;

pub use applet::{AppletId, SignalType};
pub use commands::{APT_COMMANDS, apt_commands};
pub use errors::{
    ALREADY_REGISTERED, APPLET_NOT_FOUND, ARGUMENT_OUT_OF_RANGE, AptError, JUMP_NOT_PREPARED,
    LIBRARY_APPLET_STATE, NO_PARAMETER, PARAMETER_PRESENT,
};
pub use facades::{APT_A, APT_S, APT_U, AptServices, MAX_APT_SESSIONS};
pub use state::{
    AppletManInfo, AppletSlot, ApplicationJump, AptState, CAPTURE_BUFFER_INFO_SIZE,
    DELIVER_ARG_SIZE, DELIVER_HMAC_SIZE, DeliverArg, LibraryApplet, LibraryStage,
    MAX_STARTUP_ARGUMENT_SIZE, MessageParameter, SYS_MENU_ARG_SIZE, WIRELESS_REBOOT_INFO_SIZE,
};
