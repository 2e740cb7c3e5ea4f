//! JSONL records read from and written to a replay trace.
//!
//! Each input line is one [`ReplayCommand`], tagged by `op`:
//!
//! ```text
//! {"op":"connect","session":"app","service":"APT:U"}
//! {"op":"request","session":"app","words":[65600,32]}
//! {"op":"close","session":"app"}
//! ```
//!
//! Each command yields one [`ReplayEvent`] line, tagged by `event`.

use hle_ipc::{ModuleSnapshot, OutputBuffer};
use serde::{Deserialize, Serialize};

/// One step of a replay trace.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ReplayCommand {
    /// Opens a session named `session` on `service`.
    Connect {
        /// Trace-local session name.
        session: String,
        /// Registered facade name.
        service: String,
    },
    /// Sends a command buffer over an open session.
    Request {
        /// Trace-local session name.
        session: String,
        /// Raw command buffer words, header first.
        words: Vec<u32>,
        /// Static buffer payloads in descriptor order.
        #[serde(default)]
        buffers: Vec<Vec<u8>>,
    },
    /// Closes a session.
    Close {
        /// Trace-local session name.
        session: String,
    },
    /// Captures the APT module state.
    Snapshot,
    /// Replaces the APT module state.
    Restore {
        /// Snapshot produced by an earlier `snapshot` step.
        snapshot: ModuleSnapshot,
    },
}

/// Result of one replay step.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReplayEvent {
    /// A session was opened.
    Connected {
        /// Trace-local session name.
        session: String,
        /// Facade the session is bound to.
        service: String,
        /// Identifier assigned by the service manager.
        id: u64,
    },
    /// A request was answered.
    Response {
        /// Trace-local session name.
        session: String,
        /// How the dispatcher answered: `handled`, `stubbed`, `unknown` or
        /// `malformed`.
        outcome: String,
        /// Response words, header first.
        words: Vec<u32>,
        /// Static buffers to copy back.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        buffers: Vec<OutputBuffer>,
    },
    /// The session closed before the response could be delivered.
    Dropped {
        /// Trace-local session name.
        session: String,
    },
    /// A session was closed.
    Closed {
        /// Trace-local session name.
        session: String,
    },
    /// Module state captured by a `snapshot` step.
    Snapshot {
        /// The captured state.
        snapshot: ModuleSnapshot,
    },
    /// Module state replaced by a `restore` step.
    Restored {
        /// Name of the restored module.
        module: String,
    },
    /// The step could not be applied.
    Error {
        /// One-based line number in the trace.
        line: usize,
        /// Human-readable reason.
        message: String,
    },
}
