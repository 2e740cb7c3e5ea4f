//! Error types for module lifecycle and snapshot failures.

use thiserror::Error;

/// Errors surfaced when accessing a [`SharedModule`](super::SharedModule).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModuleError {
    /// The module has not been activated yet.
    #[error("module '{module}' is not active")]
    NotActive { module: String },

    /// The module was activated twice.
    #[error("module '{module}' is already active")]
    AlreadyActive { module: String },

    /// The module was torn down; no facade may use it any more.
    #[error("module '{module}' has been torn down")]
    TornDown { module: String },

    /// A handler panicked while holding the state lock.
    #[error("module '{module}' state lock is poisoned")]
    Poisoned { module: String },
}

impl ModuleError {
    pub(crate) fn not_active(module: &str) -> Self {
        Self::NotActive {
            module: module.to_owned(),
        }
    }

    pub(crate) fn already_active(module: &str) -> Self {
        Self::AlreadyActive {
            module: module.to_owned(),
        }
    }

    pub(crate) fn torn_down(module: &str) -> Self {
        Self::TornDown {
            module: module.to_owned(),
        }
    }

    pub(crate) fn poisoned(module: &str) -> Self {
        Self::Poisoned {
            module: module.to_owned(),
        }
    }
}

/// Errors surfaced while capturing or restoring a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The module could not be accessed.
    #[error(transparent)]
    Module(#[from] ModuleError),

    /// The snapshot was taken from another module.
    #[error("snapshot of module '{found}' cannot restore module '{expected}'")]
    ModuleMismatch { expected: String, found: String },

    /// The state could not be encoded or decoded.
    #[error("failed to encode module state: {0}")]
    Encoding(#[from] serde_json::Error),
}
