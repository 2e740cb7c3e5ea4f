//! Save-state support for shared modules.
//!
//! A snapshot captures the full module state so that a restored module
//! behaves identically to the original for every subsequent request. The
//! encoded form is JSON; only the round trip is guaranteed, not the layout.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{MODULE_TARGET, ModuleError, SharedModule, Slot, SnapshotError};

/// Serialised state of one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSnapshot {
    module: String,
    state: serde_json::Value,
}

impl ModuleSnapshot {
    /// Name of the module the snapshot was taken from.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Encodes the snapshot as bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Encoding`] if serialisation fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes a snapshot produced by [`ModuleSnapshot::to_bytes`].
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Encoding`] if the bytes are not a snapshot.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl<S> SharedModule<S>
where
    S: Serialize + DeserializeOwned,
{
    /// Captures the current state.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] when the module is not active or the state
    /// cannot be encoded.
    pub fn capture(&self) -> Result<ModuleSnapshot, SnapshotError> {
        let state = self.with_state(|state| serde_json::to_value(&*state))??;
        debug!(target: MODULE_TARGET, module = %self.name(), "module state captured");
        Ok(ModuleSnapshot {
            module: self.name().to_owned(),
            state,
        })
    }

    /// Replaces the state with the one held in `snapshot`.
    ///
    /// Restoring an uninitialised module activates it. A torn-down module
    /// stays torn down.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] when the snapshot belongs to another module,
    /// cannot be decoded, or the module is torn down.
    pub fn restore(&self, snapshot: &ModuleSnapshot) -> Result<(), SnapshotError> {
        if snapshot.module != self.name() {
            return Err(SnapshotError::ModuleMismatch {
                expected: self.name().to_owned(),
                found: snapshot.module.clone(),
            });
        }
        let state: S = serde_json::from_value(snapshot.state.clone())?;
        let mut slot = self.lock()?;
        if matches!(*slot, Slot::TornDown) {
            return Err(ModuleError::torn_down(self.name()).into());
        }
        *slot = Slot::Active(state);
        self.inner.changed.notify_all();
        debug!(target: MODULE_TARGET, module = %self.name(), "module state restored");
        Ok(())
    }
}
