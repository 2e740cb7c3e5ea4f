//! Shared backing state for the facades of one logical service.
//!
//! Several facades (a user-facing and a system-facing command set, for
//! example) bind to the same [`SharedModule`], so every facade observes one
//! consistent state. The module moves through
//! `Uninitialized → Active → TornDown`; facades attach only while it is
//! active.
//!
//! Handlers are the only code that mutates module state, and they do so
//! through [`SharedModule::with_state`], which grants exclusive access for the
//! duration of one closure. Handlers that must wait for another session to
//! change the state use [`SharedModule::wait_until`], which releases the lock
//! while suspended and re-acquires it before resuming.

mod errors;
mod snapshot;

#[cfg(test)]
mod tests;

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::debug;

pub use self::errors::{ModuleError, SnapshotError};
pub use self::snapshot::ModuleSnapshot;

const MODULE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::module");

/// Observable lifecycle phase of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleLifecycle {
    /// Created but not yet holding state.
    Uninitialized,
    /// Holding state and accepting handler calls.
    Active,
    /// Released by its owner; every further access fails.
    TornDown,
}

enum Slot<S> {
    Uninitialized,
    Active(S),
    TornDown,
}

impl<S> Slot<S> {
    const fn lifecycle(&self) -> ModuleLifecycle {
        match self {
            Self::Uninitialized => ModuleLifecycle::Uninitialized,
            Self::Active(_) => ModuleLifecycle::Active,
            Self::TornDown => ModuleLifecycle::TornDown,
        }
    }
}

struct ModuleInner<S> {
    name: String,
    slot: Mutex<Slot<S>>,
    changed: Condvar,
}

/// Shared handle to a service's mutable state.
///
/// Cloning the handle is cheap and every clone refers to the same state.
pub struct SharedModule<S> {
    inner: Arc<ModuleInner<S>>,
}

impl<S> Clone for SharedModule<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> fmt::Debug for SharedModule<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedModule")
            .field("name", &self.inner.name)
            .field("handles", &Arc::strong_count(&self.inner))
            .finish_non_exhaustive()
    }
}

impl<S> SharedModule<S> {
    /// Creates a module that holds no state yet.
    #[must_use]
    pub fn uninitialized(name: impl Into<String>) -> Self {
        Self::with_slot(name.into(), Slot::Uninitialized)
    }

    /// Creates a module that is already active.
    #[must_use]
    pub fn active(name: impl Into<String>, state: S) -> Self {
        Self::with_slot(name.into(), Slot::Active(state))
    }

    fn with_slot(name: String, slot: Slot<S>) -> Self {
        Self {
            inner: Arc::new(ModuleInner {
                name,
                slot: Mutex::new(slot),
                changed: Condvar::new(),
            }),
        }
    }

    /// Module name used in diagnostics and snapshots.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Number of live handles, the owner's included.
    #[must_use]
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Current lifecycle phase.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::Poisoned`] if a handler panicked while holding
    /// the state.
    pub fn lifecycle(&self) -> Result<ModuleLifecycle, ModuleError> {
        Ok(self.lock()?.lifecycle())
    }

    /// Installs the initial state.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::AlreadyActive`] or [`ModuleError::TornDown`]
    /// when the module is past its uninitialised phase.
    pub fn activate(&self, state: S) -> Result<(), ModuleError> {
        let mut slot = self.lock()?;
        match *slot {
            Slot::Uninitialized => {
                *slot = Slot::Active(state);
                self.inner.changed.notify_all();
                debug!(target: MODULE_TARGET, module = %self.inner.name, "module activated");
                Ok(())
            }
            Slot::Active(_) => Err(ModuleError::already_active(&self.inner.name)),
            Slot::TornDown => Err(ModuleError::torn_down(&self.inner.name)),
        }
    }

    /// Releases the state and returns it.
    ///
    /// Waiters blocked in [`SharedModule::wait_until`] wake up and fail with
    /// [`ModuleError::TornDown`]. Tearing down twice returns `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::Poisoned`] if the state lock is poisoned.
    pub fn tear_down(&self) -> Result<Option<S>, ModuleError> {
        let mut slot = self.lock()?;
        let previous = std::mem::replace(&mut *slot, Slot::TornDown);
        self.inner.changed.notify_all();
        debug!(target: MODULE_TARGET, module = %self.inner.name, "module torn down");
        Ok(match previous {
            Slot::Active(state) => Some(state),
            Slot::Uninitialized | Slot::TornDown => None,
        })
    }

    /// Runs `f` with exclusive access to the state.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError`] when the module is not active or its lock is
    /// poisoned.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut S) -> R) -> Result<R, ModuleError> {
        let mut slot = self.lock()?;
        let result = match &mut *slot {
            Slot::Active(state) => f(state),
            other => return Err(self.inactive_error(other)),
        };
        self.inner.changed.notify_all();
        Ok(result)
    }

    /// Blocks until `ready` holds, then runs `f` with exclusive access.
    ///
    /// The lock is released while waiting, so other sessions keep making
    /// progress and can make `ready` true.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError`] when the module is not active, is torn down
    /// while waiting, or its lock is poisoned.
    pub fn wait_until<R>(
        &self,
        mut ready: impl FnMut(&S) -> bool,
        f: impl FnOnce(&mut S) -> R,
    ) -> Result<R, ModuleError> {
        let mut slot = self.lock()?;
        loop {
            match &mut *slot {
                Slot::Active(state) if ready(state) => {
                    let result = f(state);
                    self.inner.changed.notify_all();
                    return Ok(result);
                }
                Slot::Active(_) => {}
                other => return Err(self.inactive_error(other)),
            }
            slot = self
                .inner
                .changed
                .wait(slot)
                .map_err(|_| ModuleError::poisoned(&self.inner.name))?;
        }
    }

    /// Like [`SharedModule::wait_until`] but gives up after `timeout`.
    ///
    /// Returns `Ok(None)` when the deadline passes before `ready` holds. A
    /// timeout too large to express as a deadline waits without one.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError`] under the same conditions as
    /// [`SharedModule::wait_until`].
    pub fn wait_until_timeout<R>(
        &self,
        timeout: Duration,
        mut ready: impl FnMut(&S) -> bool,
        f: impl FnOnce(&mut S) -> R,
    ) -> Result<Option<R>, ModuleError> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.wait_until(ready, f).map(Some);
        };
        let mut slot = self.lock()?;
        loop {
            match &mut *slot {
                Slot::Active(state) if ready(state) => {
                    let result = f(state);
                    self.inner.changed.notify_all();
                    return Ok(Some(result));
                }
                Slot::Active(_) => {}
                other => return Err(self.inactive_error(other)),
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            let (guard, _) = self
                .inner
                .changed
                .wait_timeout(slot, remaining)
                .map_err(|_| ModuleError::poisoned(&self.inner.name))?;
            slot = guard;
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Slot<S>>, ModuleError> {
        self.inner
            .slot
            .lock()
            .map_err(|_| ModuleError::poisoned(&self.inner.name))
    }

    fn inactive_error(&self, slot: &Slot<S>) -> ModuleError {
        match slot {
            Slot::TornDown => ModuleError::torn_down(&self.inner.name),
            Slot::Uninitialized | Slot::Active(_) => ModuleError::not_active(&self.inner.name),
        }
    }
}
