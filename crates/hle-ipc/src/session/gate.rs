//! Concurrent-connection cap for one facade.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use thiserror::Error;
use tracing::debug;

const SESSION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::session");

/// Returned to a connecting party when the facade is saturated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("service '{service}' already has the maximum of {max} sessions open")]
pub struct SessionLimitExceeded {
    /// Facade that refused the connection.
    pub service: String,
    /// Configured maximum.
    pub max: u32,
}

/// Bounded counter of open sessions.
///
/// Acquisition is a compare-and-swap loop, so concurrent connects never push
/// the counter past the maximum and no lock is held.
#[derive(Debug)]
pub struct SessionGate {
    service: String,
    max: u32,
    active: AtomicU32,
}

impl SessionGate {
    /// Creates a gate admitting at most `max` sessions of `service`.
    #[must_use]
    pub fn new(service: impl Into<String>, max: u32) -> Arc<Self> {
        Arc::new(Self {
            service: service.into(),
            max,
            active: AtomicU32::new(0),
        })
    }

    /// Claims a slot.
    ///
    /// # Errors
    ///
    /// Returns [`SessionLimitExceeded`] when every slot is taken. Existing
    /// sessions are unaffected.
    pub fn acquire(self: &Arc<Self>) -> Result<SessionHandle, SessionLimitExceeded> {
        let mut current = self.active.load(Ordering::Acquire);
        loop {
            if current >= self.max {
                debug!(
                    target: SESSION_TARGET,
                    service = %self.service,
                    max = self.max,
                    "session limit reached"
                );
                return Err(SessionLimitExceeded {
                    service: self.service.clone(),
                    max: self.max,
                });
            }
            match self.active.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    return Ok(SessionHandle {
                        gate: Arc::clone(self),
                    });
                }
                Err(observed) => current = observed,
            }
        }
    }

    /// Returns a slot. Equivalent to dropping `handle`.
    pub fn release(&self, handle: SessionHandle) {
        debug_assert!(std::ptr::eq(self, Arc::as_ptr(&handle.gate)));
        drop(handle);
    }

    /// Facade name.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Configured maximum.
    #[must_use]
    pub const fn max(&self) -> u32 {
        self.max
    }

    /// Slots currently claimed.
    #[must_use]
    pub fn active(&self) -> u32 {
        self.active.load(Ordering::Acquire)
    }
}

/// A claimed slot; released on drop.
#[derive(Debug)]
#[must_use = "dropping the handle releases the session slot"]
pub struct SessionHandle {
    gate: Arc<SessionGate>,
}

impl SessionHandle {
    /// Gate the slot belongs to.
    #[must_use]
    pub fn gate(&self) -> &Arc<SessionGate> {
        &self.gate
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.gate.active.fetch_sub(1, Ordering::AcqRel);
    }
}
