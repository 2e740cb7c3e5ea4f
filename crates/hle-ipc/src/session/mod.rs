//! Session admission and per-connection request ordering.
//!
//! A [`SessionGate`] caps how many sessions a facade admits. A [`Session`]
//! owns one claimed slot and serialises the requests it carries, so requests
//! within a session are handled in arrival order while separate sessions run
//! concurrently.

mod gate;


use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::dispatch::DispatchOutcome;
use crate::facade::ServicePort;
use crate::ipc::{IpcRequest, IpcResponse};

pub use self::gate::{SessionGate, SessionHandle, SessionLimitExceeded};

/// One open connection to a facade.
///
/// Closing a session while one of its requests is being handled lets the
/// handler finish but discards its response. Dropping a session closes it.
pub struct Session {
    id: u64,
    port: Arc<dyn ServicePort>,
    open: AtomicBool,
    order: Mutex<()>,
    slot: Mutex<Option<SessionHandle>>,
}

impl Session {
    /// Opens a session against `port`, claiming a slot from its gate.
    ///
    /// # Errors
    ///
    /// Returns [`SessionLimitExceeded`] when the facade is saturated.
    pub fn open(id: u64, port: Arc<dyn ServicePort>) -> Result<Self, SessionLimitExceeded> {
        let handle = port.gate().acquire()?;
        Ok(Self {
            id,
            port,
            open: AtomicBool::new(true),
            order: Mutex::new(()),
            slot: Mutex::new(Some(handle)),
        })
    }

    /// Session identifier assigned by the service manager.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Name of the facade this session is connected to.
    #[must_use]
    pub fn service(&self) -> &str {
        self.port.name()
    }

    /// Returns `true` until [`Session::close`] is called.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Dispatches `request` and returns the full outcome.
    ///
    /// Returns `None` when the session is closed before the request starts or
    /// while it is being handled.
    pub fn submit(&self, request: &IpcRequest) -> Option<DispatchOutcome> {
        // The ordering lock guards no data, so a poisoned lock is still usable.
        let _turn = self.order.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.is_open() {
            self.report_dropped(request);
            return None;
        }
        let outcome = self.port.dispatch(request);
        if self.is_open() {
            Some(outcome)
        } else {
            self.report_dropped(request);
            None
        }
    }

    /// Dispatches `request` and returns the response to deliver.
    pub fn request(&self, request: &IpcRequest) -> Option<IpcResponse> {
        self.submit(request).map(DispatchOutcome::into_response)
    }

    /// Closes the session and releases its slot. Closing twice is a no-op.
    pub fn close(&self) {
        if !self.open.swap(false, Ordering::AcqRel) {
            return;
        }
        let handle = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(claimed) = handle {
            self.port.gate().release(claimed);
        }
        tracing::debug!(
            target: concat!(env!("CARGO_PKG_NAME"), "::session"),
            service = self.port.name(),
            session = self.id,
            "session closed"
        );
    }

    fn report_dropped(&self, request: &IpcRequest) {
        self.port
            .diagnostics()
            .response_dropped(self.port.name(), self.id, request.header().ok());
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("service", &self.port.name())
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}
