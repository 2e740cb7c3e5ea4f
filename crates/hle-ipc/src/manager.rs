//! Registry of facades and the entry point for new connections.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;
use tracing::info;

use crate::facade::ServicePort;
use crate::session::{Session, SessionLimitExceeded};

const MANAGER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::manager");

/// Errors raised while registering a facade.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A facade with the same name is already registered.
    #[error("service '{name}' is already registered")]
    AlreadyRegistered { name: String },
}

/// Errors returned to a connecting party.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// No facade has the requested name.
    #[error("unknown service '{name}'")]
    UnknownService { name: String },

    /// The facade's session cap is reached.
    #[error(transparent)]
    SessionLimitExceeded(#[from] SessionLimitExceeded),
}

/// Owns the registered facades for the lifetime of the emulated system.
#[derive(Default)]
pub struct ServiceManager {
    ports: RwLock<Vec<Arc<dyn ServicePort>>>,
    next_session: AtomicU64,
}

impl std::fmt::Debug for ServiceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceManager")
            .field("services", &self.names())
            .finish_non_exhaustive()
    }
}

impl ServiceManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `port` under its own name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AlreadyRegistered`] when the name is taken.
    pub fn register(&self, port: Arc<dyn ServicePort>) -> Result<(), RegistryError> {
        let mut ports = self.write();
        if ports.iter().any(|existing| existing.name() == port.name()) {
            return Err(RegistryError::AlreadyRegistered {
                name: port.name().to_owned(),
            });
        }
        info!(
            target: MANAGER_TARGET,
            service = port.name(),
            max_sessions = port.max_sessions(),
            "service registered"
        );
        ports.push(port);
        Ok(())
    }

    /// Opens a session against the facade called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError::UnknownService`] for an unregistered name and
    /// [`ConnectError::SessionLimitExceeded`] when the facade is saturated.
    pub fn connect(&self, name: &str) -> Result<Session, ConnectError> {
        let port = self.get(name).ok_or_else(|| ConnectError::UnknownService {
            name: name.to_owned(),
        })?;
        let id = self.next_session.fetch_add(1, Ordering::Relaxed) + 1;
        Session::open(id, port).map_err(ConnectError::from)
    }

    /// Looks up a facade by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn ServicePort>> {
        self.read().iter().find(|port| port.name() == name).cloned()
    }

    /// Registered names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.read()
            .iter()
            .map(|port| port.name().to_owned())
            .collect()
    }

    /// Number of registered facades.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Unregisters every facade, newest first, and returns them in that order.
    ///
    /// Open sessions keep their facade alive until they close.
    pub fn shutdown(&self) -> Vec<Arc<dyn ServicePort>> {
        let mut ports = self.write();
        let mut released: Vec<_> = ports.drain(..).collect();
        released.reverse();
        for port in &released {
            info!(target: MANAGER_TARGET, service = port.name(), "service unregistered");
        }
        released
    }

    // Registration never leaves the list half-updated, so a poisoned lock is
    // still consistent.
    fn read(&self) -> RwLockReadGuard<'_, Vec<Arc<dyn ServicePort>>> {
        self.ports.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Arc<dyn ServicePort>>> {
        self.ports.write().unwrap_or_else(PoisonError::into_inner)
    }
}
