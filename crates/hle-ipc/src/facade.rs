//! Named command sets bound to a shared module.
//!
//! A facade is the per-variant configuration of a service: its display name,
//! its session cap and its command table. Several facades may bind to one
//! [`SharedModule`] so that, for example, the user and system variants of a
//! service observe the same state.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::command::{CommandDescriptor, CommandTable, TableError};
use crate::diagnostics::DispatchDiagnostics;
use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::ipc::IpcRequest;
use crate::module::{ModuleError, ModuleLifecycle, SharedModule};
use crate::session::SessionGate;

/// Errors raised while building a facade.
#[derive(Debug, Error)]
pub enum FacadeError {
    /// The command table is invalid.
    #[error("facade '{facade}' has an invalid command table: {source}")]
    Table {
        facade: String,
        #[source]
        source: TableError,
    },

    /// The module cannot accept facades.
    #[error("facade '{facade}' cannot attach: {source}")]
    Module {
        facade: String,
        #[source]
        source: ModuleError,
    },
}

/// Object-safe view of a facade, independent of its module type.
///
/// The service manager stores facades over different module types side by
/// side through this trait.
pub trait ServicePort: Send + Sync {
    /// Registered name, such as `APT:U`.
    fn name(&self) -> &str;

    /// Session cap.
    fn max_sessions(&self) -> u32;

    /// Gate enforcing the session cap.
    fn gate(&self) -> &Arc<SessionGate>;

    /// Answers one request.
    fn dispatch(&self, request: &IpcRequest) -> DispatchOutcome;

    /// Sink for dispatch diagnostics.
    fn diagnostics(&self) -> &Arc<dyn DispatchDiagnostics>;
}

/// A facade over a module holding state `S`.
pub struct ServiceFacade<S> {
    name: String,
    module: SharedModule<S>,
    table: CommandTable<S>,
    gate: Arc<SessionGate>,
    dispatcher: Dispatcher,
}

impl<S> ServiceFacade<S> {
    /// Builds a facade named `name` over `module`.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::Table`] for a table with duplicate commands and
    /// [`FacadeError::Module`] when `module` is not active.
    pub fn new(
        module: SharedModule<S>,
        name: impl Into<String>,
        max_sessions: u32,
        descriptors: impl IntoIterator<Item = CommandDescriptor<S>>,
        dispatcher: Dispatcher,
    ) -> Result<Self, FacadeError> {
        let facade = name.into();
        match module.lifecycle() {
            Ok(ModuleLifecycle::Active) => {}
            Ok(ModuleLifecycle::Uninitialized) => {
                return Err(FacadeError::Module {
                    source: ModuleError::not_active(module.name()),
                    facade,
                });
            }
            Ok(ModuleLifecycle::TornDown) => {
                return Err(FacadeError::Module {
                    source: ModuleError::torn_down(module.name()),
                    facade,
                });
            }
            Err(source) => return Err(FacadeError::Module { facade, source }),
        }
        let table = match CommandTable::new(descriptors) {
            Ok(table) => table,
            Err(source) => return Err(FacadeError::Table { facade, source }),
        };
        let gate = SessionGate::new(facade.clone(), max_sessions);
        Ok(Self {
            name: facade,
            module,
            table,
            gate,
            dispatcher,
        })
    }

    /// Shared module the facade is bound to.
    #[must_use]
    pub const fn module(&self) -> &SharedModule<S> {
        &self.module
    }

    /// Command table.
    #[must_use]
    pub const fn table(&self) -> &CommandTable<S> {
        &self.table
    }
}

impl<S> fmt::Debug for ServiceFacade<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceFacade")
            .field("name", &self.name)
            .field("module", &self.module)
            .field("table", &self.table)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

impl<S> ServicePort for ServiceFacade<S>
where
    S: Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn max_sessions(&self) -> u32 {
        self.gate.max()
    }

    fn gate(&self) -> &Arc<SessionGate> {
        &self.gate
    }

    fn dispatch(&self, request: &IpcRequest) -> DispatchOutcome {
        self.dispatcher
            .dispatch(&self.name, &self.table, &self.module, request)
    }

    fn diagnostics(&self) -> &Arc<dyn DispatchDiagnostics> {
        self.dispatcher.diagnostics()
    }
}
