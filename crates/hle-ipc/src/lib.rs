//! Command dispatch core for high-level emulated OS services.
//!
//! A service exposes one or more named facades, each a static table mapping
//! command numbers to native handlers. Guest requests arrive as raw command
//! buffers; the [`Dispatcher`] decodes the header, resolves the command in the
//! facade's [`CommandTable`] and runs the bound handler against the service's
//! [`SharedModule`]. Commands a facade declares without implementing are
//! answered through the [`DispatchPolicy`] so guests keep running, and every
//! such answer is reported through [`DispatchDiagnostics`].
//!
//! ## Sharing and sessions
//!
//! Facades that differ only in their command tables or session caps bind to
//! the same module, so every variant of a service observes one state. Each
//! facade admits a bounded number of concurrent [`Session`]s through its
//! [`SessionGate`]; requests within one session are handled in arrival order.
//!
//! The [`ServiceManager`] is the explicit composition root: it owns the
//! registered facades, hands out sessions and releases the facades in reverse
//! registration order on shutdown.

mod command;
mod diagnostics;
mod dispatch;
mod facade;
mod ipc;
mod manager;
mod module;
mod session;

pub use command::{CommandDescriptor, CommandHandler, CommandTable, HandlerFn, TableError};
pub use diagnostics::{DispatchDiagnostics, StructuredDiagnostics};
pub use dispatch::{DispatchOutcome, DispatchPolicy, Dispatcher, HandlerFailure};
pub use facade::{FacadeError, ServiceFacade, ServicePort};
pub use ipc::{
    CommandHeader, ErrorDescription, ErrorLevel, ErrorModule, ErrorSummary, HandleSet,
    HandleTransfer, IpcRequest, IpcResponse, MAX_STATIC_BUFFER_SIZE, MalformedRequest,
    MappedBuffer, MappedPermissions, OutputBuffer, ParameterError, RequestParser,
    ResponseBuilder, ResultCode, StaticBuffer,
};
pub use manager::{ConnectError, RegistryError, ServiceManager};
pub use module::{ModuleError, ModuleLifecycle, ModuleSnapshot, SharedModule, SnapshotError};
pub use session::{Session, SessionGate, SessionHandle, SessionLimitExceeded};

#[cfg(test)]
mod tests;
