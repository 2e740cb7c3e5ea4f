//! Request routing from a command table to its handlers.
//!
//! The [`Dispatcher`] decodes the header of an inbound request, resolves the
//! command against a facade's [`CommandTable`] and either runs the bound
//! handler or answers through its [`DispatchPolicy`]. Unknown, stubbed and
//! malformed requests always produce a response so the guest never blocks
//! waiting on a reply that will not come.

mod failure;


use std::sync::Arc;

use crate::command::{CommandHandler, CommandTable};
use crate::diagnostics::{DispatchDiagnostics, StructuredDiagnostics};
use crate::ipc::{IpcRequest, IpcResponse, ResultCode};
use crate::module::SharedModule;

pub use self::failure::HandlerFailure;

/// Result codes used when no handler produces the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchPolicy {
    /// Answer to a command the facade does not declare.
    pub unknown_result: ResultCode,
    /// Answer to a declared command that has no implementation.
    pub stub_result: ResultCode,
    /// Answer to a request whose buffer cannot be decoded.
    pub malformed_result: ResultCode,
}

impl DispatchPolicy {
    /// Policy with explicit codes.
    #[must_use]
    pub const fn new(
        unknown_result: ResultCode,
        stub_result: ResultCode,
        malformed_result: ResultCode,
    ) -> Self {
        Self {
            unknown_result,
            stub_result,
            malformed_result,
        }
    }
}

impl Default for DispatchPolicy {
    /// Stubs report success so guests keep running; unknown and malformed
    /// requests report a generic failure.
    fn default() -> Self {
        Self::new(
            ResultCode::from_raw(0xFFFF_FFFF),
            ResultCode::SUCCESS,
            ResultCode::from_raw(0xFFFF_FFFF),
        )
    }
}

/// How a request was answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// An implemented handler ran; its response or failure is carried as-is.
    Handled(IpcResponse),
    /// The command is declared but stubbed.
    Stubbed(IpcResponse),
    /// The command is not declared by the facade.
    Unknown(IpcResponse),
    /// The request buffer could not be decoded.
    Malformed(IpcResponse),
}

impl DispatchOutcome {
    /// Response to send back.
    #[must_use]
    pub const fn response(&self) -> &IpcResponse {
        match self {
            Self::Handled(response)
            | Self::Stubbed(response)
            | Self::Unknown(response)
            | Self::Malformed(response) => response,
        }
    }

    /// Consumes the outcome and returns the response.
    #[must_use]
    pub fn into_response(self) -> IpcResponse {
        match self {
            Self::Handled(response)
            | Self::Stubbed(response)
            | Self::Unknown(response)
            | Self::Malformed(response) => response,
        }
    }

    /// Short label for logs and replay output.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Handled(_) => "handled",
            Self::Stubbed(_) => "stubbed",
            Self::Unknown(_) => "unknown",
            Self::Malformed(_) => "malformed",
        }
    }
}

/// Stateless router shared by every session of a facade.
#[derive(Clone)]
pub struct Dispatcher {
    policy: DispatchPolicy,
    diagnostics: Arc<dyn DispatchDiagnostics>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Creates a dispatcher reporting through `diagnostics`.
    #[must_use]
    pub fn new(policy: DispatchPolicy, diagnostics: Arc<dyn DispatchDiagnostics>) -> Self {
        Self {
            policy,
            diagnostics,
        }
    }

    /// Creates a dispatcher reporting through [`StructuredDiagnostics`].
    #[must_use]
    pub fn with_policy(policy: DispatchPolicy) -> Self {
        Self::new(policy, Arc::new(StructuredDiagnostics::new()))
    }

    /// Policy in effect.
    #[must_use]
    pub const fn policy(&self) -> DispatchPolicy {
        self.policy
    }

    /// Diagnostics sink.
    #[must_use]
    pub fn diagnostics(&self) -> &Arc<dyn DispatchDiagnostics> {
        &self.diagnostics
    }

    /// Answers `request` for the facade named `facade`.
    pub fn dispatch<S>(
        &self,
        facade: &str,
        table: &CommandTable<S>,
        module: &SharedModule<S>,
        request: &IpcRequest,
    ) -> DispatchOutcome {
        let mut parser = match request.parser() {
            Ok(parser) => parser,
            Err(error) => {
                self.diagnostics.malformed_request(facade, &error);
                let command = error.header().map_or(0, |header| header.command());
                return DispatchOutcome::Malformed(IpcResponse::error(
                    command,
                    self.policy.malformed_result,
                ));
            }
        };
        let header = parser.header();
        let command = header.command();

        let Some(descriptor) = table.resolve(command) else {
            self.diagnostics.unknown_command(facade, header);
            return DispatchOutcome::Unknown(IpcResponse::error(
                command,
                self.policy.unknown_result,
            ));
        };

        if !descriptor.header().signature_matches(header) {
            self.diagnostics
                .signature_mismatch(facade, descriptor.name(), descriptor.header(), header);
        }

        match descriptor.handler() {
            CommandHandler::Stubbed => {
                self.diagnostics
                    .unimplemented_command(facade, descriptor.name(), header);
                DispatchOutcome::Stubbed(IpcResponse::error(command, self.policy.stub_result))
            }
            CommandHandler::Implemented(handler) => match handler(module, &mut parser) {
                Ok(response) => DispatchOutcome::Handled(response),
                Err(failure) => {
                    self.diagnostics
                        .handler_failed(facade, descriptor.name(), header, &failure);
                    DispatchOutcome::Handled(IpcResponse::error(command, failure.result()))
                }
            },
        }
    }
}
