//! Shared fixtures for the crate-level suites.

use std::sync::{Arc, Mutex, PoisonError};

use crate::{
    CommandDescriptor, CommandHeader, DispatchDiagnostics, DispatchPolicy, Dispatcher,
    HandlerFailure, IpcResponse, MalformedRequest, RequestParser, ResponseBuilder, ResultCode,
    ServiceFacade, SharedModule,
};

/// Diagnostic events captured by [`RecordingDiagnostics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Recorded {
    Unknown { facade: String, command: u16 },
    Unimplemented { facade: String, command: u16, name: String },
    Malformed { facade: String },
    SignatureMismatch { facade: String, name: String },
    HandlerFailed { facade: String, name: String },
    ResponseDropped { facade: String, session: u64 },
}

/// Diagnostics sink that keeps every event for later assertions.
#[derive(Debug, Default)]
pub(crate) struct RecordingDiagnostics {
    events: Mutex<Vec<Recorded>>,
}

impl RecordingDiagnostics {
    pub(crate) fn events(&self) -> Vec<Recorded> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, event: Recorded) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl DispatchDiagnostics for RecordingDiagnostics {
    fn unknown_command(&self, facade: &str, header: CommandHeader) {
        self.push(Recorded::Unknown {
            facade: facade.to_owned(),
            command: header.command(),
        });
    }

    fn unimplemented_command(&self, facade: &str, name: &str, header: CommandHeader) {
        self.push(Recorded::Unimplemented {
            facade: facade.to_owned(),
            command: header.command(),
            name: name.to_owned(),
        });
    }

    fn malformed_request(&self, facade: &str, _error: &MalformedRequest) {
        self.push(Recorded::Malformed {
            facade: facade.to_owned(),
        });
    }

    fn signature_mismatch(
        &self,
        facade: &str,
        name: &str,
        _expected: CommandHeader,
        _actual: CommandHeader,
    ) {
        self.push(Recorded::SignatureMismatch {
            facade: facade.to_owned(),
            name: name.to_owned(),
        });
    }

    fn handler_failed(
        &self,
        facade: &str,
        name: &str,
        _header: CommandHeader,
        _failure: &HandlerFailure,
    ) {
        self.push(Recorded::HandlerFailed {
            facade: facade.to_owned(),
            name: name.to_owned(),
        });
    }

    fn response_dropped(&self, facade: &str, session: u64, _header: Option<CommandHeader>) {
        self.push(Recorded::ResponseDropped {
            facade: facade.to_owned(),
            session,
        });
    }
}

/// State of the counter service used across suites.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub(crate) struct Counter {
    pub(crate) total: u32,
    pub(crate) calls: u32,
}

/// `0x0001`: adds the first parameter and returns the running total.
pub(crate) fn add(
    module: &SharedModule<Counter>,
    parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    let addend = parser.pop_u32()?;
    let total = module.with_state(|state| {
        state.calls += 1;
        state.total += addend;
        state.total
    })?;
    let mut rb = ResponseBuilder::with_result(0x0001, ResultCode::SUCCESS);
    rb.push_u32(total);
    Ok(rb.build())
}

/// Table of the counter service: `0x0001` implemented, `0x0002` stubbed.
pub(crate) fn counter_commands() -> Vec<CommandDescriptor<Counter>> {
    vec![
        CommandDescriptor::implemented(0x0001_0040, "Add", add),
        CommandDescriptor::stubbed(0x0002_0000, "Stub"),
    ]
}

/// Builds a counter facade reporting to `diagnostics`.
pub(crate) fn counter_facade(
    module: &SharedModule<Counter>,
    name: &str,
    max_sessions: u32,
    diagnostics: &Arc<RecordingDiagnostics>,
) -> ServiceFacade<Counter> {
    let dispatcher = Dispatcher::new(DispatchPolicy::default(), diagnostics.clone());
    ServiceFacade::new(
        module.clone(),
        name,
        max_sessions,
        counter_commands(),
        dispatcher,
    )
    .expect("counter facade is valid")
}
