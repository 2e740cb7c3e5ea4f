//! Structured reporting for dispatch events that deserve operator attention.

use std::sync::Arc;

use crate::dispatch::HandlerFailure;
use crate::ipc::{CommandHeader, MalformedRequest};

/// Tracing target for dispatch diagnostics.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Observer trait used to surface dispatch anomalies to telemetry sinks.
pub trait DispatchDiagnostics: Send + Sync {
    /// A command the facade does not declare was requested.
    fn unknown_command(&self, facade: &str, header: CommandHeader);

    /// A declared but stubbed command was requested.
    fn unimplemented_command(&self, facade: &str, name: &str, header: CommandHeader);

    /// A request buffer could not be decoded.
    fn malformed_request(&self, facade: &str, error: &MalformedRequest);

    /// A request's word counts differ from the declared signature.
    fn signature_mismatch(
        &self,
        facade: &str,
        name: &str,
        expected: CommandHeader,
        actual: CommandHeader,
    );

    /// An implemented handler refused the request.
    fn handler_failed(
        &self,
        facade: &str,
        name: &str,
        header: CommandHeader,
        failure: &HandlerFailure,
    );

    /// A response was discarded because its session closed mid-request.
    fn response_dropped(&self, facade: &str, session: u64, header: Option<CommandHeader>);
}

impl<T> DispatchDiagnostics for Arc<T>
where
    T: DispatchDiagnostics + ?Sized,
{
    fn unknown_command(&self, facade: &str, header: CommandHeader) {
        (**self).unknown_command(facade, header);
    }

    fn unimplemented_command(&self, facade: &str, name: &str, header: CommandHeader) {
        (**self).unimplemented_command(facade, name, header);
    }

    fn malformed_request(&self, facade: &str, error: &MalformedRequest) {
        (**self).malformed_request(facade, error);
    }

    fn signature_mismatch(
        &self,
        facade: &str,
        name: &str,
        expected: CommandHeader,
        actual: CommandHeader,
    ) {
        (**self).signature_mismatch(facade, name, expected, actual);
    }

    fn handler_failed(
        &self,
        facade: &str,
        name: &str,
        header: CommandHeader,
        failure: &HandlerFailure,
    ) {
        (**self).handler_failed(facade, name, header, failure);
    }

    fn response_dropped(&self, facade: &str, session: u64, header: Option<CommandHeader>) {
        (**self).response_dropped(facade, session, header);
    }
}

/// Default diagnostics sink that records events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredDiagnostics;

impl StructuredDiagnostics {
    /// Builds a new sink.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DispatchDiagnostics for StructuredDiagnostics {
    fn unknown_command(&self, facade: &str, header: CommandHeader) {
        tracing::warn!(
            target: DISPATCH_TARGET,
            event = "unknown_command",
            facade,
            command = %format_args!("{:#06X}", header.command()),
            header = %header,
            "unknown service command"
        );
    }

    fn unimplemented_command(&self, facade: &str, name: &str, header: CommandHeader) {
        tracing::warn!(
            target: DISPATCH_TARGET,
            event = "unimplemented_command",
            facade,
            command = %format_args!("{:#06X}", header.command()),
            name,
            "unimplemented service command"
        );
    }

    fn malformed_request(&self, facade: &str, error: &MalformedRequest) {
        tracing::warn!(
            target: DISPATCH_TARGET,
            event = "malformed_request",
            facade,
            error = %error,
            "malformed command buffer"
        );
    }

    fn signature_mismatch(
        &self,
        facade: &str,
        name: &str,
        expected: CommandHeader,
        actual: CommandHeader,
    ) {
        tracing::debug!(
            target: DISPATCH_TARGET,
            event = "signature_mismatch",
            facade,
            command = %format_args!("{:#06X}", actual.command()),
            name,
            expected = %expected,
            actual = %actual,
            "command header does not match the declared signature"
        );
    }

    fn handler_failed(
        &self,
        facade: &str,
        name: &str,
        header: CommandHeader,
        failure: &HandlerFailure,
    ) {
        tracing::debug!(
            target: DISPATCH_TARGET,
            event = "handler_failed",
            facade,
            command = %format_args!("{:#06X}", header.command()),
            name,
            result = %failure.result(),
            reason = failure.reason(),
            "command handler returned an error result"
        );
    }

    fn response_dropped(&self, facade: &str, session: u64, header: Option<CommandHeader>) {
        tracing::debug!(
            target: DISPATCH_TARGET,
            event = "response_dropped",
            facade,
            session,
            header = ?header.map(CommandHeader::raw),
            "session closed before the response was delivered"
        );
    }
}
