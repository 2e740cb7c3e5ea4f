//! Parameter exchange between applets.

use hle_ipc::{HandlerFailure, IpcResponse, RequestParser, ResponseBuilder, ResultCode};
use tracing::debug;

use super::{COMMANDS_TARGET, Module, usize_from};
use crate::applet::AppletId;
use crate::state::MessageParameter;

/// `0x000C`: queues a parameter for another applet.
pub(super) fn send_parameter(
    module: &Module,
    parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    let sender = AppletId(parser.pop_u32()?);
    let destination = AppletId(parser.pop_u32()?);
    let signal = parser.pop_u32()?;
    let size = usize_from(parser.pop_u32()?);
    let object = parser.pop_handle()?;
    let buffer = parser.pop_static_buffer()?;
    let parameter = MessageParameter {
        sender,
        destination,
        signal,
        object,
        buffer: buffer.data.get(..size).unwrap_or(buffer.data).to_vec(),
    };
    module.with_state(|state| state.send_parameter(parameter))??;
    debug!(target: COMMANDS_TARGET, %sender, %destination, signal, "parameter sent");
    Ok(ResponseBuilder::with_result(0x000C, ResultCode::SUCCESS).build())
}

/// `0x000D`: consumes the parameter pending for the caller.
pub(super) fn receive_parameter(
    module: &Module,
    parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    let applet = AppletId(parser.pop_u32()?);
    let size = usize_from(parser.pop_u32()?);
    let parameter = module.with_state(|state| state.receive_parameter(applet))??;
    Ok(parameter_response(0x000D, parameter, size))
}

/// `0x000E`: reads the parameter pending for the caller without consuming it.
pub(super) fn glance_parameter(
    module: &Module,
    parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    let applet = AppletId(parser.pop_u32()?);
    let size = usize_from(parser.pop_u32()?);
    let parameter = module.with_state(|state| state.glance_parameter(applet))??;
    Ok(parameter_response(0x000E, parameter, size))
}

/// `0x000F`: drops the pending parameter if it matches the filters.
pub(super) fn cancel_parameter(
    module: &Module,
    parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    let check_sender = parser.pop_bool()?;
    let sender = AppletId(parser.pop_u32()?);
    let check_receiver = parser.pop_bool()?;
    let receiver = AppletId(parser.pop_u32()?);
    let cancelled = module.with_state(|state| {
        state.cancel_parameter(
            check_sender.then_some(sender),
            check_receiver.then_some(receiver),
        )
    })?;
    let mut rb = ResponseBuilder::with_result(0x000F, ResultCode::SUCCESS);
    rb.push_bool(cancelled);
    Ok(rb.build())
}

fn parameter_response(command: u16, parameter: MessageParameter, size: usize) -> IpcResponse {
    let MessageParameter {
        sender,
        signal,
        object,
        mut buffer,
        ..
    } = parameter;
    buffer.truncate(size);
    let mut rb = ResponseBuilder::with_result(command, ResultCode::SUCCESS);
    rb.push_u32(sender.0)
        .push_u32(signal)
        .push_u32(u32::try_from(buffer.len()).unwrap_or(u32::MAX));
    rb.push_move_handles(&[object]);
    rb.push_static_buffer(0, buffer);
    rb.build()
}
