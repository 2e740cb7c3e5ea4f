//! Library applet launch and teardown.

use hle_ipc::{HandlerFailure, IpcResponse, RequestParser, ResponseBuilder, ResultCode};
use tracing::debug;

use super::{COMMANDS_TARGET, Module, usize_from};
use crate::applet::AppletId;
use crate::state::AptState;

/// `0x0016`: starts preloading a library applet.
pub(super) fn preload_library_applet(
    module: &Module,
    parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    let applet = AppletId(parser.pop_u32()?);
    module.with_state(|state| state.preload_library_applet(applet))??;
    debug!(target: COMMANDS_TARGET, %applet, "library applet preloading");
    Ok(ResponseBuilder::with_result(0x0016, ResultCode::SUCCESS).build())
}

/// `0x0017`: marks preloading as finished.
pub(super) fn finish_preloading_library_applet(
    module: &Module,
    parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    let applet = AppletId(parser.pop_u32()?);
    module.with_state(|state| state.finish_preloading_library_applet(applet))??;
    Ok(ResponseBuilder::with_result(0x0017, ResultCode::SUCCESS).build())
}

/// `0x0018`: claims the library slot.
pub(super) fn prepare_to_start_library_applet(
    module: &Module,
    parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    let applet = AppletId(parser.pop_u32()?);
    module.with_state(|state| state.prepare_library_applet(applet))??;
    debug!(target: COMMANDS_TARGET, %applet, "library applet prepared");
    Ok(ResponseBuilder::with_result(0x0018, ResultCode::SUCCESS).build())
}

/// `0x001E`: starts the prepared library applet with its input buffer.
pub(super) fn start_library_applet(
    module: &Module,
    parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    let applet = AppletId(parser.pop_u32()?);
    let size = usize_from(parser.pop_u32()?);
    let object = parser.pop_handle()?;
    let input = parser.pop_static_buffer()?;
    let buffer = input.data.get(..size).unwrap_or(input.data).to_vec();
    module.with_state(|state| state.start_library_applet(applet, object, buffer))??;
    debug!(target: COMMANDS_TARGET, %applet, "library applet started");
    Ok(ResponseBuilder::with_result(0x001E, ResultCode::SUCCESS).build())
}

/// `0x0025`: moves the running library applet to its closing stage.
pub(super) fn prepare_to_close_library_applet(
    module: &Module,
    parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    // not_pause, exiting and jump_to_home only matter to the home menu.
    parser.skip(3)?;
    module.with_state(AptState::prepare_to_close_library_applet)??;
    Ok(ResponseBuilder::with_result(0x0025, ResultCode::SUCCESS).build())
}

/// `0x0028`: closes the library applet and returns its output.
pub(super) fn close_library_applet(
    module: &Module,
    parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    let size = usize_from(parser.pop_u32()?);
    let object = parser.pop_handle()?;
    let output = parser.pop_static_buffer()?;
    let buffer = output.data.get(..size).unwrap_or(output.data).to_vec();
    module.with_state(|state| state.close_library_applet(object, buffer))??;
    debug!(target: COMMANDS_TARGET, "library applet closed");
    Ok(ResponseBuilder::with_result(0x0028, ResultCode::SUCCESS).build())
}

/// `0x003B`: cancels the library applet.
pub(super) fn cancel_library_applet(
    module: &Module,
    parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    let exiting = parser.pop_bool()?;
    module.with_state(AptState::cancel_library_applet)??;
    debug!(target: COMMANDS_TARGET, exiting, "library applet cancelled");
    Ok(ResponseBuilder::with_result(0x003B, ResultCode::SUCCESS).build())
}
