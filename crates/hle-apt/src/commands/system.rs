//! Capture buffers, CPU time limits and console model queries.

use hle_ipc::{
    HandlerFailure, IpcResponse, MAX_STATIC_BUFFER_SIZE, RequestParser, ResponseBuilder, ResultCode,
};
use tracing::{debug, warn};

use super::{COMMANDS_TARGET, Module, usize_from};

/// `0x0040`: stores the capture buffer descriptor.
pub(super) fn send_capture_buffer_info(
    module: &Module,
    parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    let size = usize_from(parser.pop_u32()?);
    let input = parser.pop_static_buffer()?;
    let data = input.data.get(..size).unwrap_or(input.data);
    module.with_state(|state| state.send_capture_buffer_info(data))??;
    Ok(ResponseBuilder::with_result(0x0040, ResultCode::SUCCESS).build())
}

/// `0x0041`: takes the capture buffer descriptor.
pub(super) fn receive_capture_buffer_info(
    module: &Module,
    parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    let size = usize_from(parser.pop_u32()?);
    let info = module.with_state(|state| state.receive_capture_buffer_info(size))?;
    Ok(capture_response(0x0041, info))
}

/// `0x004A`: reads the capture buffer descriptor, leaving it in place.
pub(super) fn get_capture_info(
    module: &Module,
    parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    let size = usize_from(parser.pop_u32()?);
    let info = module.with_state(|state| state.capture_info(size))?;
    Ok(capture_response(0x004A, info))
}

fn capture_response(command: u16, info: Vec<u8>) -> IpcResponse {
    let mut rb = ResponseBuilder::with_result(command, ResultCode::SUCCESS);
    rb.push_u32(u32::try_from(info.len()).unwrap_or(u32::MAX));
    rb.push_static_buffer(0, info);
    rb.build()
}

/// `0x0045`: wireless reboot descriptor.
pub(super) fn get_wireless_reboot_info(
    module: &Module,
    parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    let size = usize_from(parser.pop_u32()?);
    let info = module.with_state(|state| state.wireless_reboot_info(size))?;
    let mut rb = ResponseBuilder::with_result(0x0045, ResultCode::SUCCESS);
    rb.push_static_buffer(0, info);
    Ok(rb.build())
}

/// `0x004B`: miscellaneous utility calls. Every utility succeeds with a
/// zeroed output buffer no longer than one static buffer can carry.
pub(super) fn applet_utility(
    _module: &Module,
    parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    let utility = parser.pop_u32()?;
    let input_size = parser.pop_u32()?;
    let requested = parser.pop_u32()?;
    let output_size = usize_from(requested).min(MAX_STATIC_BUFFER_SIZE);
    let input = parser.pop_static_buffer()?;
    warn!(
        target: COMMANDS_TARGET,
        utility,
        input_size,
        requested,
        received = input.data.len(),
        "applet utility is not emulated"
    );
    let mut rb = ResponseBuilder::with_result(0x004B, ResultCode::SUCCESS);
    rb.push_u32(0);
    rb.push_static_buffer(0, vec![0; output_size]);
    Ok(rb.build())
}

/// `0x004F`: reserves CPU time for the application.
pub(super) fn set_app_cpu_time_limit(
    module: &Module,
    parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    let value = parser.pop_u32()?;
    let percent = parser.pop_u32()?;
    module.with_state(|state| state.set_cpu_time_limit(value, percent))??;
    debug!(target: COMMANDS_TARGET, percent, "application cpu time limit set");
    Ok(ResponseBuilder::with_result(0x004F, ResultCode::SUCCESS).build())
}

/// `0x0050`: reserved CPU time.
pub(super) fn get_app_cpu_time_limit(
    module: &Module,
    parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    let value = parser.pop_u32()?;
    let percent = module.with_state(|state| state.cpu_time_limit(value))??;
    let mut rb = ResponseBuilder::with_result(0x0050, ResultCode::SUCCESS);
    rb.push_u32(percent);
    Ok(rb.build())
}

/// `0x0055`
pub(super) fn set_screen_cap_post_permission(
    module: &Module,
    parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    let permission = parser.pop_u32()?;
    module.with_state(|state| state.set_screen_cap_post_permission(permission))?;
    Ok(ResponseBuilder::with_result(0x0055, ResultCode::SUCCESS).build())
}

/// `0x0056`
pub(super) fn get_screen_cap_post_permission(
    module: &Module,
    _parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    let permission = module.with_state(|state| state.screen_cap_post_permission())?;
    let mut rb = ResponseBuilder::with_result(0x0056, ResultCode::SUCCESS);
    rb.push_u32(permission);
    Ok(rb.build())
}

/// `0x0101`: whether the running title is a New 3DS title.
pub(super) fn check_new_3ds_app(
    module: &Module,
    _parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    new_3ds_response(module, 0x0101)
}

/// `0x0102`: whether the console is a New 3DS.
pub(super) fn check_new_3ds(
    module: &Module,
    _parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    new_3ds_response(module, 0x0102)
}

fn new_3ds_response(module: &Module, command: u16) -> Result<IpcResponse, HandlerFailure> {
    let new_3ds = module.with_state(|state| state.is_new_3ds())?;
    let mut rb = ResponseBuilder::with_result(command, ResultCode::SUCCESS);
    rb.push_bool(new_3ds);
    Ok(rb.build())
}
