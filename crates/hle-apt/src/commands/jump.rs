//! Application jumps and the arguments carried across them.

use hle_ipc::{HandlerFailure, IpcResponse, RequestParser, ResponseBuilder, ResultCode};
use tracing::debug;

use super::{COMMANDS_TARGET, Module, usize_from};
use crate::errors::AptError;
use crate::state::MAX_STARTUP_ARGUMENT_SIZE;

/// `0x0031`: records the jump target.
pub(super) fn prepare_to_do_application_jump(
    module: &Module,
    parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    let flags = parser.pop_u32()? & 0xFF;
    let program_id = parser.pop_u64()?;
    let media_type = u8::try_from(parser.pop_u32()? & 0xFF).unwrap_or_default();
    module.with_state(|state| state.prepare_application_jump(flags, program_id, media_type))?;
    debug!(
        target: COMMANDS_TARGET,
        flags,
        program_id = %format_args!("{program_id:#018X}"),
        media_type,
        "application jump prepared"
    );
    Ok(ResponseBuilder::with_result(0x0031, ResultCode::SUCCESS).build())
}

/// `0x0032`: performs the prepared jump.
pub(super) fn do_application_jump(
    module: &Module,
    parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    let param_size = usize_from(parser.pop_u32()?);
    let hmac_size = usize_from(parser.pop_u32()?);
    let param = parser.pop_static_buffer()?;
    let hmac = parser.pop_static_buffer()?;
    let param_bytes = param.data.get(..param_size).unwrap_or(param.data).to_vec();
    let hmac_bytes = hmac.data.get(..hmac_size).unwrap_or(hmac.data).to_vec();
    module.with_state(|state| state.do_application_jump(param_bytes, hmac_bytes))??;
    Ok(ResponseBuilder::with_result(0x0032, ResultCode::SUCCESS).build())
}

/// `0x0033`: current program and jump target.
pub(super) fn get_program_id_on_application_jump(
    module: &Module,
    _parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    let (current, current_media, next, next_media) =
        module.with_state(|state| state.program_ids_on_jump())?;
    let mut rb = ResponseBuilder::with_result(0x0033, ResultCode::SUCCESS);
    rb.push_u64(current)
        .push_u32(u32::from(current_media))
        .push_u64(next)
        .push_u32(u32::from(next_media));
    Ok(rb.build())
}

/// `0x0035`: arguments delivered by the program that jumped here.
pub(super) fn receive_deliver_arg(
    module: &Module,
    parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    let param_size = usize_from(parser.pop_u32()?);
    let hmac_size = usize_from(parser.pop_u32()?);
    let delivered = module.with_state(|state| state.deliver_arg(param_size, hmac_size))?;
    let mut rb = ResponseBuilder::with_result(0x0035, ResultCode::SUCCESS);
    let received = delivered.is_some();
    let arg = delivered.unwrap_or_default();
    rb.push_u64(arg.source_program_id).push_bool(received);
    rb.push_static_buffer(0, arg.param);
    rb.push_static_buffer(1, arg.hmac);
    Ok(rb.build())
}

/// `0x0036`: reads the system menu argument.
pub(super) fn load_sys_menu_arg(
    module: &Module,
    parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    let size = usize_from(parser.pop_u32()?);
    let arg = module.with_state(|state| state.load_sys_menu_arg(size))?;
    let mut rb = ResponseBuilder::with_result(0x0036, ResultCode::SUCCESS);
    rb.push_static_buffer(0, arg);
    Ok(rb.build())
}

/// `0x0037`: stores the system menu argument.
pub(super) fn store_sys_menu_arg(
    module: &Module,
    parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    let size = usize_from(parser.pop_u32()?);
    let input = parser.pop_static_buffer()?;
    let data = input.data.get(..size).unwrap_or(input.data);
    module.with_state(|state| state.store_sys_menu_arg(data))?;
    Ok(ResponseBuilder::with_result(0x0037, ResultCode::SUCCESS).build())
}

/// `0x0051`: startup argument of the given kind; always absent here.
pub(super) fn get_startup_argument(
    _module: &Module,
    parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    let requested = parser.pop_u32()?;
    let kind = parser.pop_u32()?;
    if kind > 2 {
        return Err(AptError::OutOfRange {
            name: "startup argument type",
            value: kind,
        }
        .into());
    }
    let size = usize_from(requested).min(MAX_STARTUP_ARGUMENT_SIZE);
    let mut rb = ResponseBuilder::with_result(0x0051, ResultCode::SUCCESS);
    rb.push_bool(false);
    rb.push_static_buffer(0, vec![0; size]);
    Ok(rb.build())
}
