//! Registration, notification and manager queries.

use hle_ipc::{HandlerFailure, IpcResponse, RequestParser, ResponseBuilder, ResultCode};
use tracing::debug;

use super::{COMMANDS_TARGET, Module};
use crate::applet::AppletId;

/// `0x0001`: returns the APT lock mutex.
pub(super) fn get_lock_handle(
    module: &Module,
    parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    let flags = parser.pop_u32()?;
    let lock = module.with_state(|state| state.lock_handle(flags))?;
    let mut rb = ResponseBuilder::with_result(0x0001, ResultCode::SUCCESS);
    rb.push_u32(flags).push_u32(0).push_u32(0);
    rb.push_copy_handles(&[lock]);
    Ok(rb.build())
}

/// `0x0002`: registers the calling applet and returns its events.
pub(super) fn initialize(
    module: &Module,
    parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    let applet = AppletId(parser.pop_u32()?);
    let attributes = parser.pop_u32()?;
    let (notification, parameter) =
        module.with_state(|state| state.initialize(applet, attributes))??;
    debug!(target: COMMANDS_TARGET, %applet, attributes, "applet initialised");
    let mut rb = ResponseBuilder::with_result(0x0002, ResultCode::SUCCESS);
    rb.push_copy_handles(&[notification, parameter]);
    Ok(rb.build())
}

/// `0x0003`: enables the applet registered with the given attributes.
pub(super) fn enable(
    module: &Module,
    parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    let attributes = parser.pop_u32()?;
    let applet = module.with_state(|state| state.enable(attributes))??;
    debug!(target: COMMANDS_TARGET, %applet, "applet enabled");
    Ok(ResponseBuilder::with_result(0x0003, ResultCode::SUCCESS).build())
}

/// `0x0005`: reports the active and requested applets.
pub(super) fn get_applet_man_info(
    module: &Module,
    parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    let position = parser.pop_u32()?;
    let info = module.with_state(|state| state.manager_info(position))?;
    let mut rb = ResponseBuilder::with_result(0x0005, ResultCode::SUCCESS);
    rb.push_u32(info.position)
        .push_u32(info.requested.0)
        .push_u32(info.home_menu.0)
        .push_u32(info.active.0);
    Ok(rb.build())
}

/// `0x0009`: whether an applet is registered.
pub(super) fn is_registered(
    module: &Module,
    parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    let applet = AppletId(parser.pop_u32()?);
    let registered = module.with_state(|state| state.is_registered(applet))?;
    let mut rb = ResponseBuilder::with_result(0x0009, ResultCode::SUCCESS);
    rb.push_bool(registered);
    Ok(rb.build())
}

/// `0x000B`: takes the applet's pending notification.
pub(super) fn inquire_notification(
    module: &Module,
    parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    let applet = AppletId(parser.pop_u32()?);
    let notification = module.with_state(|state| state.take_notification(applet))?;
    let mut rb = ResponseBuilder::with_result(0x000B, ResultCode::SUCCESS);
    rb.push_u32(notification);
    Ok(rb.build())
}

/// `0x0043`: acknowledged without effect; the applet waits on its own events.
pub(super) fn notify_to_wait(
    module: &Module,
    parser: &mut RequestParser<'_>,
) -> Result<IpcResponse, HandlerFailure> {
    let applet = AppletId(parser.pop_u32()?);
    module.with_state(|_| ())?;
    debug!(target: COMMANDS_TARGET, %applet, "notify to wait");
    Ok(ResponseBuilder::with_result(0x0043, ResultCode::SUCCESS).build())
}
