//! Command handlers and the command table shared by every APT facade.
//!
//! Handlers decode their parameters with the request parser, mutate
//! [`AptState`] under the module lock and encode their response. Commands
//! with no handler are listed as stubs so the dispatcher can answer them
//! with the configured stub result.

mod applet;
mod jump;
mod library;
mod parameter;
mod system;

use hle_ipc::{CommandDescriptor, SharedModule};

use crate::state::AptState;

pub(super) type Module = SharedModule<AptState>;

pub(super) const COMMANDS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::commands");

/// Widens a sizing word; saturates on targets narrower than 32 bits.
fn usize_from(value: u32) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

/// Every command the APT services understand, keyed by the header the guest
/// is expected to send.
#[rustfmt::skip]
pub static APT_COMMANDS: &[CommandDescriptor<AptState>] = &[
    CommandDescriptor::implemented(0x0001_0040, "GetLockHandle", applet::get_lock_handle),
    CommandDescriptor::implemented(0x0002_0080, "Initialize", applet::initialize),
    CommandDescriptor::implemented(0x0003_0040, "Enable", applet::enable),
    CommandDescriptor::stubbed(0x0004_0040, "Finalize"),
    CommandDescriptor::implemented(0x0005_0040, "GetAppletManInfo", applet::get_applet_man_info),
    CommandDescriptor::stubbed(0x0006_0040, "GetAppletInfo"),
    CommandDescriptor::stubbed(0x0007_0000, "GetLastSignaledAppletId"),
    CommandDescriptor::stubbed(0x0008_0000, "CountRegisteredApplet"),
    CommandDescriptor::implemented(0x0009_0040, "IsRegistered", applet::is_registered),
    CommandDescriptor::stubbed(0x000A_0040, "GetAttribute"),
    CommandDescriptor::implemented(0x000B_0040, "InquireNotification", applet::inquire_notification),
    CommandDescriptor::implemented(0x000C_0104, "SendParameter", parameter::send_parameter),
    CommandDescriptor::implemented(0x000D_0080, "ReceiveParameter", parameter::receive_parameter),
    CommandDescriptor::implemented(0x000E_0080, "GlanceParameter", parameter::glance_parameter),
    CommandDescriptor::implemented(0x000F_0100, "CancelParameter", parameter::cancel_parameter),
    CommandDescriptor::stubbed(0x0010_00C2, "DebugFunc"),
    CommandDescriptor::stubbed(0x0011_00C0, "MapProgramIdForDebug"),
    CommandDescriptor::stubbed(0x0012_0040, "SetHomeMenuAppletIdForDebug"),
    CommandDescriptor::stubbed(0x0013_0000, "GetPreparationState"),
    CommandDescriptor::stubbed(0x0014_0040, "SetPreparationState"),
    CommandDescriptor::stubbed(0x0015_0140, "PrepareToStartApplication"),
    CommandDescriptor::implemented(0x0016_0040, "PreloadLibraryApplet", library::preload_library_applet),
    CommandDescriptor::implemented(0x0017_0040, "FinishPreloadingLibraryApplet", library::finish_preloading_library_applet),
    CommandDescriptor::implemented(0x0018_0040, "PrepareToStartLibraryApplet", library::prepare_to_start_library_applet),
    CommandDescriptor::stubbed(0x0019_0040, "PrepareToStartSystemApplet"),
    CommandDescriptor::stubbed(0x001A_0000, "PrepareToStartNewestHomeMenu"),
    CommandDescriptor::stubbed(0x001B_00C4, "StartApplication"),
    CommandDescriptor::stubbed(0x001C_0000, "WakeupApplication"),
    CommandDescriptor::stubbed(0x001D_0000, "CancelApplication"),
    CommandDescriptor::implemented(0x001E_0084, "StartLibraryApplet", library::start_library_applet),
    CommandDescriptor::stubbed(0x001F_0084, "StartSystemApplet"),
    CommandDescriptor::stubbed(0x0020_0044, "StartNewestHomeMenu"),
    CommandDescriptor::stubbed(0x0021_0000, "OrderToCloseApplication"),
    CommandDescriptor::stubbed(0x0022_0040, "PrepareToCloseApplication"),
    CommandDescriptor::stubbed(0x0023_0040, "PrepareToJumpToApplication"),
    CommandDescriptor::stubbed(0x0024_0044, "JumpToApplication"),
    CommandDescriptor::implemented(0x0025_00C0, "PrepareToCloseLibraryApplet", library::prepare_to_close_library_applet),
    CommandDescriptor::stubbed(0x0026_0000, "PrepareToCloseSystemApplet"),
    CommandDescriptor::stubbed(0x0027_0044, "CloseApplication"),
    CommandDescriptor::implemented(0x0028_0044, "CloseLibraryApplet", library::close_library_applet),
    CommandDescriptor::stubbed(0x0029_0044, "CloseSystemApplet"),
    CommandDescriptor::stubbed(0x002A_0000, "OrderToCloseSystemApplet"),
    CommandDescriptor::stubbed(0x002B_0000, "PrepareToJumpToHomeMenu"),
    CommandDescriptor::stubbed(0x002C_0044, "JumpToHomeMenu"),
    CommandDescriptor::stubbed(0x002D_0000, "PrepareToLeaveHomeMenu"),
    CommandDescriptor::stubbed(0x002E_0044, "LeaveHomeMenu"),
    CommandDescriptor::stubbed(0x002F_0040, "PrepareToLeaveResidentApplet"),
    CommandDescriptor::stubbed(0x0030_0044, "LeaveResidentApplet"),
    CommandDescriptor::implemented(0x0031_0100, "PrepareToDoApplicationJump", jump::prepare_to_do_application_jump),
    CommandDescriptor::implemented(0x0032_0084, "DoApplicationJump", jump::do_application_jump),
    CommandDescriptor::implemented(0x0033_0000, "GetProgramIdOnApplicationJump", jump::get_program_id_on_application_jump),
    CommandDescriptor::stubbed(0x0034_0084, "SendDeliverArg"),
    CommandDescriptor::implemented(0x0035_0080, "ReceiveDeliverArg", jump::receive_deliver_arg),
    CommandDescriptor::implemented(0x0036_0040, "LoadSysMenuArg", jump::load_sys_menu_arg),
    CommandDescriptor::implemented(0x0037_0042, "StoreSysMenuArg", jump::store_sys_menu_arg),
    CommandDescriptor::stubbed(0x0038_0040, "PreloadResidentApplet"),
    CommandDescriptor::stubbed(0x0039_0040, "PrepareToStartResidentApplet"),
    CommandDescriptor::stubbed(0x003A_0044, "StartResidentApplet"),
    CommandDescriptor::implemented(0x003B_0040, "CancelLibraryApplet", library::cancel_library_applet),
    CommandDescriptor::stubbed(0x003C_0042, "SendDspSleep"),
    CommandDescriptor::stubbed(0x003D_0042, "SendDspWakeUp"),
    CommandDescriptor::stubbed(0x003E_0080, "ReplySleepQuery"),
    CommandDescriptor::stubbed(0x003F_0040, "ReplySleepNotificationComplete"),
    CommandDescriptor::implemented(0x0040_0042, "SendCaptureBufferInfo", system::send_capture_buffer_info),
    CommandDescriptor::implemented(0x0041_0040, "ReceiveCaptureBufferInfo", system::receive_capture_buffer_info),
    CommandDescriptor::stubbed(0x0042_0080, "SleepSystem"),
    CommandDescriptor::implemented(0x0043_0040, "NotifyToWait", applet::notify_to_wait),
    CommandDescriptor::stubbed(0x0044_0000, "GetSharedFont"),
    CommandDescriptor::implemented(0x0045_0040, "GetWirelessRebootInfo", system::get_wireless_reboot_info),
    CommandDescriptor::stubbed(0x0046_0104, "Wrap"),
    CommandDescriptor::stubbed(0x0047_0104, "Unwrap"),
    CommandDescriptor::stubbed(0x0048_0100, "GetProgramInfo"),
    CommandDescriptor::stubbed(0x0049_0180, "Reboot"),
    CommandDescriptor::implemented(0x004A_0040, "GetCaptureInfo", system::get_capture_info),
    CommandDescriptor::implemented(0x004B_00C2, "AppletUtility", system::applet_utility),
    CommandDescriptor::stubbed(0x004C_0000, "SetFatalErrDispMode"),
    CommandDescriptor::stubbed(0x004D_0080, "GetAppletProgramInfo"),
    CommandDescriptor::stubbed(0x004E_0000, "HardwareResetAsync"),
    CommandDescriptor::implemented(0x004F_0080, "SetAppCpuTimeLimit", system::set_app_cpu_time_limit),
    CommandDescriptor::implemented(0x0050_0040, "GetAppCpuTimeLimit", system::get_app_cpu_time_limit),
    CommandDescriptor::implemented(0x0051_0080, "GetStartupArgument", jump::get_startup_argument),
    CommandDescriptor::stubbed(0x0052_0104, "Wrap1"),
    CommandDescriptor::stubbed(0x0053_0104, "Unwrap1"),
    CommandDescriptor::implemented(0x0055_0040, "SetScreenCapPostPermission", system::set_screen_cap_post_permission),
    CommandDescriptor::implemented(0x0056_0000, "GetScreenCapPostPermission", system::get_screen_cap_post_permission),
    CommandDescriptor::stubbed(0x0058_0002, "GetProgramID"),
    CommandDescriptor::implemented(0x0101_0000, "CheckNew3DSApp", system::check_new_3ds_app),
    CommandDescriptor::implemented(0x0102_0000, "CheckNew3DS", system::check_new_3ds),
];

/// Owned copy of [`APT_COMMANDS`] for building a facade.
#[must_use]
pub fn apt_commands() -> Vec<CommandDescriptor<AptState>> {
    APT_COMMANDS.to_vec()
}
