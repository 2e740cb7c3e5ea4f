//! Command-buffer level tests through the registered facades.

use hle_ipc::{
    CommandTable, DispatchPolicy, IpcRequest, MAX_STATIC_BUFFER_SIZE, OutputBuffer, ResultCode,
    ServicePort,
};
use rstest::{fixture, rstest};

use super::support::{
    Apt, PROGRAM_ID, call, enable, glance_parameter, initialize, receive_parameter,
    send_parameter, static_descriptor,
};
use crate::{
    ALREADY_REGISTERED, APT_A, APT_COMMANDS, APT_S, APT_U, ARGUMENT_OUT_OF_RANGE, AppletId,
    JUMP_NOT_PREPARED, LIBRARY_APPLET_STATE, NO_PARAMETER, PARAMETER_PRESENT, SignalType,
};

#[fixture]
fn apt() -> Apt {
    Apt::new()
}

#[test]
fn table_lists_every_command_once() {
    let table = CommandTable::new(APT_COMMANDS.iter().copied()).expect("unique commands");
    assert_eq!(table.len(), 88);
    assert_eq!(table.implemented_count(), 36);
    assert_eq!(table.stubbed_count(), 52);
}

#[rstest]
#[case(0x0006, "GetAppletInfo")]
#[case(0x0015, "PrepareToStartApplication")]
#[case(0x0027, "CloseApplication")]
#[case(0x0044, "GetSharedFont")]
#[case(0x0046, "Wrap")]
#[case(0x0047, "Unwrap")]
#[case(0x0058, "GetProgramID")]
fn out_of_scope_commands_are_stubs(#[case] command: u16, #[case] name: &str) {
    let table = CommandTable::new(APT_COMMANDS.iter().copied()).expect("unique commands");
    let descriptor = table.resolve(command).expect("listed");
    assert_eq!(descriptor.name(), name);
    assert!(descriptor.handler().is_stubbed());
}

#[rstest]
fn every_facade_is_registered(apt: Apt) {
    assert_eq!(apt.manager.names(), [APT_U, APT_A, APT_S]);
    for facade in apt.services.facades() {
        assert_eq!(facade.max_sessions(), crate::MAX_APT_SESSIONS);
        assert_eq!(facade.table().len(), 88);
    }
    assert!(apt.services.facade("APT:X").is_none());
}

#[rstest]
fn lock_handle_is_copied_to_the_caller(apt: Apt) {
    let session = apt.connect(APT_U);
    let response = call(&session, &IpcRequest::new(vec![0x0001_0040, 0x20]));
    assert_eq!(response.words().first(), Some(&0x0001_0102));
    assert_eq!(response.result(), Some(ResultCode::SUCCESS));
    assert_eq!(response.values(), &[0x20, 0, 0, 0x0, 0x1000]);
}

#[rstest]
fn initialize_twice_reports_the_registration(apt: Apt) {
    let session = apt.connect(APT_U);
    let first = call(&session, &initialize(AppletId::APPLICATION, 0x20));
    assert_eq!(first.result(), Some(ResultCode::SUCCESS));
    assert_eq!(first.values().len(), 3);

    let second = call(&session, &initialize(AppletId::APPLICATION, 0x20));
    assert_eq!(second.words(), &[0x0002_0040, ALREADY_REGISTERED.raw()]);
}

#[rstest]
fn parameters_cross_facades(apt: Apt) {
    let user = apt.connect(APT_U);
    let system = apt.connect(APT_S);
    let sent = call(
        &user,
        &send_parameter(
            AppletId::APPLICATION,
            AppletId::HOME_MENU,
            SignalType::Request.raw(),
            &[1, 2, 3, 4],
        ),
    );
    assert_eq!(sent.words(), &[0x000C_0040, 0]);

    let glanced = call(&system, &glance_parameter(AppletId::HOME_MENU, 0x10));
    assert_eq!(glanced.words().first(), Some(&0x000E_0104));
    assert_eq!(
        glanced.values(),
        &[
            AppletId::APPLICATION.0,
            SignalType::Request.raw(),
            4,
            0x10,
            0x77,
            static_descriptor(4, 0),
            0,
        ]
    );

    let received = call(&system, &receive_parameter(AppletId::HOME_MENU, 2));
    assert_eq!(
        received.buffers(),
        &[OutputBuffer {
            id: 0,
            data: vec![1, 2],
        }]
    );
    let again = call(&user, &receive_parameter(AppletId::HOME_MENU, 2));
    assert_eq!(again.result(), Some(NO_PARAMETER));
}

#[rstest]
fn a_pending_parameter_blocks_the_next_send(apt: Apt) {
    let session = apt.connect(APT_A);
    let request = send_parameter(AppletId::HOME_MENU, AppletId::APPLICATION, 1, &[]);
    assert_eq!(call(&session, &request).result(), Some(ResultCode::SUCCESS));
    assert_eq!(call(&session, &request).result(), Some(PARAMETER_PRESENT));

    let cancel = IpcRequest::new(vec![0x000F_0100, 1, AppletId::HOME_MENU.0, 0, 0]);
    assert_eq!(call(&session, &cancel).values(), &[1]);
    assert_eq!(call(&session, &request).result(), Some(ResultCode::SUCCESS));
}

#[rstest]
fn enabling_the_application_delivers_the_home_menu_wakeup(apt: Apt) {
    let session = apt.connect(APT_U);
    call(&session, &initialize(AppletId::APPLICATION, 0x20));
    assert_eq!(call(&session, &enable(0x20)).result(), Some(ResultCode::SUCCESS));

    let wakeup = call(&session, &receive_parameter(AppletId::APPLICATION, 0));
    assert_eq!(
        wakeup.values().get(..3),
        Some([AppletId::HOME_MENU.0, SignalType::Wakeup.raw(), 0].as_slice())
    );
    let registered = call(&session, &IpcRequest::new(vec![0x0009_0040, AppletId::APPLICATION.0]));
    assert_eq!(registered.values(), &[1]);
}

#[rstest]
fn library_applet_round_trip(apt: Apt) {
    let application = apt.connect(APT_U);
    let keyboard = apt.connect(APT_A);
    let applet = AppletId::SOFTWARE_KEYBOARD.0;

    let prepare = IpcRequest::new(vec![0x0018_0040, applet]);
    assert_eq!(call(&application, &prepare).result(), Some(ResultCode::SUCCESS));
    let start = IpcRequest::with_buffers(
        vec![0x001E_0084, applet, 2, 0, 0x99, static_descriptor(2, 0), 0],
        vec![vec![7, 8]],
    );
    assert_eq!(call(&application, &start).result(), Some(ResultCode::SUCCESS));
    assert_eq!(call(&application, &prepare).result(), Some(LIBRARY_APPLET_STATE));

    let input = call(&keyboard, &receive_parameter(AppletId::SOFTWARE_KEYBOARD, 8));
    assert_eq!(
        input.values().get(..3),
        Some([AppletId::APPLICATION.0, SignalType::Wakeup.raw(), 2].as_slice())
    );

    let close = IpcRequest::with_buffers(
        vec![0x0028_0044, 1, 0, 0, static_descriptor(1, 0), 0],
        vec![vec![0xAA]],
    );
    assert_eq!(call(&keyboard, &close).result(), Some(ResultCode::SUCCESS));
    let output = call(&application, &receive_parameter(AppletId::APPLICATION, 8));
    assert_eq!(
        output.values().get(..3),
        Some([applet, SignalType::WakeupByExit.raw(), 1].as_slice())
    );
}

#[rstest]
fn application_jump_requires_preparation(apt: Apt) {
    let session = apt.connect(APT_U);
    let jump = IpcRequest::with_buffers(
        vec![
            0x0032_0084,
            1,
            1,
            static_descriptor(1, 0),
            0,
            static_descriptor(1, 2),
            0,
        ],
        vec![vec![0x11], vec![0x22]],
    );
    assert_eq!(call(&session, &jump).words(), &[0x0032_0040, JUMP_NOT_PREPARED.raw()]);

    let prepare = IpcRequest::new(vec![0x0031_0100, 0, 0x0000_5600, 0x0004_0000, 2]);
    assert_eq!(call(&session, &prepare).result(), Some(ResultCode::SUCCESS));
    assert_eq!(call(&session, &jump).result(), Some(ResultCode::SUCCESS));

    let ids = call(&session, &IpcRequest::new(vec![0x0033_0000]));
    let (low, high): (u32, u32) = (0x0012_3400, 0x0004_0000);
    assert_eq!((u64::from(high) << 32) | u64::from(low), PROGRAM_ID);
    assert_eq!(ids.values(), &[low, high, 1, 0x0000_5600, 0x0004_0000, 2]);

    let deliver = call(&session, &IpcRequest::new(vec![0x0035_0080, 0x300, 0x20]));
    assert_eq!(deliver.values().get(..3), Some([low, high, 1].as_slice()));
    assert_eq!(
        deliver.buffers(),
        &[
            OutputBuffer { id: 0, data: vec![0x11] },
            OutputBuffer { id: 1, data: vec![0x22] },
        ]
    );
}

#[rstest]
#[case(1, 30, ResultCode::SUCCESS)]
#[case(1, 4, ARGUMENT_OUT_OF_RANGE)]
#[case(1, 90, ARGUMENT_OUT_OF_RANGE)]
#[case(0, 30, ARGUMENT_OUT_OF_RANGE)]
fn cpu_time_limit_is_range_checked(
    apt: Apt,
    #[case] value: u32,
    #[case] percent: u32,
    #[case] expected: ResultCode,
) {
    let session = apt.connect(APT_U);
    let set = call(&session, &IpcRequest::new(vec![0x004F_0080, value, percent]));
    assert_eq!(set.result(), Some(expected));

    let get = call(&session, &IpcRequest::new(vec![0x0050_0040, 1]));
    let current = if expected.is_success() { percent } else { 80 };
    assert_eq!(get.values(), &[current]);
}

#[rstest]
fn capture_buffer_info_is_taken_once(apt: Apt) {
    let session = apt.connect(APT_U);
    let send = IpcRequest::with_buffers(
        vec![0x0040_0042, 4, static_descriptor(4, 0), 0],
        vec![vec![1, 2, 3, 4]],
    );
    assert_eq!(call(&session, &send).result(), Some(ResultCode::SUCCESS));

    let peek = call(&session, &IpcRequest::new(vec![0x004A_0040, 0x20]));
    assert_eq!(peek.values().first(), Some(&4));
    let take = call(&session, &IpcRequest::new(vec![0x0041_0040, 0x20]));
    assert_eq!(take.values().first(), Some(&4));
    let empty = call(&session, &IpcRequest::new(vec![0x0041_0040, 0x20]));
    assert_eq!(empty.values().first(), Some(&0));
}

#[rstest]
fn screen_capture_permission_keeps_the_low_nibble(apt: Apt) {
    let session = apt.connect(APT_S);
    call(&session, &IpcRequest::new(vec![0x0055_0040, 0x13]));
    let permission = call(&session, &IpcRequest::new(vec![0x0056_0000]));
    assert_eq!(permission.values(), &[0x3]);
}

#[rstest]
#[case(0x0101)]
#[case(0x0102)]
fn model_checks_report_an_old_console(apt: Apt, #[case] command: u16) {
    let session = apt.connect(APT_U);
    let response = call(&session, &IpcRequest::new(vec![u32::from(command) << 16]));
    assert_eq!(response.values(), &[0]);
}

#[rstest]
fn startup_argument_type_is_range_checked(apt: Apt) {
    let session = apt.connect(APT_U);
    let valid = call(&session, &IpcRequest::new(vec![0x0051_0080, 0x10, 1]));
    assert_eq!(valid.values().first(), Some(&0));
    assert_eq!(
        valid.buffers(),
        &[OutputBuffer { id: 0, data: vec![0; 0x10] }]
    );
    let invalid = call(&session, &IpcRequest::new(vec![0x0051_0080, 0x10, 3]));
    assert_eq!(invalid.result(), Some(ARGUMENT_OUT_OF_RANGE));
}

#[rstest]
#[case(0x10, 0x10)]
#[case(0x4_0000, MAX_STATIC_BUFFER_SIZE)]
#[case(u32::MAX, MAX_STATIC_BUFFER_SIZE)]
fn applet_utility_output_matches_its_descriptor(
    apt: Apt,
    #[case] requested: u32,
    #[case] expected: usize,
) {
    let session = apt.connect(APT_U);
    let request = IpcRequest::with_buffers(
        vec![0x004B_00C2, 1, 4, requested, static_descriptor(4, 0), 0],
        vec![vec![0; 4]],
    );
    let response = call(&session, &request);
    assert_eq!(response.result(), Some(ResultCode::SUCCESS));

    let descriptor = response.values().get(1).copied().expect("descriptor");
    let buffer = response.buffers().first().expect("output buffer");
    assert_eq!(buffer.data.len(), expected);
    assert_eq!(
        usize::try_from(descriptor >> 14).expect("fits"),
        buffer.data.len()
    );
}

#[rstest]
fn stubbed_commands_answer_with_the_stub_result(apt: Apt) {
    let session = apt.connect(APT_U);
    let response = call(&session, &IpcRequest::new(vec![0x0044_0000]));
    assert_eq!(
        response.words(),
        &[0x0044_0040, DispatchPolicy::default().stub_result.raw()]
    );
}

#[rstest]
fn undecodable_parameters_fail_the_command(apt: Apt) {
    let session = apt.connect(APT_U);
    // The handle descriptor slot carries a static buffer descriptor instead.
    let request = IpcRequest::new(vec![
        0x000C_0104,
        AppletId::APPLICATION.0,
        AppletId::HOME_MENU.0,
        1,
        0,
        static_descriptor(0, 0),
        0,
        0,
        0,
    ]);
    assert_eq!(
        call(&session, &request).result(),
        Some(ResultCode::INVALID_PARAMETERS)
    );
}
