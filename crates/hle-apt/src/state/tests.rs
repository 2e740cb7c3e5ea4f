//! Unit tests for applet manager transitions.

use rstest::{fixture, rstest};

use super::*;

#[fixture]
fn state() -> AptState {
    AptState::new(false).with_program(0x0004_0000_0012_3400, 1)
}

#[fixture]
fn application(mut state: AptState) -> AptState {
    state
        .initialize(AppletId::APPLICATION, 0x20)
        .expect("first registration");
    state.enable(0x20).expect("registered attributes");
    state
        .receive_parameter(AppletId::APPLICATION)
        .expect("wakeup queued by enable");
    state
}

fn parameter(sender: AppletId, destination: AppletId) -> MessageParameter {
    MessageParameter {
        sender,
        destination,
        signal: SignalType::Request.raw(),
        object: 0x55,
        buffer: vec![1, 2, 3],
    }
}

#[rstest]
fn initialize_allocates_distinct_events(mut state: AptState) {
    let (notification, param) = state
        .initialize(AppletId::APPLICATION, 0)
        .expect("first registration");
    assert_ne!(notification, param);
    assert_ne!(notification, state.lock_handle(0));
    assert!(state.is_registered(AppletId::APPLICATION));
    assert_eq!(
        state.initialize(AppletId::APPLICATION, 0),
        Err(AptError::AlreadyRegistered {
            applet: AppletId::APPLICATION,
        })
    );
}

#[rstest]
fn enabling_the_application_queues_a_wakeup(mut state: AptState) {
    state.initialize(AppletId::APPLICATION, 0x20).expect("register");
    assert_eq!(state.enable(0x20), Ok(AppletId::APPLICATION));
    let wakeup = state.pending_parameter().expect("wakeup queued");
    assert_eq!(wakeup.sender, AppletId::HOME_MENU);
    assert_eq!(wakeup.signal, SignalType::Wakeup.raw());
    assert_eq!(
        state.enable(0x99),
        Err(AptError::AppletNotFound { attributes: 0x99 })
    );
}

#[rstest]
fn send_fails_while_a_parameter_is_pending(mut application: AptState) {
    let first = parameter(AppletId::APPLICATION, AppletId::SOFTWARE_KEYBOARD);
    application.send_parameter(first).expect("nothing pending");
    let second = parameter(AppletId::APPLICATION, AppletId::HOME_MENU);
    assert!(matches!(
        application.send_parameter(second),
        Err(AptError::ParameterPresent { .. })
    ));
}

#[rstest]
fn glance_keeps_and_receive_consumes(mut application: AptState) {
    let sent = parameter(AppletId::APPLICATION, AppletId::SOFTWARE_KEYBOARD);
    application.send_parameter(sent.clone()).expect("nothing pending");

    assert_eq!(
        application.glance_parameter(AppletId::HOME_MENU),
        Err(AptError::NoParameter {
            applet: AppletId::HOME_MENU,
        })
    );
    assert_eq!(
        application.glance_parameter(AppletId::SOFTWARE_KEYBOARD),
        Ok(sent.clone())
    );
    assert!(application.receive_parameter(AppletId::HOME_MENU).is_err());
    assert_eq!(
        application.receive_parameter(AppletId::SOFTWARE_KEYBOARD),
        Ok(sent)
    );
    assert!(application.pending_parameter().is_none());
}

#[rstest]
fn any_library_applet_destination_matches_library_applets(mut application: AptState) {
    let sent = parameter(AppletId::APPLICATION, AppletId::ANY_LIBRARY_APPLET);
    application.send_parameter(sent).expect("nothing pending");
    assert!(application.glance_parameter(AppletId::HOME_MENU).is_err());
    assert!(application.receive_parameter(AppletId::ERROR_DISPLAY).is_ok());
}

#[rstest]
#[case(None, None, true)]
#[case(Some(AppletId::APPLICATION), None, true)]
#[case(Some(AppletId::HOME_MENU), None, false)]
#[case(None, Some(AppletId::SOFTWARE_KEYBOARD), true)]
#[case(Some(AppletId::APPLICATION), Some(AppletId::HOME_MENU), false)]
fn cancel_honours_its_filters(
    mut application: AptState,
    #[case] sender: Option<AppletId>,
    #[case] destination: Option<AppletId>,
    #[case] cancelled: bool,
) {
    let sent = parameter(AppletId::APPLICATION, AppletId::SOFTWARE_KEYBOARD);
    application.send_parameter(sent).expect("nothing pending");
    assert_eq!(application.cancel_parameter(sender, destination), cancelled);
    assert_eq!(application.pending_parameter().is_none(), cancelled);
}

#[rstest]
fn library_applet_round_trip_wakes_the_application(mut application: AptState) {
    let keyboard = AppletId::SOFTWARE_KEYBOARD;
    application.prepare_library_applet(keyboard).expect("slot free");
    application
        .start_library_applet(keyboard, 0x77, vec![9; 4])
        .expect("prepared");
    assert_eq!(
        application.library_applet().map(|library| library.stage),
        Some(LibraryStage::Started)
    );
    assert!(application.prepare_library_applet(AppletId::ERROR_DISPLAY).is_err());

    let request = application.receive_parameter(keyboard).expect("wakeup for applet");
    assert_eq!(request.buffer, vec![9; 4]);

    application.prepare_to_close_library_applet().expect("running");
    application
        .close_library_applet(0, vec![4, 2])
        .expect("closing");
    assert!(application.library_applet().is_none());

    let result = application
        .receive_parameter(AppletId::APPLICATION)
        .expect("exit wakeup");
    assert_eq!(result.sender, keyboard);
    assert_eq!(result.signal, SignalType::WakeupByExit.raw());
    assert_eq!(result.buffer, vec![4, 2]);
}

#[rstest]
fn preloading_must_finish_before_start(mut state: AptState) {
    let keyboard = AppletId::SOFTWARE_KEYBOARD;
    state.preload_library_applet(keyboard).expect("slot free");
    assert!(matches!(
        state.start_library_applet(keyboard, 0, Vec::new()),
        Err(AptError::LibraryAppletState { .. })
    ));
    state
        .finish_preloading_library_applet(keyboard)
        .expect("preloading");
    assert!(state.start_library_applet(keyboard, 0, Vec::new()).is_ok());
    assert_eq!(
        state.finish_preloading_library_applet(AppletId::ERROR_DISPLAY),
        Err(AptError::LibraryAppletMismatch {
            requested: AppletId::ERROR_DISPLAY,
        })
    );
}

#[rstest]
fn cancel_library_applet_requires_an_occupied_slot(mut state: AptState) {
    assert!(state.cancel_library_applet().is_err());
    state
        .prepare_library_applet(AppletId::ERROR_DISPLAY)
        .expect("slot free");
    state.cancel_library_applet().expect("occupied");
    let wakeup = state
        .receive_parameter(AppletId::APPLICATION)
        .expect("cancel wakeup");
    assert_eq!(wakeup.signal, SignalType::WakeupByCancel.raw());
}

#[rstest]
fn application_jump_delivers_arguments(mut state: AptState) {
    assert_eq!(
        state.do_application_jump(vec![1], vec![2]),
        Err(AptError::JumpNotPrepared)
    );
    state.prepare_application_jump(0, 0x0004_0000_0000_BEEF, 2);
    state
        .do_application_jump(vec![7; DELIVER_ARG_SIZE + 8], vec![3; 4])
        .expect("prepared");

    let (current, media, next, next_media) = state.program_ids_on_jump();
    assert_eq!((current, media), (0x0004_0000_0012_3400, 1));
    assert_eq!((next, next_media), (0x0004_0000_0000_BEEF, 2));

    let arg = state.deliver_arg(DELIVER_ARG_SIZE * 2, 2).expect("delivered");
    assert_eq!(arg.param.len(), DELIVER_ARG_SIZE);
    assert_eq!(arg.hmac, vec![3, 3]);
    assert_eq!(arg.source_program_id, 0x0004_0000_0012_3400);
}

#[rstest]
fn sys_menu_arg_is_fixed_size(mut state: AptState) {
    state.store_sys_menu_arg(&[5; SYS_MENU_ARG_SIZE + 10]);
    assert_eq!(state.load_sys_menu_arg(usize::MAX), vec![5; SYS_MENU_ARG_SIZE]);
    state.store_sys_menu_arg(&[1, 2]);
    let loaded = state.load_sys_menu_arg(4);
    assert_eq!(loaded, vec![1, 2, 0, 0]);
}

#[rstest]
fn capture_info_is_consumed_by_receive_only(mut state: AptState) {
    let info = vec![0xAB; CAPTURE_BUFFER_INFO_SIZE];
    state.send_capture_buffer_info(&info).expect("fits");
    assert_eq!(state.capture_info(usize::MAX), info);
    assert_eq!(state.receive_capture_buffer_info(usize::MAX), info);
    assert!(state.receive_capture_buffer_info(usize::MAX).is_empty());
    assert!(
        state
            .send_capture_buffer_info(&[0; CAPTURE_BUFFER_INFO_SIZE + 1])
            .is_err()
    );
}

#[rstest]
#[case(1, 30, true)]
#[case(1, 4, false)]
#[case(1, 90, false)]
#[case(2, 30, false)]
fn cpu_time_limit_validates_its_arguments(
    mut state: AptState,
    #[case] value: u32,
    #[case] percent: u32,
    #[case] accepted: bool,
) {
    assert_eq!(state.set_cpu_time_limit(value, percent).is_ok(), accepted);
    let expected = if accepted { percent } else { 80 };
    assert_eq!(state.cpu_time_limit(1), Ok(expected));
}

#[rstest]
fn notifications_are_taken_once(mut application: AptState) {
    assert!(application.notify(AppletId::APPLICATION, 3));
    assert!(!application.notify(AppletId::HOME_MENU, 3));
    assert_eq!(application.take_notification(AppletId::APPLICATION), 3);
    assert_eq!(application.take_notification(AppletId::APPLICATION), 0);
}

#[rstest]
fn state_survives_a_serde_round_trip(mut application: AptState) {
    application
        .send_parameter(parameter(AppletId::APPLICATION, AppletId::HOME_MENU))
        .expect("nothing pending");
    application.set_screen_cap_post_permission(0x13);
    let encoded = serde_json::to_string(&application).expect("encode");
    let decoded: AptState = serde_json::from_str(&encoded).expect("decode");
    assert_eq!(decoded, application);
    assert_eq!(decoded.screen_cap_post_permission(), 0x3);
}
