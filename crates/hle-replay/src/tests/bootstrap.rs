//! Bootstrap and host wiring tests.

use hle_apt::{APT_A, APT_S, APT_U};
use hle_config::Config;
use hle_ipc::{ModuleLifecycle, ResultCode, ServicePort};
use rstest::rstest;

use super::support::{command_line_loader, failing_loader, loader_for};
use crate::{BootstrapError, Host, bootstrap_with, dispatch_policy};

#[rstest]
fn bootstrap_registers_every_apt_facade() {
    let loader = loader_for(Config::default());
    let host = bootstrap_with(&loader).expect("bootstrap should succeed");
    assert_eq!(host.manager().names(), [APT_U, APT_A, APT_S]);
}

#[rstest]
fn configuration_failures_are_reported() {
    let loader = failing_loader();
    let error = bootstrap_with(&loader).expect_err("invalid configuration");
    assert!(matches!(error, BootstrapError::Configuration { .. }));
}

#[rstest]
fn command_line_settings_reach_the_host() {
    let loader = command_line_loader(&["--stub-result", "7", "--apt-max-sessions", "2"]);
    let host = bootstrap_with(&loader).expect("bootstrap should succeed");
    assert_eq!(host.config().stub_result, 7);
    let port = host.manager().get(APT_S).expect("registered");
    assert_eq!(port.max_sessions(), 2);
}

#[rstest]
fn configured_codes_become_the_dispatch_policy() {
    let config = Config {
        stub_result: 0xD960_1FF4,
        unknown_result: 0xD900_182F,
        ..Config::default()
    };
    let policy = dispatch_policy(&config);
    assert_eq!(policy.stub_result, ResultCode::from_raw(0xD960_1FF4));
    assert_eq!(policy.unknown_result, ResultCode::from_raw(0xD900_182F));
    assert_eq!(
        policy.malformed_result,
        ResultCode::from_raw(config.malformed_result)
    );
}

#[rstest]
#[case(1)]
#[case(3)]
fn session_cap_follows_configuration(#[case] cap: u32) {
    let host = Host::from_config(Config {
        apt_max_sessions: cap,
        ..Config::default()
    })
    .expect("host builds");
    let port = host.manager().get(APT_U).expect("registered");
    assert_eq!(port.max_sessions(), cap);
    let sessions: Vec<_> = (0..cap)
        .map(|_| host.manager().connect(APT_U).expect("within cap"))
        .collect();
    assert!(host.manager().connect(APT_U).is_err());
    drop(sessions);
    assert!(host.manager().connect(APT_U).is_ok());
}

#[rstest]
fn shutdown_unregisters_and_tears_down() {
    let host = Host::from_config(Config::default()).expect("host builds");
    host.shutdown().expect("clean shutdown");
    assert!(host.manager().is_empty());
    assert_eq!(
        host.apt().module().lifecycle(),
        Ok(ModuleLifecycle::TornDown)
    );
}
