//! Unit tests for the shared module lifecycle, locking and snapshots.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use rstest::{fixture, rstest};
use serde::{Deserialize, Serialize};

use super::*;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Counter {
    value: u32,
    flagged: bool,
}

#[fixture]
fn module() -> SharedModule<Counter> {
    SharedModule::active("counter", Counter::default())
}

#[rstest]
fn with_state_mutates_shared_state(module: SharedModule<Counter>) {
    let other = module.clone();
    module
        .with_state(|state| state.value = 7)
        .expect("module is active");
    let seen = other.with_state(|state| state.value).expect("module is active");
    assert_eq!(seen, 7);
    assert_eq!(module.handle_count(), 2);
}

#[test]
fn uninitialized_module_rejects_access_until_activated() {
    let module = SharedModule::<Counter>::uninitialized("counter");
    assert_eq!(module.lifecycle(), Ok(ModuleLifecycle::Uninitialized));
    assert!(matches!(
        module.with_state(|_| ()),
        Err(ModuleError::NotActive { .. })
    ));

    module.activate(Counter::default()).expect("first activation");
    assert_eq!(module.lifecycle(), Ok(ModuleLifecycle::Active));
    assert!(matches!(
        module.activate(Counter::default()),
        Err(ModuleError::AlreadyActive { .. })
    ));
}

#[rstest]
fn tear_down_returns_state_and_blocks_further_access(module: SharedModule<Counter>) {
    module.with_state(|state| state.value = 3).expect("active");
    let state = module.tear_down().expect("lock intact");
    assert_eq!(state, Some(Counter { value: 3, flagged: false }));
    assert_eq!(module.lifecycle(), Ok(ModuleLifecycle::TornDown));
    assert!(matches!(
        module.with_state(|_| ()),
        Err(ModuleError::TornDown { .. })
    ));
    assert_eq!(module.tear_down().expect("lock intact"), None);
    assert!(matches!(
        module.activate(Counter::default()),
        Err(ModuleError::TornDown { .. })
    ));
}

#[rstest]
fn concurrent_mutations_are_serialised(module: SharedModule<Counter>) {
    let workers: Vec<_> = (0..8)
        .map(|_| {
            let worker_module = module.clone();
            thread::spawn(move || {
                for _ in 0..500 {
                    worker_module
                        .with_state(|state| {
                            let read = state.value;
                            thread::yield_now();
                            state.value = read + 1;
                        })
                        .expect("active");
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker panicked");
    }
    assert_eq!(module.with_state(|state| state.value), Ok(4000));
}

#[rstest]
fn wait_until_releases_the_lock_while_suspended(module: SharedModule<Counter>) {
    let (started_tx, started_rx) = mpsc::channel();
    let waiter = {
        let waiting = module.clone();
        thread::spawn(move || {
            started_tx.send(()).expect("main thread listening");
            waiting.wait_until(|state| state.flagged, |state| state.value)
        })
    };
    started_rx.recv().expect("waiter started");
    // The waiter must not hold the lock, so this mutation can proceed.
    module
        .with_state(|state| {
            state.value = 11;
            state.flagged = true;
        })
        .expect("active");
    assert_eq!(waiter.join().expect("waiter panicked"), Ok(11));
}

#[rstest]
fn wait_until_fails_when_module_is_torn_down(module: SharedModule<Counter>) {
    let waiter = {
        let waiting = module.clone();
        thread::spawn(move || waiting.wait_until(|state| state.flagged, |_| ()))
    };
    thread::sleep(Duration::from_millis(20));
    module.tear_down().expect("lock intact");
    assert!(matches!(
        waiter.join().expect("waiter panicked"),
        Err(ModuleError::TornDown { .. })
    ));
}

#[rstest]
fn wait_until_timeout_gives_up(module: SharedModule<Counter>) {
    let result = module.wait_until_timeout(
        Duration::from_millis(10),
        |state| state.flagged,
        |_| (),
    );
    assert_eq!(result, Ok(None));
}

#[rstest]
fn unbounded_timeout_waits_without_a_deadline(module: SharedModule<Counter>) {
    let waiter = {
        let waiting = module.clone();
        thread::spawn(move || {
            waiting.wait_until_timeout(Duration::MAX, |state| state.flagged, |state| state.value)
        })
    };
    thread::sleep(Duration::from_millis(20));
    module
        .with_state(|state| {
            state.value = 5;
            state.flagged = true;
        })
        .expect("active");
    assert_eq!(waiter.join().expect("waiter panicked"), Ok(Some(5)));
}

#[rstest]
fn snapshot_restores_identical_state(module: SharedModule<Counter>) {
    module
        .with_state(|state| {
            state.value = 42;
            state.flagged = true;
        })
        .expect("active");
    let snapshot = module.capture().expect("capture");
    let bytes = snapshot.to_bytes().expect("encode");

    let restored = SharedModule::<Counter>::uninitialized("counter");
    let decoded = ModuleSnapshot::from_bytes(&bytes).expect("decode");
    restored.restore(&decoded).expect("restore");
    assert_eq!(restored.lifecycle(), Ok(ModuleLifecycle::Active));
    assert_eq!(
        restored.with_state(|state| state.clone()),
        Ok(Counter { value: 42, flagged: true })
    );
}

#[rstest]
fn snapshot_from_another_module_is_rejected(module: SharedModule<Counter>) {
    let snapshot = module.capture().expect("capture");
    let other = SharedModule::<Counter>::uninitialized("other");
    assert!(matches!(
        other.restore(&snapshot),
        Err(SnapshotError::ModuleMismatch { .. })
    ));
}
