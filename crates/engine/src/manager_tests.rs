// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use cog_drivers::{FakeDriver, FakeHandle};
use std::sync::Arc;

use crate::error::EngineError;
use crate::session::{Session, SessionStatus};

fn create_fake(manager: &SessionManager) -> (Arc<Session>, FakeHandle) {
    let (driver, handle) = FakeDriver::new();
    let session = manager.create(
        Box::new(driver),
        None,
        OrphanPolicy::Terminate,
        SessionMeta {
            program: "./a.out".into(),
            language: None,
            backend: "fake".into(),
        },
    );
    (session, handle)
}

#[test]
fn create_assigns_unique_ids_and_lookup_finds_them() {
    let manager = SessionManager::new();
    let (a, _ha) = create_fake(&manager);
    let (b, _hb) = create_fake(&manager);

    assert_ne!(a.id(), b.id());
    assert_eq!(manager.list().len(), 2);

    let found = manager.lookup(a.id().as_str()).unwrap();
    assert_eq!(found.id(), a.id());
}

#[test]
fn lookup_of_unknown_session_fails() {
    let manager = SessionManager::new();
    let err = manager.lookup("s404404").unwrap_err();
    assert!(matches!(err, EngineError::UnknownSession(_)));
    assert!(err.to_string().contains("s404404"));
}

#[test]
fn destroy_removes_and_tears_down() {
    let manager = SessionManager::new();
    let (session, handle) = create_fake(&manager);
    let id = session.id().to_string();

    manager.destroy(&id).unwrap();
    assert!(manager.get(&id).is_none());
    assert!(handle.calls().contains(&"stop".to_string()));
    assert_eq!(session.status(), SessionStatus::Terminated);

    // idempotence: a second destroy reports unknown
    assert!(manager.destroy(&id).is_err());
}

#[test]
fn destroy_with_blocked_worker_joins_it() {
    let manager = SessionManager::new();
    let (session, _handle) = create_fake(&manager);
    let id = session.id().to_string();

    crate::controller::spawn_run(
        &session,
        cog_core::RunAction::Continue,
        cog_core::RunOptions::default(),
    )
    .unwrap();

    // abort path: fake has no pid, so the driver teardown wakes the worker
    manager.destroy(&id).unwrap();
    assert!(!session.has_pending());
}

#[test]
fn orphan_with_dead_client_is_terminated() {
    let manager = SessionManager::new();

    // a process that is already gone when the watchdog looks
    let mut child = std::process::Command::new("true")
        .spawn()
        .expect("spawn true");
    let dead_pid = child.id();
    child.wait().expect("reap");

    let (driver, _h) = FakeDriver::new();
    let session = manager.create(
        Box::new(driver),
        Some(dead_pid),
        OrphanPolicy::Terminate,
        SessionMeta::default(),
    );
    let id = session.id().to_string();

    let reaped = manager.reap_orphans();
    assert_eq!(reaped.len(), 1);
    assert_eq!(reaped[0].client_pid, dead_pid);
    assert_eq!(reaped[0].policy, OrphanPolicy::Terminate);
    assert!(manager.get(&id).is_none());
}

#[test]
fn orphan_with_live_client_is_left_alone() {
    let manager = SessionManager::new();
    let (driver, _h) = FakeDriver::new();
    let session = manager.create(
        Box::new(driver),
        Some(std::process::id()),
        OrphanPolicy::Terminate,
        SessionMeta::default(),
    );

    assert!(manager.reap_orphans().is_empty());
    assert!(manager.get(session.id().as_str()).is_some());
}

#[test]
fn detach_policy_detaches_instead_of_killing() {
    let manager = SessionManager::new();

    let mut child = std::process::Command::new("true")
        .spawn()
        .expect("spawn true");
    let dead_pid = child.id();
    child.wait().expect("reap");

    let (driver, handle) = FakeDriver::new();
    manager.create(
        Box::new(driver),
        Some(dead_pid),
        OrphanPolicy::Detach,
        SessionMeta::default(),
    );

    let reaped = manager.reap_orphans();
    assert_eq!(reaped.len(), 1);
    assert_eq!(reaped[0].policy, OrphanPolicy::Detach);
    // the driver was detached, not stopped
    let calls = handle.calls();
    assert!(!calls.contains(&"stop".to_string()), "calls: {calls:?}");
}

#[test]
fn shutdown_destroys_everything() {
    let manager = SessionManager::new();
    create_fake(&manager);
    create_fake(&manager);

    manager.shutdown();
    assert!(manager.is_empty());
}
