// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use cog_core::{RunAction, RunOptions, StopReason, StopState};
use cog_drivers::{FakeDriver, FakeHandle};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::EngineError;
use crate::session::{OrphanPolicy, Session, SessionMeta, SessionStatus};

fn session_with_fake() -> (Arc<Session>, FakeHandle) {
    let (driver, handle) = FakeDriver::new();
    let session = Arc::new(Session::new(
        cog_core::SessionId::new("s0ffee1"),
        Box::new(driver),
        None,
        OrphanPolicy::Terminate,
        SessionMeta::default(),
    ));
    session.set_status(SessionStatus::Stopped);
    (session, handle)
}

fn wait_for_completion(session: &Session) -> RunCompletion {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(completion) = promote(session) {
            return completion;
        }
        assert!(Instant::now() < deadline, "run never completed");
        std::thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn spawn_run_returns_immediately_and_promote_publishes_the_stop() {
    let (session, handle) = session_with_fake();

    spawn_run(&session, RunAction::Continue, RunOptions::default()).unwrap();
    assert_eq!(session.status(), SessionStatus::Running);
    assert!(session.has_pending());

    // nothing to promote while the worker is blocked
    assert!(promote(&session).is_none());

    let mut stop = StopState::new(StopReason::Breakpoint);
    stop.hit_breakpoint_ids = vec![1];
    handle.push_stop(stop);

    match wait_for_completion(&session) {
        RunCompletion::Stopped { session_id, action, stop } => {
            assert_eq!(session_id, "s0ffee1");
            assert_eq!(action, "continue");
            assert_eq!(stop.reason, StopReason::Breakpoint);
        }
        other => panic!("expected a stop, got {other:?}"),
    }

    assert_eq!(session.status(), SessionStatus::Stopped);
    assert!(!session.has_pending());
}

#[test]
fn exit_stop_transitions_the_session_to_terminated() {
    let (session, handle) = session_with_fake();
    spawn_run(&session, RunAction::Continue, RunOptions::default()).unwrap();
    handle.push_stop(StopState::exited(0));

    match wait_for_completion(&session) {
        RunCompletion::Stopped { stop, .. } => assert_eq!(stop.exit_code, Some(0)),
        other => panic!("expected a stop, got {other:?}"),
    }
    assert_eq!(session.status(), SessionStatus::Terminated);
}

#[test]
fn second_run_is_rejected_while_pending() {
    let (session, handle) = session_with_fake();
    spawn_run(&session, RunAction::Continue, RunOptions::default()).unwrap();

    let err = spawn_run(&session, RunAction::StepOver, RunOptions::default()).unwrap_err();
    assert!(matches!(err, EngineError::RunPending));

    handle.push_stop(StopState::exited(0));
    wait_for_completion(&session);
}

#[test]
fn failed_run_promotes_an_error_and_returns_to_stopped() {
    let (session, handle) = session_with_fake();
    spawn_run(&session, RunAction::Continue, RunOptions::default()).unwrap();
    handle.kill();

    match wait_for_completion(&session) {
        RunCompletion::Failed { error, action, .. } => {
            assert_eq!(action, "continue");
            assert!(error.contains("killed"), "{error}");
        }
        other => panic!("expected a failure, got {other:?}"),
    }
    assert_eq!(session.status(), SessionStatus::Stopped);
}

#[test]
fn log_point_stops_resume_transparently_and_accumulate_messages() {
    let (session, handle) = session_with_fake();

    // two log-point stops, then the real breakpoint
    let mut first = StopState::new(StopReason::Breakpoint);
    first.log_messages = vec!["x=1".to_string()];
    first.should_resume = true;
    let mut second = StopState::new(StopReason::Breakpoint);
    second.log_messages = vec!["x=2".to_string()];
    second.should_resume = true;
    let mut terminal = StopState::new(StopReason::Breakpoint);
    terminal.hit_breakpoint_ids = vec![9];

    handle.push_stop(first);
    handle.push_stop(second);
    handle.push_stop(terminal);

    spawn_run(&session, RunAction::Continue, RunOptions::default()).unwrap();

    match wait_for_completion(&session) {
        RunCompletion::Stopped { stop, .. } => {
            assert_eq!(stop.log_messages, vec!["x=1".to_string(), "x=2".to_string()]);
            assert_eq!(stop.hit_breakpoint_ids, vec![9]);
        }
        other => panic!("expected a stop, got {other:?}"),
    }

    // exactly one promoted completion: the intermediate stops never surface
    assert!(promote(&session).is_none());
}

#[test]
fn abort_pending_unblocks_and_discards_the_result() {
    let (session, _handle) = session_with_fake();
    spawn_run(&session, RunAction::Continue, RunOptions::default()).unwrap();

    // no debuggee pid on the fake: abort falls back to driver terminate,
    // which wakes the blocked worker
    abort_pending(&session);

    assert!(!session.has_pending());
    assert!(promote(&session).is_none());
}
