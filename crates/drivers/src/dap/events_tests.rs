// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::dap::transport::DapEvent;
use cog_core::{Breakpoint, Capabilities, NotificationQueue};
use serde_json::json;

fn event(name: &str, body: serde_json::Value) -> DapEvent {
    DapEvent {
        seq: 1,
        event: name.to_string(),
        body: Some(body),
    }
}

#[test]
fn stopped_event_records_the_raw_stop_and_bumps_generation() {
    let shared = DapShared::new();
    let queue = NotificationQueue::new();

    handle_event(
        &shared,
        &queue,
        event(
            "stopped",
            json!({
                "reason": "breakpoint",
                "threadId": 3,
                "hitBreakpointIds": [1, 2],
            }),
        ),
    );

    let state = shared.state.lock();
    assert_eq!(state.stop_generation, 1);
    let stop = state.last_stop.as_ref().unwrap();
    assert_eq!(stop.reason, "breakpoint");
    assert_eq!(stop.thread_id, Some(3));
    assert_eq!(stop.hit_breakpoint_ids, vec![1, 2]);
}

#[test]
fn every_event_is_duplicated_into_the_notification_queue() {
    let shared = DapShared::new();
    let queue = NotificationQueue::new();

    handle_event(&shared, &queue, event("thread", json!({"reason": "started"})));
    handle_event(&shared, &queue, event("module", json!({"reason": "new"})));

    let drained = queue.drain();
    assert_eq!(drained.len(), 2);
    assert_eq!(drained[0].method, "thread");
    assert_eq!(drained[1].method, "module");
    let params: serde_json::Value = serde_json::from_str(drained[0].params.get()).unwrap();
    assert_eq!(params["reason"], "started");
}

#[test]
fn exited_then_terminated_records_the_code_and_wakes() {
    let shared = DapShared::new();
    let queue = NotificationQueue::new();

    handle_event(&shared, &queue, event("exited", json!({"exitCode": 3})));
    {
        let state = shared.state.lock();
        assert_eq!(state.exit_code, Some(3));
        assert_eq!(state.stop_generation, 0);
    }

    handle_event(&shared, &queue, event("terminated", json!({})));
    let state = shared.state.lock();
    assert!(state.terminated);
    assert_eq!(state.stop_generation, 1);
}

#[test]
fn output_accumulates_up_to_the_ring_cap() {
    let shared = DapShared::new();
    let queue = NotificationQueue::new();

    for i in 0..300 {
        handle_event(
            &shared,
            &queue,
            event("output", json!({"category": "stdout", "output": format!("line {i}\n")})),
        );
    }
    let state = shared.state.lock();
    assert_eq!(state.output.len(), 256);
    assert_eq!(state.output[0].output, "line 0\n");
}

#[test]
fn breakpoint_event_updates_verification_in_the_index() {
    let shared = DapShared::new();
    let queue = NotificationQueue::new();
    {
        let mut state = shared.state.lock();
        state
            .breakpoints
            .insert(7, Breakpoint::at_line(7, "main.c", 10));
    }

    handle_event(
        &shared,
        &queue,
        event(
            "breakpoint",
            json!({"reason": "changed", "breakpoint": {"id": 7, "verified": true, "line": 12}}),
        ),
    );

    let state = shared.state.lock();
    let bp = &state.breakpoints[&7];
    assert!(bp.verified);
    assert_eq!(bp.resolved_line, Some(12));
    assert_eq!(bp.effective_line(), 12);
}

#[test]
fn process_event_captures_the_debuggee_pid() {
    let shared = DapShared::new();
    let queue = NotificationQueue::new();

    handle_event(
        &shared,
        &queue,
        event("process", json!({"name": "a.out", "systemProcessId": 4242})),
    );
    assert_eq!(shared.state.lock().process_pid, Some(4242));
}

#[test]
fn capabilities_event_merges_flags() {
    let shared = DapShared::new();
    let queue = NotificationQueue::new();
    {
        let mut state = shared.state.lock();
        state.capabilities = Capabilities::from_flags(["supportsRestartRequest"]);
    }

    handle_event(
        &shared,
        &queue,
        event(
            "capabilities",
            json!({"capabilities": {"supportsStepBack": true}}),
        ),
    );

    let state = shared.state.lock();
    assert!(state.capabilities.supports("supportsRestartRequest"));
    assert!(state.capabilities.supports("supportsStepBack"));
}
