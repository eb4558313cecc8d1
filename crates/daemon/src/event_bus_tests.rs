// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use std::io::{BufRead, BufReader};
use std::os::unix::net::UnixListener;

#[test]
fn emit_without_an_observer_is_silently_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let sink = DashboardSink::new(dir.path().join("dashboard.sock"));
    // no listener bound: nothing to assert beyond "does not fail"
    sink.emit(&json!({ "event": "launch", "session_id": "s1" }));
    sink.emit(&json!({ "event": "stop" }));
}

#[test]
fn events_arrive_as_newline_delimited_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dashboard.sock");
    let listener = UnixListener::bind(&path).unwrap();

    let sink = DashboardSink::new(path);
    sink.emit(&json!({ "event": "launch", "session_id": "s1" }));
    sink.emit(&json!({ "event": "stop", "session_id": "s1", "reason": "breakpoint" }));

    let (stream, _) = listener.accept().unwrap();
    let mut reader = BufReader::new(stream);

    let mut line = String::new();
    reader.read_line(&mut line).unwrap();
    let event: serde_json::Value = serde_json::from_str(&line).unwrap();
    assert_eq!(event["event"], "launch");

    line.clear();
    reader.read_line(&mut line).unwrap();
    let event: serde_json::Value = serde_json::from_str(&line).unwrap();
    assert_eq!(event["reason"], "breakpoint");
}

#[test]
fn dead_observer_is_detected_and_the_socket_recycled() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dashboard.sock");
    let listener = UnixListener::bind(&path).unwrap();

    let sink = DashboardSink::new(path);
    sink.emit(&json!({ "event": "launch" }));

    // observer reads one event and hangs up
    let (stream, _) = listener.accept().unwrap();
    drop(stream);
    drop(listener);

    // both sends are swallowed; the second hits the HUP probe
    sink.emit(&json!({ "event": "run" }));
    sink.emit(&json!({ "event": "stop" }));
}

#[test]
fn reconnects_are_backed_off() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dashboard.sock");

    // first emit records a failed attempt
    let sink = DashboardSink::new(path.clone());
    sink.emit(&json!({ "event": "launch" }));

    // an observer shows up, but the backoff window is still open:
    // this event is dropped, not delivered
    let listener = UnixListener::bind(&path).unwrap();
    listener.set_nonblocking(true).unwrap();
    sink.emit(&json!({ "event": "run" }));
    assert!(listener.accept().is_err(), "no connection inside the backoff");
}
