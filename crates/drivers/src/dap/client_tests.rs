// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::dap::transport::{read_frame, DapResponse};
use cog_core::DriverError;
use std::io::BufReader;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

/// Spawn `cat` so written frames can be read back from its stdout.
fn cat_client(deadline: Duration) -> (Child, DapClient, BufReader<std::process::ChildStdout>) {
    let mut child = Command::new("cat")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    let stdin = child.stdin.take().unwrap();
    let stdout = BufReader::new(child.stdout.take().unwrap());
    (child, DapClient::new(stdin, deadline), stdout)
}

#[test]
fn sequence_numbers_start_at_one_and_increase() {
    let (mut child, client, mut echo) = cat_client(Duration::from_secs(1));

    let (seq1, _e1) = client.send_request("initialize", None).unwrap();
    let (seq2, _e2) = client.send_request("threads", None).unwrap();
    assert_eq!(seq1, 1);
    assert_eq!(seq2, 2);

    // the frames really went over the pipe
    let frame = read_frame(&mut echo).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&frame).unwrap();
    assert_eq!(value["seq"], 1);
    assert_eq!(value["command"], "initialize");

    let _ = child.kill();
    let _ = child.wait();
}

#[test]
fn response_completes_the_matching_entry() {
    let (mut child, client, _echo) = cat_client(Duration::from_secs(5));

    let (seq, entry) = client.send_request("continue", None).unwrap();
    client.complete(DapResponse {
        seq: 100,
        request_seq: seq,
        success: true,
        command: "continue".into(),
        message: None,
        body: Some(serde_json::json!({ "allThreadsContinued": true })),
    });

    let response = client.wait(seq, &entry).unwrap();
    assert_eq!(response.request_seq, seq);
    assert!(response.success);

    let _ = child.kill();
    let _ = child.wait();
}

#[test]
fn failed_response_surfaces_the_message() {
    let (mut child, client, _echo) = cat_client(Duration::from_secs(5));

    let (seq, entry) = client.send_request("evaluate", None).unwrap();
    client.complete(DapResponse {
        seq: 1,
        request_seq: seq,
        success: false,
        command: "evaluate".into(),
        message: Some("name 'x' is not defined".into()),
        body: None,
    });

    let err = client.wait(seq, &entry).unwrap_err();
    assert!(err.to_string().contains("not defined"), "{err}");

    let _ = child.kill();
    let _ = child.wait();
}

#[test]
fn wait_times_out_and_later_response_is_discarded() {
    let (mut child, client, _echo) = cat_client(Duration::from_millis(50));

    let (seq, entry) = client.send_request("threads", None).unwrap();
    let err = client.wait(seq, &entry).unwrap_err();
    assert!(matches!(err, DriverError::Timeout(_)));

    // arrives too late: no pending entry, silently dropped
    client.complete(DapResponse {
        seq: 1,
        request_seq: seq,
        success: true,
        command: "threads".into(),
        message: None,
        body: None,
    });

    let _ = child.kill();
    let _ = child.wait();
}

#[test]
fn fail_all_retires_pending_entries_with_gone() {
    let (mut child, client, _echo) = cat_client(Duration::from_secs(5));

    let (seq, entry) = client.send_request("continue", None).unwrap();
    client.fail_all();

    let err = client.wait(seq, &entry).unwrap_err();
    assert!(err.is_gone(), "expected Gone, got {err}");

    // the client refuses new work once dead
    let err = client.send_request("threads", None).unwrap_err();
    assert!(err.is_gone());

    let _ = child.kill();
    let _ = child.wait();
}

#[test]
fn abort_cancels_a_specific_request() {
    let (mut child, client, _echo) = cat_client(Duration::from_secs(5));

    let (seq, entry) = client.send_request("evaluate", None).unwrap();
    client.abort(seq);
    let err = client.wait(seq, &entry).unwrap_err();
    assert!(err.to_string().contains("cancelled"), "{err}");

    let _ = child.kill();
    let _ = child.wait();
}
