// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn no_marker_means_no_error() {
    assert_eq!(parse_startup_error("random log content"), None);
}

#[test]
fn errors_after_the_marker_are_extracted() {
    let log = "\
old content\n\
--- cogd: starting (pid: 100) ---\n\
\n\
2026-01-01T00:00:00Z ERROR Failed to start daemon: address in use\n";
    let parsed = parse_startup_error(log).unwrap();
    assert!(parsed.contains("address in use"), "{parsed}");
}

#[test]
fn only_the_latest_startup_attempt_is_scanned() {
    let log = "\
--- cogd: starting (pid: 100) ---\n\
ERROR Failed to start daemon: old failure\n\
--- cogd: starting (pid: 101) ---\n\
all good this time\n";
    assert_eq!(parse_startup_error(log), None);
}

#[test]
fn clean_startup_yields_none() {
    let log = "--- cogd: starting (pid: 42) ---\n\ndaemon ready\n";
    assert_eq!(parse_startup_error(log), None);
}

#[test]
fn probe_of_a_missing_socket_is_false() {
    let dir = tempfile::tempdir().unwrap();
    assert!(!probe_socket(&dir.path().join("nope.sock")));
}

#[test]
fn probe_of_a_bound_socket_is_true() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cogd.sock");
    let _listener = std::os::unix::net::UnixListener::bind(&path).unwrap();
    assert!(probe_socket(&path));
}

#[test]
fn current_process_exists() {
    assert!(process_exists(std::process::id()));
}
