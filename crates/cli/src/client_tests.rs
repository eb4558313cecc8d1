// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixListener;

/// Serve one canned envelope on the daemon socket path.
///
/// Probe connections (connect-then-close, no payload) are skipped so the
/// client's liveness check does not consume the response.
fn serve_one(config: &Config, envelope: &'static str) -> std::thread::JoinHandle<String> {
    let listener = UnixListener::bind(&config.socket_path).unwrap();
    std::thread::spawn(move || loop {
        let (stream, _) = listener.accept().unwrap();
        let Ok(read_half) = stream.try_clone() else {
            continue;
        };
        let mut reader = BufReader::new(read_half);
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap_or(0) == 0 {
            continue;
        }

        let mut writer = stream;
        writeln!(writer, "{envelope}").unwrap();
        return line;
    })
}

fn with_runtime_dir<F: FnOnce(&Config)>(f: F) {
    let dir = tempfile::tempdir().unwrap();
    std::env::set_var("COG_RUNTIME_DIR", dir.path());
    let config = Config::load().unwrap();
    f(&config);
    std::env::remove_var("COG_RUNTIME_DIR");
}

#[test]
#[serial]
fn call_sends_one_line_and_parses_the_result() {
    with_runtime_dir(|config| {
        let server = serve_one(config, r#"{"ok":true,"result":{"sessions":[]}}"#);

        let client = DaemonClient::connect_only().unwrap();
        let result = client.call("sessions", serde_json::json!({})).unwrap();
        assert!(result["sessions"].as_array().unwrap().is_empty());

        let request_line = server.join().unwrap();
        let request: serde_json::Value = serde_json::from_str(&request_line).unwrap();
        assert_eq!(request["tool"], "sessions");
        assert!(request["args"].is_object());
    });
}

#[test]
#[serial]
fn tool_errors_carry_code_and_message() {
    with_runtime_dir(|config| {
        let _server = serve_one(
            config,
            r#"{"ok":false,"error":{"code":-32001,"message":"registers not available for DAP sessions"}}"#,
        );

        let client = DaemonClient::connect_only().unwrap();
        let err = client
            .call("registers", serde_json::json!({ "session_id": "s1" }))
            .unwrap_err();
        match err {
            ClientError::Tool { code, message } => {
                assert_eq!(code, -32001);
                assert!(message.contains("DAP sessions"));
            }
            other => panic!("expected tool error, got {other}"),
        }
    });
}

#[test]
#[serial]
fn connect_only_fails_without_a_daemon() {
    with_runtime_dir(|_config| {
        let err = DaemonClient::connect_only().unwrap_err();
        assert!(matches!(err, ClientError::DaemonNotRunning));
    });
}
