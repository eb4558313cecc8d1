// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon process management utilities.
//!
//! Starting, probing, and cleaning up after the cogd daemon process.

use std::path::{Path, PathBuf};
use std::process::Command;

use cog_daemon::lifecycle::Config;

use crate::client::ClientError;

/// Start the daemon in the background, returning the child process handle.
pub fn start_daemon_background() -> Result<std::process::Child, ClientError> {
    let cogd_path = find_cogd_binary();

    Command::new(&cogd_path)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map_err(|e| ClientError::DaemonStartFailed(format!("{}: {e}", cogd_path.display())))
}

/// Find the cogd binary: explicit override, then a sibling of the current
/// executable, then PATH.
fn find_cogd_binary() -> PathBuf {
    if let Some(path) = crate::env::daemon_binary() {
        return PathBuf::from(path);
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("cogd");
            if sibling.exists() {
                return sibling;
            }
        }
    }

    PathBuf::from("cogd")
}

/// Probe whether a Unix socket is accepting connections.
pub fn probe_socket(socket_path: &Path) -> bool {
    std::os::unix::net::UnixStream::connect(socket_path).is_ok()
}

/// Get the PID from the daemon pid file, if it exists.
pub fn read_daemon_pid(config: &Config) -> Option<u32> {
    std::fs::read_to_string(&config.pid_path)
        .ok()
        .and_then(|content| content.trim().parse::<u32>().ok())
}

/// Check if a process with the given PID exists.
pub fn process_exists(pid: u32) -> bool {
    Command::new("kill")
        .args(["-0", &pid.to_string()])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Ask the daemon to exit via SIGTERM.
pub fn signal_daemon_stop(pid: u32) -> bool {
    Command::new("kill")
        .args(["-15", &pid.to_string()])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Remove stale socket and pid files when the daemon is not running.
///
/// Called when the socket file exists but nothing answers on it.
pub fn cleanup_stale_socket(config: &Config) {
    match read_daemon_pid(config) {
        Some(pid) if process_exists(pid) => {}
        _ => {
            let _ = std::fs::remove_file(&config.socket_path);
            let _ = std::fs::remove_file(&config.pid_path);
        }
    }
}

/// Startup marker prefix the daemon writes to its log before anything
/// else. Used to scope error scanning to the current startup attempt.
const STARTUP_MARKER_PREFIX: &str = "--- cogd: starting (pid: ";

/// Read the daemon log from the last startup marker, looking for errors.
pub fn read_startup_error(config: &Config) -> Option<String> {
    let content = std::fs::read_to_string(&config.log_path).ok()?;
    parse_startup_error(&content)
}

/// Parse startup errors from log content (pure logic, no I/O).
fn parse_startup_error(content: &str) -> Option<String> {
    let start_pos = content.rfind(STARTUP_MARKER_PREFIX)?;
    let startup_log = &content[start_pos..];

    let errors: Vec<&str> = startup_log
        .lines()
        .filter(|line| line.contains(" ERROR ") || line.contains("Failed to start"))
        .collect();

    if errors.is_empty() {
        return None;
    }

    let messages: Vec<String> = errors
        .iter()
        .filter_map(|line| line.split_once(": ").map(|(_, msg)| msg.to_string()))
        .collect();

    if messages.is_empty() {
        Some(errors.join("\n"))
    } else {
        Some(messages.join("\n"))
    }
}

/// Wrap a connect failure with startup log info if available.
pub fn wrap_with_startup_error(config: &Config, err: ClientError) -> ClientError {
    if matches!(err, ClientError::DaemonStartFailed(_)) {
        return err;
    }
    if let Some(startup_error) = read_startup_error(config) {
        ClientError::DaemonStartFailed(startup_error)
    } else {
        err
    }
}

#[cfg(test)]
#[path = "daemon_process_tests.rs"]
mod tests;
