// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands.
//!
//! One connection per tool call: write a JSON line, read the envelope,
//! close. Action commands autostart the daemon when the socket is silent.

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::time::Instant;

use cog_daemon::lifecycle::Config;
use thiserror::Error;

use crate::daemon_process::{
    cleanup_stale_socket, probe_socket, start_daemon_background, wrap_with_startup_error,
};

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("daemon not running")]
    DaemonNotRunning,

    #[error("failed to start daemon: {0}")]
    DaemonStartFailed(String),

    #[error("timed out waiting for daemon to start")]
    DaemonStartTimeout,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad response from daemon: {0}")]
    BadResponse(String),

    #[error("{message}")]
    Tool { code: i32, message: String },

    #[error("could not determine runtime directory")]
    NoRuntimeDir,
}

/// Daemon client bound to the per-user socket.
#[derive(Debug)]
pub struct DaemonClient {
    socket_path: PathBuf,
    config: Config,
}

impl DaemonClient {
    /// For action commands: autostart the daemon if the socket is silent.
    pub fn connect_or_start() -> Result<Self, ClientError> {
        let config = load_config()?;
        let client = Self {
            socket_path: config.socket_path.clone(),
            config,
        };

        if probe_socket(&client.socket_path) {
            return Ok(client);
        }

        cleanup_stale_socket(&client.config);
        start_daemon_background()?;

        // poll the socket until the daemon answers
        let deadline = Instant::now() + crate::env::timeout_connect();
        while Instant::now() < deadline {
            if probe_socket(&client.socket_path) {
                return Ok(client);
            }
            std::thread::sleep(crate::env::poll_interval());
        }

        Err(wrap_with_startup_error(
            &client.config,
            ClientError::DaemonStartTimeout,
        ))
    }

    /// For query commands: connect only, never start anything.
    pub fn connect_only() -> Result<Self, ClientError> {
        let config = load_config()?;
        if !probe_socket(&config.socket_path) {
            return Err(ClientError::DaemonNotRunning);
        }
        Ok(Self {
            socket_path: config.socket_path.clone(),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Invoke one tool and return its result value.
    pub fn call(&self, tool: &str, args: serde_json::Value) -> Result<serde_json::Value, ClientError> {
        let stream = UnixStream::connect(&self.socket_path)?;
        stream.set_read_timeout(Some(crate::env::timeout_ipc()))?;
        stream.set_write_timeout(Some(crate::env::timeout_ipc()))?;

        let request = serde_json::json!({ "tool": tool, "args": args });
        let mut writer = stream.try_clone()?;
        writeln!(writer, "{request}")?;
        writer.flush()?;

        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        reader.read_line(&mut line)?;
        if line.is_empty() {
            return Err(ClientError::BadResponse("connection closed".into()));
        }

        let envelope: serde_json::Value =
            serde_json::from_str(&line).map_err(|e| ClientError::BadResponse(e.to_string()))?;

        if envelope["ok"] == serde_json::json!(true) {
            Ok(envelope
                .get("result")
                .cloned()
                .unwrap_or(serde_json::Value::Null))
        } else {
            let error = &envelope["error"];
            Err(ClientError::Tool {
                code: error["code"].as_i64().unwrap_or(-32603) as i32,
                message: error["message"]
                    .as_str()
                    .unwrap_or("unknown error")
                    .to_string(),
            })
        }
    }
}

fn load_config() -> Result<Config, ClientError> {
    Config::load().map_err(|_| ClientError::NoRuntimeDir)
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
