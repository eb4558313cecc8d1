// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment variable configuration for the CLI.

use std::time::Duration;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Explicit daemon binary override.
pub fn daemon_binary() -> Option<String> {
    std::env::var("COG_DAEMON_BINARY").ok().filter(|s| !s.is_empty())
}

/// Timeout for one request/response exchange.
pub fn timeout_ipc() -> Duration {
    parse_duration_ms("COG_TIMEOUT_IPC_MS").unwrap_or(Duration::from_secs(5))
}

/// How long to wait for an autostarted daemon's socket.
pub fn timeout_connect() -> Duration {
    parse_duration_ms("COG_TIMEOUT_CONNECT_MS").unwrap_or(Duration::from_secs(2))
}

/// Polling interval while waiting for the socket.
pub fn poll_interval() -> Duration {
    parse_duration_ms("COG_CONNECT_POLL_MS").unwrap_or(Duration::from_millis(50))
}
