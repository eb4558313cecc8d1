// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment variable configuration for the daemon.

use std::time::Duration;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Override for the runtime directory holding socket, pid, and log files.
pub fn runtime_dir() -> Option<String> {
    std::env::var("COG_RUNTIME_DIR").ok().filter(|s| !s.is_empty())
}

/// Timeout for one client request/response exchange.
pub fn timeout_ipc() -> Duration {
    parse_duration_ms("COG_TIMEOUT_IPC_MS").unwrap_or(Duration::from_secs(5))
}

/// Interval between orphan watchdog checks.
pub fn orphan_check_interval() -> Duration {
    parse_duration_ms("COG_ORPHAN_CHECK_MS").unwrap_or(Duration::from_secs(2))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
