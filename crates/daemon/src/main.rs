// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! cog debugging daemon (cogd)
//!
//! Background process owning every debug session for one user. Clients
//! connect over the per-user Unix socket, one tool call per connection;
//! an optional dashboard observer receives a fire-and-forget event
//! stream on the sibling socket.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::sync::Arc;

use cog_daemon::dispatch::{DefaultDriverFactory, Dispatcher};
use cog_daemon::lifecycle::{self, Config, LifecycleError};
use cog_daemon::listener::Listener;
use cog_engine::SessionManager;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle info flags before any config/lock acquisition
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("cogd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("cogd {}", env!("CARGO_PKG_VERSION"));
                println!("cog debugging daemon - owns debug sessions and serves the tool socket");
                println!();
                println!("USAGE:");
                println!("    cogd");
                println!();
                println!("The daemon is typically started by the `cog` CLI and should not");
                println!("be invoked directly. It listens on a per-user Unix socket for");
                println!("tool calls from `cog` and other clients.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: cogd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;

    rotate_log_if_needed(&config.log_path);
    write_startup_marker(&config)?;
    let _log_guard = setup_logging(&config)?;

    info!("starting cog debugging daemon");

    let startup = match lifecycle::startup(&config) {
        Ok(r) => r,
        Err(LifecycleError::LockFailed(_)) => {
            let pid = std::fs::read_to_string(&config.pid_path)
                .unwrap_or_default()
                .trim()
                .to_string();
            eprintln!("cogd is already running");
            if !pid.is_empty() {
                eprintln!("  pid: {pid}");
            }
            std::process::exit(1);
        }
        Err(e) => {
            write_startup_error(&config, &e);
            error!("failed to start daemon: {e}");
            return Err(e.into());
        }
    };

    let manager = Arc::new(SessionManager::new());
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&manager),
        Box::new(DefaultDriverFactory),
        config.dashboard_path.clone(),
    ));

    // Listener task: accepts connections, one tool call each
    let listener = Listener::new(startup.listener, Arc::clone(&dispatcher));
    tokio::spawn(listener.run());

    // Orphan watchdog: reap sessions whose client process died
    spawn_orphan_watchdog(Arc::clone(&dispatcher));

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(socket = %config.socket_path.display(), "daemon ready");

    // Signal ready for the autostarting client
    println!("READY");

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }

    // Graceful shutdown: tear down every session, then the files
    let shutdown_manager = Arc::clone(&manager);
    let _ = tokio::task::spawn_blocking(move || shutdown_manager.shutdown()).await;
    lifecycle::cleanup(&config);
    info!("daemon stopped");
    Ok(())
}

/// Periodically probe recorded client pids and apply orphan policies.
fn spawn_orphan_watchdog(dispatcher: Arc<Dispatcher>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cog_daemon::env::orphan_check_interval());
        loop {
            interval.tick().await;
            let manager = Arc::clone(dispatcher.manager());
            let reaped = tokio::task::spawn_blocking(move || manager.reap_orphans()).await;
            if let Ok(reaped) = reaped {
                for session in reaped {
                    info!(
                        session_id = %session.session_id,
                        client_pid = session.client_pid,
                        policy = ?session.policy,
                        "reaped orphaned session"
                    );
                    dispatcher.emit_session_end(session.session_id.as_str(), "orphaned");
                }
            }
        }
    });
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep.
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the daemon log file if it exceeds [`MAX_LOG_SIZE`].
///
/// Shifts `.log` -> `.log.1` -> `.log.2` -> `.log.3`, deleting the
/// oldest. Best-effort: rotation failures do not block startup.
fn rotate_log_if_needed(log_path: &std::path::Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };
    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();
    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }
    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

/// Startup marker prefix written to the log before anything else.
/// The CLI uses this to find where the current startup attempt begins.
const STARTUP_MARKER_PREFIX: &str = "--- cogd: starting (pid: ";

fn write_startup_marker(config: &Config) -> Result<(), LifecycleError> {
    use std::io::Write;

    std::fs::create_dir_all(&config.runtime_dir)?;
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    writeln!(file, "{}{}) ---\n", STARTUP_MARKER_PREFIX, std::process::id())?;
    Ok(())
}

/// Write a startup error synchronously so the CLI can surface it even if
/// the process exits before the async appender flushes.
fn write_startup_error(config: &Config, error: &LifecycleError) {
    use std::io::Write;

    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
    else {
        return;
    };
    let _ = writeln!(file, "ERROR Failed to start daemon: {error}");
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let file_appender = tracing_appender::rolling::never(
        config
            .log_path
            .parent()
            .ok_or(LifecycleError::NoRuntimeDir)?,
        config
            .log_path
            .file_name()
            .ok_or(LifecycleError::NoRuntimeDir)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_env("COG_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
