// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: paths, single-instance lock, socket bind.

use std::fs::File;
use std::io::Write as _;
use std::path::PathBuf;

use fs2::FileExt as _;
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::info;

/// Daemon configuration: the per-user runtime paths.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding socket, pid, log, and dashboard files.
    pub runtime_dir: PathBuf,
    /// Path to the Unix socket clients connect to.
    pub socket_path: PathBuf,
    /// Path to the pid/lock file.
    pub pid_path: PathBuf,
    /// Path to the version file.
    pub version_path: PathBuf,
    /// Path to the daemon log file.
    pub log_path: PathBuf,
    /// Path of the optional dashboard observer socket.
    pub dashboard_path: PathBuf,
}

/// Errors during startup/shutdown.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("another daemon holds the lock")]
    LockFailed(std::io::Error),

    #[error("no usable runtime directory")]
    NoRuntimeDir,
}

impl Config {
    /// Compute per-user paths: `$COG_RUNTIME_DIR`, else `$XDG_RUNTIME_DIR`,
    /// else `/tmp`, with every file named `cog-debug-<uid>`.
    pub fn load() -> Result<Self, LifecycleError> {
        let runtime_dir = runtime_dir()?;
        let uid = nix::unistd::getuid().as_raw();
        let base = format!("cog-debug-{uid}");

        Ok(Self {
            socket_path: runtime_dir.join(format!("{base}.sock")),
            pid_path: runtime_dir.join(format!("{base}.pid")),
            version_path: runtime_dir.join(format!("{base}.version")),
            log_path: runtime_dir.join(format!("{base}.log")),
            dashboard_path: runtime_dir.join(format!("{base}-dashboard.sock")),
            runtime_dir,
        })
    }
}

fn runtime_dir() -> Result<PathBuf, LifecycleError> {
    if let Some(dir) = crate::env::runtime_dir() {
        let path = PathBuf::from(dir);
        std::fs::create_dir_all(&path)?;
        restrict_dir_permissions(&path);
        return Ok(path);
    }
    if let Ok(dir) = std::env::var("XDG_RUNTIME_DIR") {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    Ok(PathBuf::from("/tmp"))
}

/// Daemon state held for the process lifetime.
#[derive(Debug)]
pub struct StartupResult {
    /// The bound client socket, ready for the listener.
    pub listener: UnixListener,
    // NOTE(lifetime): held to maintain the exclusive pid-file lock;
    // released on drop
    #[allow(dead_code)]
    lock_file: File,
}

/// Acquire the single-instance lock, write the pid file, bind the socket.
pub fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    std::fs::create_dir_all(&config.runtime_dir)?;
    restrict_dir_permissions(&config.runtime_dir);

    let mut lock_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(&config.pid_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    lock_file.flush()?;

    std::fs::write(&config.version_path, env!("CARGO_PKG_VERSION"))?;

    // the lock proves no live daemon owns the socket, so a leftover file
    // is stale
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = {
        let std_listener = std::os::unix::net::UnixListener::bind(&config.socket_path)?;
        std_listener.set_nonblocking(true)?;
        UnixListener::from_std(std_listener)?
    };

    restrict_permissions(&config.socket_path);
    info!(socket = %config.socket_path.display(), "daemon socket bound");

    Ok(StartupResult {
        listener,
        lock_file,
    })
}

/// Remove socket and pid files on graceful shutdown.
pub fn cleanup(config: &Config) {
    let _ = std::fs::remove_file(&config.socket_path);
    let _ = std::fs::remove_file(&config.pid_path);
}

fn restrict_permissions(path: &std::path::Path) {
    use std::os::unix::fs::PermissionsExt;
    let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
}

/// Owner-only runtime directory, so the pid/log/dashboard files next to
/// the socket are not listable by other users. The shared `/tmp`
/// fallback must never be chmod'd; per-user directories are.
fn restrict_dir_permissions(path: &std::path::Path) {
    use std::os::unix::fs::PermissionsExt;
    if path == std::path::Path::new("/tmp") {
        return;
    }
    let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700));
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
