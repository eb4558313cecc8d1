// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The in-process native engine.
//!
//! A /proc-based process supervisor for targets with no debug adapter:
//! launch-and-hold via SIGSTOP, continue as wait-for-next-transition,
//! memory through `/proc/<pid>/mem`, threads from `/proc/<pid>/task`,
//! modules from `/proc/<pid>/maps`, and the pc/sp register pair from
//! `/proc/<pid>/syscall`. Source-level breakpoints and stepping need
//! DWARF support and report NotSupported; the capability set says so.

use std::os::unix::fs::FileExt;
use std::process::{Command, Stdio};
use std::time::Duration;

use cog_core::{
    Capabilities, DriverError, DriverResult, LaunchConfig, MemoryChunk, Module, Notification,
    NotificationQueue, Register, RunAction, RunOptions, StopReason, StopState, ThreadInfo,
};
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use parking_lot::Mutex;
use serde_json::json;
use tracing::{debug, info};

/// Poll cadence when supervising a process that is not our child.
const ATTACHED_POLL: Duration = Duration::from_millis(200);

#[derive(Default)]
struct NativeState {
    pid: Option<u32>,
    /// True when the debuggee is our own child (waitpid works).
    is_child: bool,
    exited: bool,
    config: Option<LaunchConfig>,
}

/// Driver implementation supervising a bare OS process.
pub struct NativeDriver {
    state: Mutex<NativeState>,
    notifications: NotificationQueue,
    capabilities: Capabilities,
}

impl Default for NativeDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeDriver {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(NativeState::default()),
            notifications: NotificationQueue::new(),
            capabilities: Capabilities::from_flags([
                "supportsTerminateRequest",
                "supportsRestartRequest",
                "supportsReadMemoryRequest",
                "supportsWriteMemoryRequest",
                "supportsModulesRequest",
                "supportsRegisters",
            ]),
        }
    }

    fn pid(&self) -> DriverResult<u32> {
        let state = self.state.lock();
        if state.exited {
            return Err(DriverError::Gone("debuggee has exited".into()));
        }
        state
            .pid
            .ok_or_else(|| DriverError::Gone("no debuggee".into()))
    }

    fn signal(&self, pid: u32, signal: Signal) -> DriverResult<()> {
        match kill(Pid::from_raw(pid as i32), Some(signal)) {
            Ok(()) => Ok(()),
            Err(Errno::ESRCH) => Err(DriverError::Gone(format!("process {pid} is gone"))),
            Err(e) => Err(DriverError::Denied(format!("signal {signal} to {pid}: {e}"))),
        }
    }

    /// Block until the debuggee stops or exits.
    ///
    /// For our own children this rides `waitpid(WUNTRACED)`, so a SIGSTOP
    /// from `pause` wakes a blocked continue. For attached processes the
    /// only observable transition is death, detected by liveness polling.
    fn wait_for_transition(&self, pid: u32, is_child: bool) -> DriverResult<StopState> {
        if is_child {
            loop {
                match waitpid(Pid::from_raw(pid as i32), Some(WaitPidFlag::WUNTRACED)) {
                    Ok(WaitStatus::Exited(_, code)) => {
                        self.mark_exited(code);
                        return Ok(StopState::exited(code));
                    }
                    Ok(WaitStatus::Signaled(_, signal, _)) => {
                        let code = 128 + signal as i32;
                        self.mark_exited(code);
                        return Ok(StopState::exited(code));
                    }
                    Ok(WaitStatus::Stopped(_, _)) => {
                        let mut stop = StopState::new(StopReason::Pause);
                        stop.thread_id = Some(pid as i64);
                        return Ok(stop);
                    }
                    Ok(_) => continue,
                    Err(Errno::EINTR) => continue,
                    Err(e) => return Err(DriverError::Gone(format!("waitpid({pid}): {e}"))),
                }
            }
        } else {
            loop {
                match kill(Pid::from_raw(pid as i32), None) {
                    Ok(()) => std::thread::sleep(ATTACHED_POLL),
                    Err(_) => {
                        self.mark_exited(0);
                        return Ok(StopState::exited(0));
                    }
                }
            }
        }
    }

    fn mark_exited(&self, code: i32) {
        let mut state = self.state.lock();
        state.exited = true;
        if let Ok(n) = Notification::from_value("exited", &json!({ "exitCode": code })) {
            self.notifications.push(n);
        }
    }

    fn entry_stop(&self, pid: u32) -> StopState {
        let mut stop = StopState::new(StopReason::Entry);
        stop.thread_id = Some(pid as i64);
        stop
    }

    fn proc_path(&self, pid: u32, leaf: &str) -> std::path::PathBuf {
        std::path::PathBuf::from(format!("/proc/{pid}/{leaf}"))
    }
}

impl crate::driver::DebugDriver for NativeDriver {
    fn launch(&self, config: &LaunchConfig) -> DriverResult<StopState> {
        let mut command = Command::new(&config.program);
        command
            .args(&config.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if let Some(cwd) = &config.cwd {
            command.current_dir(cwd);
        }
        for (key, value) in &config.env {
            command.env(key, value);
        }

        let child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DriverError::InvalidArgs(format!("program not found: {}", config.program))
            } else {
                DriverError::Io(e)
            }
        })?;
        let pid = child.id();
        // hold at entry; the child is reaped through waitpid, never Child::wait
        drop(child);
        self.signal(pid, Signal::SIGSTOP)?;

        info!(pid, program = %config.program, "launched native debuggee");
        {
            let mut state = self.state.lock();
            state.pid = Some(pid);
            state.is_child = true;
            state.exited = false;
            state.config = Some(config.clone());
        }
        if let Ok(n) = Notification::from_value(
            "process",
            &json!({ "name": config.program, "systemProcessId": pid }),
        ) {
            self.notifications.push(n);
        }

        Ok(self.entry_stop(pid))
    }

    fn attach(&self, pid: u32) -> DriverResult<StopState> {
        self.signal(pid, Signal::SIGSTOP)?;
        info!(pid, "attached to native process");
        {
            let mut state = self.state.lock();
            state.pid = Some(pid);
            state.is_child = false;
            state.exited = false;
            state.config = None;
        }
        Ok(self.entry_stop(pid))
    }

    fn stop(&self) -> DriverResult<()> {
        let (pid, is_child) = {
            let state = self.state.lock();
            match state.pid {
                Some(pid) if !state.exited => (pid, state.is_child),
                _ => return Ok(()),
            }
        };
        let _ = self.signal(pid, Signal::SIGKILL);
        if is_child {
            // reap so no zombie outlives the session
            let _ = waitpid(Pid::from_raw(pid as i32), None);
        }
        self.state.lock().exited = true;
        debug!(pid, "native debuggee stopped");
        Ok(())
    }

    fn detach(&self) -> DriverResult<()> {
        let pid = match self.state.lock().pid {
            Some(pid) => pid,
            None => return Ok(()),
        };
        // let it keep running
        let _ = self.signal(pid, Signal::SIGCONT);
        let mut state = self.state.lock();
        state.pid = None;
        state.exited = true;
        Ok(())
    }

    fn restart(&self) -> DriverResult<StopState> {
        let config = self
            .state
            .lock()
            .config
            .clone()
            .ok_or_else(|| DriverError::NotSupported("restart requires a launched session".into()))?;
        self.stop()?;
        self.launch(&config)
    }

    fn run(&self, action: RunAction, _options: &RunOptions) -> DriverResult<StopState> {
        let pid = self.pid()?;
        let is_child = self.state.lock().is_child;

        match action {
            RunAction::Continue => {
                self.signal(pid, Signal::SIGCONT)?;
                self.wait_for_transition(pid, is_child)
            }
            RunAction::Pause => {
                self.signal(pid, Signal::SIGSTOP)?;
                let mut stop = StopState::new(StopReason::Pause);
                stop.thread_id = Some(pid as i64);
                Ok(stop)
            }
            other => Err(DriverError::NotSupported(format!(
                "native engine cannot {other} without DWARF support"
            ))),
        }
    }

    fn threads(&self) -> DriverResult<Vec<ThreadInfo>> {
        let pid = self.pid()?;
        let mut threads = Vec::new();
        for entry in std::fs::read_dir(self.proc_path(pid, "task"))? {
            let entry = entry?;
            let Ok(tid) = entry.file_name().to_string_lossy().parse::<i64>() else {
                continue;
            };
            let name = std::fs::read_to_string(entry.path().join("comm"))
                .map(|s| s.trim().to_string())
                .unwrap_or_default();
            threads.push(ThreadInfo { id: tid, name });
        }
        threads.sort_by_key(|t| t.id);
        Ok(threads)
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities.clone()
    }

    fn modules(&self) -> DriverResult<Vec<Module>> {
        let pid = self.pid()?;
        let maps = std::fs::read_to_string(self.proc_path(pid, "maps"))?;
        let mut seen = std::collections::BTreeSet::new();
        for line in maps.lines() {
            if let Some(path) = line.split_whitespace().nth(5) {
                if path.starts_with('/') {
                    seen.insert(path.to_string());
                }
            }
        }
        Ok(seen
            .into_iter()
            .map(|path| Module {
                id: path.clone(),
                name: path.rsplit('/').next().unwrap_or(&path).to_string(),
                path: Some(path),
            })
            .collect())
    }

    fn read_memory(&self, address: u64, size: usize) -> DriverResult<MemoryChunk> {
        let pid = self.pid()?;
        let file = std::fs::File::open(self.proc_path(pid, "mem"))?;
        let mut buf = vec![0u8; size];
        let mut read = 0usize;
        while read < size {
            match file.read_at(&mut buf[read..], address + read as u64) {
                Ok(0) => break,
                Ok(n) => read += n,
                Err(e) if read > 0 => {
                    debug!(error = %e, read, "partial memory read");
                    break;
                }
                Err(e) => return Err(DriverError::Io(e)),
            }
        }
        let mut chunk = MemoryChunk::new(address, &buf[..read]);
        if read < size {
            chunk.unreadable_bytes = Some((size - read) as u64);
        }
        Ok(chunk)
    }

    fn write_memory(&self, address: u64, data: &[u8]) -> DriverResult<usize> {
        let pid = self.pid()?;
        let file = std::fs::OpenOptions::new()
            .write(true)
            .open(self.proc_path(pid, "mem"))?;
        file.write_at(data, address).map_err(DriverError::Io)
    }

    fn read_registers(&self, thread_id: i64) -> DriverResult<Vec<Register>> {
        let pid = self.pid()?;
        let tid = if thread_id > 0 { thread_id as u32 } else { pid };
        let path = format!("/proc/{pid}/task/{tid}/syscall");
        let content = std::fs::read_to_string(path)?;
        let tokens: Vec<&str> = content.split_whitespace().collect();

        if tokens.first() == Some(&"running") {
            return Err(DriverError::Denied("thread is running".into()));
        }
        if tokens.len() < 3 {
            return Err(DriverError::Protocol(format!(
                "unexpected /proc syscall format: {content}"
            )));
        }

        let mut registers = Vec::new();
        if let Some(nr) = tokens.first() {
            if *nr != "-1" {
                registers.push(Register {
                    name: "syscall".to_string(),
                    value: (*nr).to_string(),
                });
            }
        }
        registers.push(Register {
            name: "sp".to_string(),
            value: tokens[tokens.len() - 2].to_string(),
        });
        registers.push(Register {
            name: "pc".to_string(),
            value: tokens[tokens.len() - 1].to_string(),
        });
        Ok(registers)
    }

    fn notifications(&self) -> NotificationQueue {
        self.notifications.clone()
    }

    fn debuggee_pid(&self) -> Option<u32> {
        let state = self.state.lock();
        if state.exited {
            None
        } else {
            state.pid
        }
    }
}

#[cfg(test)]
#[path = "native_tests.rs"]
mod tests;
