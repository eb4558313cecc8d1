// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted in-memory driver for tests.
//!
//! `run` blocks until the test pushes a stop through the [`FakeHandle`]
//! (or the debuggee is "killed"), which lets tests exercise the pending-run
//! slot, the poll promotion path, and cancellation without a real debuggee.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use cog_core::{
    Breakpoint, Capabilities, DriverError, DriverResult, InspectRequest, InspectResult,
    LaunchConfig, Notification, NotificationQueue, Register, RunAction, RunOptions, Scope,
    SourceLocation, StackFrame, StopReason, StopState, ThreadInfo, Variable,
};
use parking_lot::{Condvar, Mutex};

use crate::driver::DebugDriver;

#[derive(Default)]
struct FakeState {
    killed: bool,
    queued_stops: VecDeque<StopState>,
    breakpoints: BTreeMap<i64, Breakpoint>,
    next_bp_id: i64,
    vars: HashMap<String, String>,
    calls: Vec<String>,
    pid: Option<u32>,
}

struct FakeInner {
    state: Mutex<FakeState>,
    run_cond: Condvar,
    notifications: NotificationQueue,
}

/// The driver half. Hand the boxed driver to a session; keep the
/// [`FakeHandle`] to script it.
pub struct FakeDriver(Arc<FakeInner>);

/// Test-side controls for a [`FakeDriver`].
#[derive(Clone)]
pub struct FakeHandle(Arc<FakeInner>);

impl FakeDriver {
    pub fn new() -> (Self, FakeHandle) {
        let inner = Arc::new(FakeInner {
            state: Mutex::new(FakeState {
                next_bp_id: 1,
                ..FakeState::default()
            }),
            run_cond: Condvar::new(),
            notifications: NotificationQueue::new(),
        });
        (Self(Arc::clone(&inner)), FakeHandle(inner))
    }

    fn record(&self, call: impl Into<String>) {
        self.0.state.lock().calls.push(call.into());
    }

    fn entry_stop(&self) -> StopState {
        let mut stop = StopState::new(StopReason::Entry);
        stop.thread_id = Some(1);
        stop.frames = vec![StackFrame {
            id: 1,
            name: "main".into(),
            source: Some(SourceLocation::new("main.c", 1)),
        }];
        stop.location = stop.frames[0].source.clone();
        stop
    }
}

impl FakeHandle {
    /// Queue the stop the next blocking `run` returns.
    pub fn push_stop(&self, stop: StopState) {
        self.0.state.lock().queued_stops.push_back(stop);
        self.0.run_cond.notify_all();
    }

    /// Simulate the debuggee dying under a blocked `run`.
    pub fn kill(&self) {
        self.0.state.lock().killed = true;
        self.0.run_cond.notify_all();
    }

    pub fn set_pid(&self, pid: u32) {
        self.0.state.lock().pid = Some(pid);
    }

    /// Operations invoked so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.0.state.lock().calls.clone()
    }

    /// Push a raw notification into the driver's queue.
    pub fn push_notification(&self, method: &str, body: &serde_json::Value) {
        if let Ok(n) = Notification::from_value(method, body) {
            self.0.notifications.push(n);
        }
    }
}

impl DebugDriver for FakeDriver {
    fn launch(&self, config: &LaunchConfig) -> DriverResult<StopState> {
        self.record(format!("launch {}", config.program));
        Ok(self.entry_stop())
    }

    fn attach(&self, pid: u32) -> DriverResult<StopState> {
        self.record(format!("attach {pid}"));
        self.0.state.lock().pid = Some(pid);
        Ok(self.entry_stop())
    }

    fn stop(&self) -> DriverResult<()> {
        self.record("stop");
        let mut state = self.0.state.lock();
        state.killed = true;
        self.0.run_cond.notify_all();
        Ok(())
    }

    fn terminate(&self) -> DriverResult<()> {
        self.record("terminate");
        let mut state = self.0.state.lock();
        state.killed = true;
        self.0.run_cond.notify_all();
        Ok(())
    }

    fn detach(&self) -> DriverResult<()> {
        self.record("detach");
        let mut state = self.0.state.lock();
        state.killed = true;
        self.0.run_cond.notify_all();
        Ok(())
    }

    fn restart(&self) -> DriverResult<StopState> {
        self.record("restart");
        Ok(self.entry_stop())
    }

    fn set_line_breakpoint(
        &self,
        file: &str,
        line: u32,
        condition: Option<&str>,
        hit_condition: Option<&str>,
        log_message: Option<&str>,
    ) -> DriverResult<Vec<Breakpoint>> {
        self.record(format!("set_breakpoint {file}:{line}"));
        let mut state = self.0.state.lock();
        let id = state.next_bp_id;
        state.next_bp_id += 1;
        let mut record = Breakpoint::at_line(id, file, line);
        record.verified = true;
        record.condition = condition.map(str::to_string);
        record.hit_condition = hit_condition.map(str::to_string);
        record.log_message = log_message.map(str::to_string);
        state.breakpoints.insert(id, record.clone());
        Ok(vec![record])
    }

    fn remove_breakpoint(&self, id: i64) -> DriverResult<()> {
        self.record(format!("remove_breakpoint {id}"));
        let mut state = self.0.state.lock();
        state
            .breakpoints
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DriverError::InvalidArgs(format!("no breakpoint with id {id}")))
    }

    fn list_breakpoints(&self) -> DriverResult<Vec<Breakpoint>> {
        Ok(self.0.state.lock().breakpoints.values().cloned().collect())
    }

    fn run(&self, action: RunAction, _options: &RunOptions) -> DriverResult<StopState> {
        self.record(format!("run {action}"));

        if action == RunAction::Pause {
            let mut stop = StopState::new(StopReason::Pause);
            stop.thread_id = Some(1);
            return Ok(stop);
        }

        let mut state = self.0.state.lock();
        loop {
            if let Some(stop) = state.queued_stops.pop_front() {
                return Ok(stop);
            }
            if state.killed {
                return Err(DriverError::Gone("debuggee killed".into()));
            }
            self.0.run_cond.wait(&mut state);
        }
    }

    fn goto(&self, file: &str, line: u32) -> DriverResult<StopState> {
        self.record(format!("goto {file}:{line}"));
        let mut stop = StopState::new(StopReason::Goto);
        stop.thread_id = Some(1);
        stop.location = Some(SourceLocation::new(file, line));
        Ok(stop)
    }

    fn threads(&self) -> DriverResult<Vec<ThreadInfo>> {
        Ok(vec![ThreadInfo {
            id: 1,
            name: "main".into(),
        }])
    }

    fn stack_trace(
        &self,
        _thread_id: i64,
        _start_frame: u32,
        _count: u32,
    ) -> DriverResult<Vec<StackFrame>> {
        Ok(vec![StackFrame {
            id: 1,
            name: "main".into(),
            source: Some(SourceLocation::new("main.c", 1)),
        }])
    }

    fn scopes(&self, _frame_id: i64) -> DriverResult<Vec<Scope>> {
        Ok(vec![Scope {
            name: "Locals".into(),
            variables_reference: 1,
            expensive: false,
        }])
    }

    fn inspect(&self, request: &InspectRequest) -> DriverResult<InspectResult> {
        let expr = request.expression.clone().unwrap_or_default();
        self.record(format!("inspect {expr}"));
        let state = self.0.state.lock();
        let value = state
            .vars
            .get(&expr)
            .cloned()
            .unwrap_or_else(|| format!("<{expr}>"));
        Ok(InspectResult {
            value,
            ty: None,
            variables_reference: 0,
            children: Vec::new(),
        })
    }

    fn set_variable(
        &self,
        name: &str,
        value: &str,
        _frame_id: Option<i64>,
    ) -> DriverResult<Variable> {
        self.record(format!("set_variable {name}={value}"));
        self.0
            .state
            .lock()
            .vars
            .insert(name.to_string(), value.to_string());
        Ok(Variable {
            name: name.to_string(),
            value: value.to_string(),
            ty: None,
            variables_reference: 0,
        })
    }

    fn read_registers(&self, _thread_id: i64) -> DriverResult<Vec<Register>> {
        Ok(vec![
            Register {
                name: "pc".into(),
                value: "0x401000".into(),
            },
            Register {
                name: "sp".into(),
                value: "0x7ffdeadbeef0".into(),
            },
        ])
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::from_flags([
            "supportsConfigurationDoneRequest",
            "supportsConditionalBreakpoints",
            "supportsLogPoints",
            "supportsSetVariable",
            "supportsRegisters",
        ])
    }

    fn raw_request(
        &self,
        command: &str,
        arguments: serde_json::Value,
    ) -> DriverResult<serde_json::Value> {
        self.record(format!("raw {command}"));
        Ok(serde_json::json!({ "echo": command, "arguments": arguments }))
    }

    fn notifications(&self) -> NotificationQueue {
        self.0.notifications.clone()
    }

    fn debuggee_pid(&self) -> Option<u32> {
        self.0.state.lock().pid
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
