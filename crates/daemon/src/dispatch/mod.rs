// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The tool dispatcher: the single `call_tool(name, args)` entry point.
//!
//! Each tool validates its arguments, looks up the session, enforces the
//! "session must be stopped" guard for inspection tools, invokes driver
//! operations, and serializes the outcome. Results are pre-serialized JSON
//! strings so raw notification payloads splice into the outer envelope
//! without re-parsing.

mod args;
mod breakpoints;
mod execution;
mod inspection;
mod introspection;
mod lifecycle;
mod lowlevel;
mod meta;

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use cog_core::{DriverResult, LaunchConfig, StopState};
use cog_drivers::{DapDriver, DebugDriver, NativeDriver};
use cog_engine::{Session, SessionManager, SessionStatus};
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::event_bus::DashboardSink;
use crate::protocol::ToolError;

/// Stack/locals rows included in dashboard stop events.
const DASHBOARD_STOP_DEPTH: usize = 5;

/// Recent stops retained per dispatcher instance.
const STOP_HISTORY_CAP: usize = 32;

/// Creates drivers for new sessions.
pub trait DriverFactory: Send + Sync {
    /// Build a driver for a launch config (native or adapter-backed).
    fn create(&self, config: &LaunchConfig, detach_on_stop: bool) -> DriverResult<CreatedDriver>;

    /// Build a driver for attaching to a pid in the given language.
    fn create_for_attach(
        &self,
        language: Option<&str>,
        detach_on_stop: bool,
    ) -> DriverResult<CreatedDriver>;
}

/// A driver plus the backend label surfaced in `sessions`.
pub struct CreatedDriver {
    pub driver: Box<dyn DebugDriver>,
    pub backend: String,
}

/// Production factory: the native engine for bare executables, the
/// adapter proxy for everything with a language or adapter override.
#[derive(Default)]
pub struct DefaultDriverFactory;

impl DriverFactory for DefaultDriverFactory {
    fn create(&self, config: &LaunchConfig, detach_on_stop: bool) -> DriverResult<CreatedDriver> {
        if cog_drivers::is_native(config) {
            Ok(CreatedDriver {
                driver: Box::new(NativeDriver::new()),
                backend: "native".to_string(),
            })
        } else {
            Ok(CreatedDriver {
                driver: Box::new(DapDriver::from_config(config, detach_on_stop)?),
                backend: "dap".to_string(),
            })
        }
    }

    fn create_for_attach(
        &self,
        language: Option<&str>,
        detach_on_stop: bool,
    ) -> DriverResult<CreatedDriver> {
        match language {
            None | Some("native") => Ok(CreatedDriver {
                driver: Box::new(NativeDriver::new()),
                backend: "native".to_string(),
            }),
            Some(language) => Ok(CreatedDriver {
                driver: Box::new(DapDriver::for_language(language, detach_on_stop)?),
                backend: "dap".to_string(),
            }),
        }
    }
}

/// One retained stop, for enriching dashboard events.
struct StopRecord {
    session_id: String,
    action: String,
    stop: StopState,
}

/// The dispatcher instance owned by the daemon. No process globals: the
/// registry, the dashboard sink, and the stop history all live here.
pub struct Dispatcher {
    manager: Arc<SessionManager>,
    factory: Box<dyn DriverFactory>,
    dashboard: DashboardSink,
    stop_history: Mutex<VecDeque<StopRecord>>,
}

impl Dispatcher {
    pub fn new(
        manager: Arc<SessionManager>,
        factory: Box<dyn DriverFactory>,
        dashboard_path: PathBuf,
    ) -> Self {
        Self {
            manager,
            factory,
            dashboard: DashboardSink::new(dashboard_path),
            stop_history: Mutex::new(VecDeque::new()),
        }
    }

    pub fn manager(&self) -> &Arc<SessionManager> {
        &self.manager
    }

    /// The single entry point: dispatch one tool call.
    ///
    /// Returns pre-serialized result JSON or a coded error.
    pub fn call_tool(&self, tool: &str, args: Value) -> Result<String, ToolError> {
        match tool {
            // lifecycle
            "launch" => lifecycle::launch(self, args),
            "attach" => lifecycle::attach(self, args),
            "load_core" => lifecycle::load_core(self, args),
            "sessions" => lifecycle::sessions(self),
            "stop" => lifecycle::stop(self, args),
            "terminate" => lifecycle::terminate(self, args),
            "detach" => lifecycle::detach(self, args),
            "restart" => lifecycle::restart(self, args),

            // breakpoints
            "breakpoint" => breakpoints::breakpoint(self, args),
            "breakpoint_locations" => breakpoints::breakpoint_locations(self, args),
            "data_breakpoint_info" => breakpoints::data_breakpoint_info(self, args),

            // execution
            "run" => execution::run(self, args),
            "goto" => execution::goto(self, args),
            "restart_frame" => execution::restart_frame(self, args),
            "poll_events" => execution::poll_events(self, args),

            // inspection
            "threads" => inspection::threads(self, args),
            "stack_trace" => inspection::stack_trace(self, args),
            "scopes" => inspection::scopes(self, args),
            "inspect" => inspection::inspect(self, args),
            "set_variable" => inspection::set_variable(self, args),
            "set_expression" => inspection::set_expression(self, args),
            "step_in_targets" => inspection::step_in_targets(self, args),
            "goto_targets" => inspection::goto_targets(self, args),
            "completions" => inspection::completions(self, args),
            "exception_info" => inspection::exception_info(self, args),
            "source" => inspection::source(self, args),

            // introspection
            "modules" => introspection::modules(self, args),
            "loaded_sources" => introspection::loaded_sources(self, args),
            "capabilities" => introspection::capabilities(self, args),
            "find_symbol" => introspection::find_symbol(self, args),
            "variable_location" => introspection::variable_location(self, args),
            "expand_macro" => introspection::expand_macro(self, args),

            // low-level
            "read_memory" => lowlevel::read_memory(self, args),
            "write_memory" => lowlevel::write_memory(self, args),
            "disassemble" => lowlevel::disassemble(self, args),
            "registers" => lowlevel::registers(self, args),
            "write_register" => lowlevel::write_register(self, args),

            // meta
            "cancel" => meta::cancel(self, args),
            "terminate_threads" => meta::terminate_threads(self, args),
            "raw_request" => meta::raw_request(self, args),
            "get_pid" => meta::get_pid(self, args),

            other => Err(ToolError::method_not_found(other)),
        }
    }

    /// Look up the session named by `args.session_id`.
    fn session(&self, args: &Value) -> Result<Arc<Session>, ToolError> {
        let id = args::require_str(args, "session_id")?;
        Ok(self.manager.lookup(id)?)
    }

    /// Look up the session and enforce the inspection guard: a running
    /// session is rejected without consulting the driver.
    fn stopped_session(&self, args: &Value) -> Result<Arc<Session>, ToolError> {
        let session = self.session(args)?;
        if session.status() == SessionStatus::Running {
            return Err(ToolError::session_running());
        }
        Ok(session)
    }

    /// Publish a dashboard event. Never fails.
    fn emit(&self, event: Value) {
        self.dashboard.emit(&event);
    }

    /// Session-end event for teardown paths outside tool handlers (the
    /// orphan watchdog).
    pub fn emit_session_end(&self, session_id: &str, reason: &str) {
        self.emit(json!({
            "event": "session_end",
            "session_id": session_id,
            "reason": reason,
        }));
    }

    /// The most recent recorded stop for a session, for listings.
    fn last_stop_summary(&self, session_id: &str) -> Option<Value> {
        let history = self.stop_history.lock();
        history
            .iter()
            .rev()
            .find(|r| r.session_id == session_id)
            .map(|r| {
                json!({
                    "action": r.action,
                    "reason": r.stop.reason.as_wire_str(),
                    "location": r.stop.location,
                })
            })
    }

    /// Record a published stop and emit the rich dashboard stop event.
    fn publish_stop(&self, session_id: &str, action: &str, stop: &StopState) {
        self.emit(json!({
            "event": "stop",
            "session_id": session_id,
            "action": action,
            "reason": stop.reason.as_wire_str(),
            "location": stop.location,
            "exit_code": stop.exit_code,
            "frames": stop.frames.iter().take(DASHBOARD_STOP_DEPTH).collect::<Vec<_>>(),
            "locals": stop.locals.iter().take(DASHBOARD_STOP_DEPTH).collect::<Vec<_>>(),
        }));

        let mut history = self.stop_history.lock();
        if history.len() == STOP_HISTORY_CAP {
            history.pop_front();
        }
        history.push_back(StopRecord {
            session_id: session_id.to_string(),
            action: action.to_string(),
            stop: stop.clone(),
        });
    }
}

/// Serialize a tool result struct.
fn to_result<T: serde::Serialize>(value: &T) -> Result<String, ToolError> {
    serde_json::to_string(value).map_err(|e| ToolError::internal(format!("encode result: {e}")))
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
