// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The adapter proxy driver.
//!
//! Supervises an external debug adapter subprocess, speaks the framed JSON
//! protocol over its stdio, and translates the adapter's event stream into
//! driver semantics. One reader thread per subprocess; writes are small and
//! serialized by a mutex on the child's stdin.

mod client;
mod events;
mod transport;

use std::io::BufReader;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use cog_core::{
    Breakpoint, Capabilities, CompletionItem, DataBreakpointInfo, DriverError, DriverResult,
    ExceptionDetails, GotoTarget, InspectRequest, InspectResult, Instruction, LaunchConfig,
    LoadedSource, MemoryChunk, Module, NotificationQueue, Register, RunAction, RunOptions, Scope,
    SourceLocation, StackFrame, StepInTarget, StopReason, StopState, ThreadInfo, Variable,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::catalog::{self, AdapterCommand};
use crate::driver::DebugDriver;
use crate::logpoint;
use client::DapClient;
use events::{DapShared, FunctionBreakpointRequest, SourceBreakpointRequest};
use transport::IncomingMessage;

pub(crate) use client::DEFAULT_REQUEST_TIMEOUT;

/// How long `stop` waits for the adapter to exit before killing it.
const REAP_GRACE: Duration = Duration::from_millis(500);

/// The driver-wide request deadline, overridable for slow adapters.
fn request_timeout() -> Duration {
    std::env::var("COG_ADAPTER_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT)
}

/// How long attach waits for a spontaneous entry stop before pausing.
const ATTACH_STOP_WAIT: Duration = Duration::from_secs(2);

/// Stack depth fetched when materializing a stop.
const STOP_FRAME_COUNT: u32 = 20;

/// Locals fetched when materializing a stop.
const STOP_LOCALS_CAP: usize = 32;

/// One live adapter subprocess.
struct Conn {
    client: Arc<DapClient>,
    shared: Arc<DapShared>,
    child: Mutex<Child>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

/// Driver implementation backed by an out-of-process debug adapter.
pub struct DapDriver {
    adapter: AdapterCommand,
    detach_on_stop: bool,
    deadline: Duration,
    notifications: NotificationQueue,
    conn: Mutex<Option<Arc<Conn>>>,
    next_bp_id: AtomicI64,
}

impl DapDriver {
    /// Build a proxy for the adapter serving `config`'s language.
    ///
    /// `detach_on_stop` records the session's orphan policy: when set,
    /// `stop` disconnects without terminating the debuggee.
    pub fn from_config(config: &LaunchConfig, detach_on_stop: bool) -> DriverResult<Self> {
        let adapter = catalog::resolve(config)?;
        Ok(Self::new(adapter, detach_on_stop))
    }

    /// Build a proxy for attaching in a given language.
    pub fn for_language(language: &str, detach_on_stop: bool) -> DriverResult<Self> {
        let adapter = catalog::resolve_language(language)?;
        Ok(Self::new(adapter, detach_on_stop))
    }

    pub fn new(adapter: AdapterCommand, detach_on_stop: bool) -> Self {
        Self {
            adapter,
            detach_on_stop,
            deadline: request_timeout(),
            notifications: NotificationQueue::new(),
            conn: Mutex::new(None),
            // fallback ids sit far above anything adapters hand out
            next_bp_id: AtomicI64::new(10_000),
        }
    }

    fn conn(&self) -> DriverResult<Arc<Conn>> {
        self.conn
            .lock()
            .clone()
            .ok_or_else(|| DriverError::Gone("no adapter session".into()))
    }

    /// Spawn the adapter subprocess and start its reader thread.
    fn spawn_conn(&self) -> DriverResult<Arc<Conn>> {
        info!(command = %self.adapter.command, "spawning debug adapter");

        let mut child = Command::new(&self.adapter.command)
            .args(&self.adapter.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| catalog::spawn_error(&self.adapter, &e))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| DriverError::Protocol("adapter stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DriverError::Protocol("adapter stdout unavailable".into()))?;

        let client = Arc::new(DapClient::new(stdin, self.deadline));
        let shared = Arc::new(DapShared::new());

        let reader = spawn_reader(
            stdout,
            Arc::clone(&client),
            Arc::clone(&shared),
            self.notifications.clone(),
        );

        let conn = Arc::new(Conn {
            client,
            shared,
            child: Mutex::new(child),
            reader: Mutex::new(Some(reader)),
        });
        *self.conn.lock() = Some(Arc::clone(&conn));
        Ok(conn)
    }

    /// Exchange `initialize` and store the adapter's capability reply
    /// verbatim.
    fn initialize(&self, conn: &Conn) -> DriverResult<()> {
        let args = json!({
            "clientID": "cog",
            "clientName": "cog-debug",
            "adapterID": self.adapter.command,
            "locale": "en-US",
            "linesStartAt1": true,
            "columnsStartAt1": true,
            "pathFormat": "path",
            "supportsVariableType": true,
            "supportsRunInTerminalRequest": false,
            "supportsMemoryReferences": true,
            "supportsProgressReporting": false,
            "supportsInvalidatedEvent": false,
            "supportsMemoryEvent": true,
            "supportsStartDebuggingRequest": false,
        });
        let reply = conn.client.request("initialize", Some(args))?;
        let caps = Capabilities::from_reply(&reply);
        conn.shared.state.lock().capabilities = caps;
        Ok(())
    }

    /// Wait for the `initialized` event, flush configuration, and send
    /// `configurationDone`.
    fn finish_configuration(&self, conn: &Conn) -> DriverResult<()> {
        let deadline = std::time::Instant::now() + self.deadline;
        {
            let mut state = conn.shared.state.lock();
            while !state.initialized {
                if state.terminated {
                    return Err(DriverError::Gone("adapter exited during handshake".into()));
                }
                let timeout = deadline.saturating_duration_since(std::time::Instant::now());
                if timeout.is_zero() {
                    return Err(DriverError::Timeout(
                        "adapter never sent initialized".into(),
                    ));
                }
                conn.shared.stop_cond.wait_for(&mut state, timeout);
            }
        }

        // default exception filters; not every adapter accepts the request
        let _ = conn
            .client
            .request("setExceptionBreakpoints", Some(json!({ "filters": [] })));
        conn.client.request("configurationDone", Some(json!({})))?;
        Ok(())
    }

    fn stop_generation(&self, conn: &Conn) -> u64 {
        conn.shared.state.lock().stop_generation
    }

    /// Block until the stop generation moves past `min_gen` (a stop or
    /// termination). `timeout` of None waits indefinitely; cancellation
    /// arrives as a generation bump from the reader's death.
    fn wait_for_stop(&self, conn: &Conn, min_gen: u64, timeout: Option<Duration>) -> DriverResult<()> {
        let deadline = timeout.map(|t| std::time::Instant::now() + t);
        let mut state = conn.shared.state.lock();
        loop {
            if state.stop_generation > min_gen {
                return Ok(());
            }
            match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(std::time::Instant::now());
                    if remaining.is_zero() {
                        return Err(DriverError::Timeout("debuggee did not stop".into()));
                    }
                    conn.shared.stop_cond.wait_for(&mut state, remaining);
                }
                None => conn.shared.stop_cond.wait(&mut state),
            }
        }
    }

    /// Build the publishable stop state for the most recent stop.
    ///
    /// The stop body is materialized here, by follow-up requests, not on
    /// each event: stack first, then scopes and locals of the top frame.
    fn materialize_stop(&self, conn: &Conn) -> DriverResult<StopState> {
        let (raw, output, exit_code, terminated, log_templates) = {
            let mut state = conn.shared.state.lock();
            (
                state.last_stop.clone(),
                std::mem::take(&mut state.output),
                state.exit_code,
                state.terminated,
                state.log_templates.clone(),
            )
        };

        if terminated || exit_code.is_some() {
            let mut stop = StopState::exited(exit_code.unwrap_or(-1));
            stop.output = output;
            return Ok(stop);
        }

        let raw = raw.ok_or_else(|| DriverError::Protocol("woke without a stop event".into()))?;
        let thread_id = raw.thread_id.unwrap_or(1);

        let mut stop = StopState::new(map_stop_reason(&raw.reason));
        stop.thread_id = Some(thread_id);
        stop.hit_breakpoint_ids = raw.hit_breakpoint_ids.clone();
        stop.output = output;

        if stop.reason == StopReason::Exception {
            stop.exception = Some(ExceptionDetails {
                exception_id: raw.text.clone().unwrap_or_else(|| "exception".to_string()),
                description: raw.description.clone(),
                break_mode: None,
            });
        }

        // best effort: a stop without a readable stack still publishes
        if let Ok(frames) = self.fetch_stack(conn, thread_id, 0, STOP_FRAME_COUNT) {
            stop.location = frames.first().and_then(|f| f.source.clone());
            if let Some(top) = frames.first() {
                if let Ok(locals) = self.fetch_locals(conn, top.id) {
                    stop.locals = locals;
                }
            }
            stop.frames = frames;
        }

        self.apply_log_points(conn, &mut stop, &log_templates);
        Ok(stop)
    }

    /// Evaluate log-point templates for the hit breakpoints and flag the
    /// stop for transparent resume when every hit was a log-point.
    fn apply_log_points(
        &self,
        conn: &Conn,
        stop: &mut StopState,
        templates: &std::collections::HashMap<i64, String>,
    ) {
        if stop.reason != StopReason::Breakpoint || stop.hit_breakpoint_ids.is_empty() {
            return;
        }
        let all_log_points = stop
            .hit_breakpoint_ids
            .iter()
            .all(|id| templates.contains_key(id));
        if !all_log_points {
            return;
        }

        let frame_id = stop.frames.first().map(|f| f.id);
        for id in &stop.hit_breakpoint_ids {
            if let Some(template) = templates.get(id) {
                let rendered = logpoint::render_template(template, |expr| {
                    self.evaluate_to_string(conn, expr, frame_id)
                });
                stop.log_messages.push(rendered);
            }
        }
        stop.should_resume = true;
    }

    fn evaluate_to_string(&self, conn: &Conn, expr: &str, frame_id: Option<i64>) -> Option<String> {
        let mut args = json!({ "expression": expr, "context": "watch" });
        if let Some(frame) = frame_id {
            args["frameId"] = json!(frame);
        }
        let body = conn.client.request("evaluate", Some(args)).ok()?;
        events::str_field(&body, "result")
    }

    fn fetch_stack(
        &self,
        conn: &Conn,
        thread_id: i64,
        start: u32,
        count: u32,
    ) -> DriverResult<Vec<StackFrame>> {
        let body = conn.client.request(
            "stackTrace",
            Some(json!({
                "threadId": thread_id,
                "startFrame": start,
                "levels": count,
            })),
        )?;
        let frames = body
            .get("stackFrames")
            .and_then(Value::as_array)
            .map(|frames| frames.iter().map(map_frame).collect())
            .unwrap_or_default();
        Ok(frames)
    }

    fn fetch_locals(&self, conn: &Conn, frame_id: i64) -> DriverResult<Vec<Variable>> {
        let scopes = self.fetch_scopes(conn, frame_id)?;
        let Some(scope) = scopes.iter().find(|s| !s.expensive).or(scopes.first()) else {
            return Ok(Vec::new());
        };
        let mut locals = self.fetch_variables(conn, scope.variables_reference)?;
        locals.truncate(STOP_LOCALS_CAP);
        Ok(locals)
    }

    fn fetch_scopes(&self, conn: &Conn, frame_id: i64) -> DriverResult<Vec<Scope>> {
        let body = conn
            .client
            .request("scopes", Some(json!({ "frameId": frame_id })))?;
        let scopes = body
            .get("scopes")
            .and_then(Value::as_array)
            .map(|scopes| {
                scopes
                    .iter()
                    .map(|s| Scope {
                        name: events::str_field(s, "name").unwrap_or_default(),
                        variables_reference: s
                            .get("variablesReference")
                            .and_then(Value::as_i64)
                            .unwrap_or(0),
                        expensive: s.get("expensive").and_then(Value::as_bool).unwrap_or(false),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(scopes)
    }

    fn fetch_variables(&self, conn: &Conn, reference: i64) -> DriverResult<Vec<Variable>> {
        let body = conn
            .client
            .request("variables", Some(json!({ "variablesReference": reference })))?;
        let vars = body
            .get("variables")
            .and_then(Value::as_array)
            .map(|vars| vars.iter().map(map_variable).collect())
            .unwrap_or_default();
        Ok(vars)
    }

    /// Resolve the variables container for `set_variable`: the first
    /// non-expensive scope of the given frame, defaulting to the top frame
    /// of the current stop.
    fn resolve_locals_container(&self, conn: &Conn, frame_id: Option<i64>) -> DriverResult<i64> {
        let frame_id = match frame_id {
            Some(id) => id,
            None => {
                let thread_id = conn
                    .shared
                    .state
                    .lock()
                    .last_stop
                    .as_ref()
                    .and_then(|s| s.thread_id)
                    .unwrap_or(1);
                let frames = self.fetch_stack(conn, thread_id, 0, 1)?;
                frames
                    .first()
                    .map(|f| f.id)
                    .ok_or_else(|| DriverError::Protocol("no stack frame available".into()))?
            }
        };
        let scopes = self.fetch_scopes(conn, frame_id)?;
        scopes
            .iter()
            .find(|s| !s.expensive)
            .or(scopes.first())
            .map(|s| s.variables_reference)
            .ok_or_else(|| DriverError::Protocol("frame has no scopes".into()))
    }

    /// Re-send the full breakpoint list for one file and rebuild its
    /// records from the adapter's reply.
    fn sync_source_breakpoints(&self, conn: &Conn, file: &str) -> DriverResult<Vec<Breakpoint>> {
        let requests: Vec<SourceBreakpointRequest> = conn
            .shared
            .state
            .lock()
            .source_requests
            .get(file)
            .cloned()
            .unwrap_or_default();

        let wire: Vec<Value> = requests
            .iter()
            .map(|r| {
                let mut bp = json!({ "line": r.line });
                if let Some(c) = &r.condition {
                    bp["condition"] = json!(c);
                }
                if let Some(h) = &r.hit_condition {
                    bp["hitCondition"] = json!(h);
                }
                if let Some(l) = &r.log_message {
                    bp["logMessage"] = json!(l);
                }
                bp
            })
            .collect();

        let body = conn.client.request(
            "setBreakpoints",
            Some(json!({
                "source": { "path": file },
                "breakpoints": wire,
            })),
        )?;

        let replies = body
            .get("breakpoints")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut records = Vec::with_capacity(requests.len());
        let mut state = conn.shared.state.lock();

        // drop records previously registered for this file
        let stale: Vec<i64> = state
            .breakpoints
            .iter()
            .filter(|(_, bp)| bp.file == file)
            .map(|(id, _)| *id)
            .collect();
        for id in stale {
            state.breakpoints.remove(&id);
            state.log_templates.remove(&id);
        }

        let mut synced = Vec::with_capacity(requests.len());
        for (i, request) in requests.into_iter().enumerate() {
            let reply = replies.get(i);
            let id = reply
                .and_then(|r| r.get("id"))
                .and_then(Value::as_i64)
                .unwrap_or_else(|| self.next_bp_id.fetch_add(1, Ordering::Relaxed));
            let verified = reply
                .and_then(|r| r.get("verified"))
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let resolved_line = reply
                .and_then(|r| r.get("line"))
                .and_then(Value::as_u64)
                .map(|l| l as u32)
                .filter(|l| *l != request.line);

            let record = Breakpoint {
                id,
                verified,
                file: file.to_string(),
                line: request.line,
                resolved_line,
                name: None,
                condition: request.condition.clone(),
                hit_condition: request.hit_condition.clone(),
                log_message: request.log_message.clone(),
            };
            if record.is_log_point() {
                if let Some(template) = &request.log_message {
                    state.log_templates.insert(id, template.clone());
                }
            }
            state.breakpoints.insert(id, record.clone());
            records.push(record);
            synced.push(SourceBreakpointRequest { id, ..request });
        }
        state.source_requests.insert(file.to_string(), synced);

        Ok(records)
    }

    /// Re-send the full function breakpoint list.
    fn sync_function_breakpoints(&self, conn: &Conn) -> DriverResult<Vec<Breakpoint>> {
        let requests: Vec<FunctionBreakpointRequest> =
            conn.shared.state.lock().function_requests.clone();

        let wire: Vec<Value> = requests
            .iter()
            .map(|r| {
                let mut bp = json!({ "name": r.name });
                if let Some(c) = &r.condition {
                    bp["condition"] = json!(c);
                }
                bp
            })
            .collect();

        let body = conn.client.request(
            "setFunctionBreakpoints",
            Some(json!({ "breakpoints": wire })),
        )?;
        let replies = body
            .get("breakpoints")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut state = conn.shared.state.lock();
        let stale: Vec<i64> = state
            .breakpoints
            .iter()
            .filter(|(_, bp)| bp.name.is_some())
            .map(|(id, _)| *id)
            .collect();
        for id in stale {
            state.breakpoints.remove(&id);
        }

        let mut records = Vec::with_capacity(requests.len());
        let mut synced = Vec::with_capacity(requests.len());
        for (i, request) in requests.into_iter().enumerate() {
            let reply = replies.get(i);
            let id = reply
                .and_then(|r| r.get("id"))
                .and_then(Value::as_i64)
                .unwrap_or_else(|| self.next_bp_id.fetch_add(1, Ordering::Relaxed));
            let verified = reply
                .and_then(|r| r.get("verified"))
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let record = Breakpoint {
                id,
                verified,
                file: String::new(),
                line: 0,
                resolved_line: None,
                name: Some(request.name.clone()),
                condition: request.condition.clone(),
                hit_condition: None,
                log_message: None,
            };
            state.breakpoints.insert(id, record.clone());
            records.push(record);
            synced.push(FunctionBreakpointRequest { id, ..request });
        }
        state.function_requests = synced;

        Ok(records)
    }

    /// Tear the subprocess down: retire pending requests, wake stop
    /// waiters, reap the child, join the reader.
    fn teardown(&self, conn: Arc<Conn>) {
        conn.client.fail_all();
        {
            let mut state = conn.shared.state.lock();
            state.terminated = true;
            conn.shared.bump_generation(&mut state);
        }

        {
            let mut child = conn.child.lock();
            let deadline = std::time::Instant::now() + REAP_GRACE;
            loop {
                match child.try_wait() {
                    Ok(Some(_)) => break,
                    Ok(None) if std::time::Instant::now() < deadline => {
                        std::thread::sleep(Duration::from_millis(25));
                    }
                    Ok(None) => {
                        let _ = child.kill();
                        let _ = child.wait();
                        break;
                    }
                    Err(_) => break,
                }
            }
        }

        if let Some(reader) = conn.reader.lock().take() {
            let _ = reader.join();
        }
    }

    fn take_conn(&self) -> Option<Arc<Conn>> {
        self.conn.lock().take()
    }

    /// Send a disconnect-style request and tear down.
    fn shutdown_with(&self, command: &str, arguments: Value) -> DriverResult<()> {
        let Some(conn) = self.take_conn() else {
            return Ok(());
        };
        if conn.client.is_alive() {
            if let Err(e) = conn.client.request(command, Some(arguments)) {
                debug!(command, error = %e, "shutdown request failed");
            }
        }
        self.teardown(conn);
        Ok(())
    }
}

impl DebugDriver for DapDriver {
    fn launch(&self, config: &LaunchConfig) -> DriverResult<StopState> {
        let conn = self.spawn_conn()?;
        self.initialize(&conn)?;

        let mut args = json!({
            "program": config.program,
            "args": config.args,
            "stopOnEntry": true,
            "noDebug": false,
        });
        if let Some(cwd) = &config.cwd {
            args["cwd"] = json!(cwd);
        }
        if !config.env.is_empty() {
            args["env"] = json!(config.env);
        }

        // the adapter defers the launch response until configuration is
        // done, so block on it only after finishing that phase
        let (launch_seq, launch_entry) = conn.client.send_request("launch", Some(&args))?;
        self.finish_configuration(&conn)?;
        conn.client.wait(launch_seq, &launch_entry)?;

        self.wait_for_stop(&conn, 0, Some(self.deadline))?;
        self.materialize_stop(&conn)
    }

    fn attach(&self, pid: u32) -> DriverResult<StopState> {
        let conn = self.spawn_conn()?;
        self.initialize(&conn)?;

        let args = json!({ "processId": pid });
        let (attach_seq, attach_entry) = conn.client.send_request("attach", Some(&args))?;
        self.finish_configuration(&conn)?;
        conn.client.wait(attach_seq, &attach_entry)?;
        conn.shared.state.lock().process_pid = Some(pid);

        // some adapters stop on attach; pause explicitly when they don't
        let gen = self.stop_generation(&conn);
        if gen == 0 && self.wait_for_stop(&conn, 0, Some(ATTACH_STOP_WAIT)).is_err() {
            let threads = self.threads()?;
            let thread_id = threads.first().map(|t| t.id).unwrap_or(1);
            conn.client
                .request("pause", Some(json!({ "threadId": thread_id })))?;
            self.wait_for_stop(&conn, 0, Some(self.deadline))?;
        }
        self.materialize_stop(&conn)
    }

    fn stop(&self) -> DriverResult<()> {
        self.shutdown_with(
            "disconnect",
            json!({ "terminateDebuggee": !self.detach_on_stop }),
        )
    }

    fn terminate(&self) -> DriverResult<()> {
        let Some(conn) = self.take_conn() else {
            return Ok(());
        };
        if conn.client.is_alive() {
            if let Err(e) = conn.client.request("terminate", Some(json!({}))) {
                debug!(error = %e, "terminate request failed");
            }
        }
        self.teardown(conn);
        Ok(())
    }

    fn detach(&self) -> DriverResult<()> {
        self.shutdown_with("disconnect", json!({ "terminateDebuggee": false }))
    }

    fn restart(&self) -> DriverResult<StopState> {
        let conn = self.conn()?;
        if !conn
            .shared
            .state
            .lock()
            .capabilities
            .supports("supportsRestartRequest")
        {
            return Err(DriverError::NotSupported(
                "adapter does not support restart".into(),
            ));
        }
        let gen = self.stop_generation(&conn);
        conn.client.request("restart", Some(json!({})))?;
        self.wait_for_stop(&conn, gen, Some(self.deadline))?;
        self.materialize_stop(&conn)
    }

    fn set_line_breakpoint(
        &self,
        file: &str,
        line: u32,
        condition: Option<&str>,
        hit_condition: Option<&str>,
        log_message: Option<&str>,
    ) -> DriverResult<Vec<Breakpoint>> {
        let conn = self.conn()?;
        {
            let mut state = conn.shared.state.lock();
            state
                .source_requests
                .entry(file.to_string())
                .or_default()
                .push(SourceBreakpointRequest {
                    id: 0,
                    line,
                    condition: condition.map(str::to_string),
                    hit_condition: hit_condition.map(str::to_string),
                    log_message: log_message.map(str::to_string),
                });
        }
        self.sync_source_breakpoints(&conn, file)
    }

    fn set_function_breakpoint(
        &self,
        name: &str,
        condition: Option<&str>,
    ) -> DriverResult<Vec<Breakpoint>> {
        let conn = self.conn()?;
        conn.shared
            .state
            .lock()
            .function_requests
            .push(FunctionBreakpointRequest {
                id: 0,
                name: name.to_string(),
                condition: condition.map(str::to_string),
            });
        self.sync_function_breakpoints(&conn)
    }

    fn set_exception_breakpoints(&self, filters: &[String]) -> DriverResult<Vec<Breakpoint>> {
        let conn = self.conn()?;
        let body = conn.client.request(
            "setExceptionBreakpoints",
            Some(json!({ "filters": filters })),
        )?;
        let records = body
            .get("breakpoints")
            .and_then(Value::as_array)
            .map(|bps| {
                bps.iter()
                    .map(|bp| Breakpoint {
                        id: bp
                            .get("id")
                            .and_then(Value::as_i64)
                            .unwrap_or_else(|| self.next_bp_id.fetch_add(1, Ordering::Relaxed)),
                        verified: bp
                            .get("verified")
                            .and_then(Value::as_bool)
                            .unwrap_or(true),
                        file: String::new(),
                        line: 0,
                        resolved_line: None,
                        name: None,
                        condition: None,
                        hit_condition: None,
                        log_message: None,
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(records)
    }

    fn set_instruction_breakpoints(&self, references: &[String]) -> DriverResult<Vec<Breakpoint>> {
        let conn = self.conn()?;
        let wire: Vec<Value> = references
            .iter()
            .map(|r| json!({ "instructionReference": r }))
            .collect();
        let body = conn.client.request(
            "setInstructionBreakpoints",
            Some(json!({ "breakpoints": wire })),
        )?;
        Ok(map_breakpoint_replies(&body, &mut || {
            self.next_bp_id.fetch_add(1, Ordering::Relaxed)
        }))
    }

    fn set_data_breakpoint(&self, data_id: &str, access_type: &str) -> DriverResult<Vec<Breakpoint>> {
        let conn = self.conn()?;
        let body = conn.client.request(
            "setDataBreakpoints",
            Some(json!({
                "breakpoints": [{ "dataId": data_id, "accessType": access_type }],
            })),
        )?;
        Ok(map_breakpoint_replies(&body, &mut || {
            self.next_bp_id.fetch_add(1, Ordering::Relaxed)
        }))
    }

    fn remove_breakpoint(&self, id: i64) -> DriverResult<()> {
        let conn = self.conn()?;
        let target = {
            let mut state = conn.shared.state.lock();
            let Some(record) = state.breakpoints.get(&id).cloned() else {
                return Err(DriverError::InvalidArgs(format!("no breakpoint with id {id}")));
            };
            state.log_templates.remove(&id);
            if record.name.is_some() {
                state.function_requests.retain(|r| r.id != id);
            } else {
                if let Some(requests) = state.source_requests.get_mut(&record.file) {
                    requests.retain(|r| r.id != id);
                }
            }
            record
        };

        if target.name.is_some() {
            self.sync_function_breakpoints(&conn)?;
        } else {
            self.sync_source_breakpoints(&conn, &target.file)?;
        }
        Ok(())
    }

    fn list_breakpoints(&self) -> DriverResult<Vec<Breakpoint>> {
        let conn = self.conn()?;
        let state = conn.shared.state.lock();
        Ok(state.breakpoints.values().cloned().collect())
    }

    fn data_breakpoint_info(
        &self,
        name: &str,
        frame_id: Option<i64>,
    ) -> DriverResult<DataBreakpointInfo> {
        let conn = self.conn()?;
        let mut args = json!({ "name": name });
        if let Some(frame) = frame_id {
            args["frameId"] = json!(frame);
        }
        let body = conn.client.request("dataBreakpointInfo", Some(args))?;
        Ok(DataBreakpointInfo {
            data_id: events::str_field(&body, "dataId"),
            description: events::str_field(&body, "description").unwrap_or_default(),
            access_types: body
                .get("accessTypes")
                .and_then(Value::as_array)
                .map(|types| {
                    types
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    fn breakpoint_locations(
        &self,
        file: &str,
        line: u32,
        end_line: Option<u32>,
    ) -> DriverResult<Vec<u32>> {
        let conn = self.conn()?;
        let mut args = json!({ "source": { "path": file }, "line": line });
        if let Some(end) = end_line {
            args["endLine"] = json!(end);
        }
        let body = conn.client.request("breakpointLocations", Some(args))?;
        let lines = body
            .get("breakpoints")
            .and_then(Value::as_array)
            .map(|locs| {
                locs.iter()
                    .filter_map(|l| l.get("line").and_then(Value::as_u64))
                    .map(|l| l as u32)
                    .collect()
            })
            .unwrap_or_default();
        Ok(lines)
    }

    fn run(&self, action: RunAction, options: &RunOptions) -> DriverResult<StopState> {
        let conn = self.conn()?;

        let thread_id = options
            .thread_id
            .or_else(|| {
                conn.shared
                    .state
                    .lock()
                    .last_stop
                    .as_ref()
                    .and_then(|s| s.thread_id)
            })
            .unwrap_or(1);

        let mut args = json!({ "threadId": thread_id });
        if options.single_thread {
            args["singleThread"] = json!(true);
        }
        if let Some(granularity) = options.granularity {
            args["granularity"] = json!(granularity.as_str());
        }

        let command = match action {
            RunAction::Continue => "continue",
            RunAction::StepOver => "next",
            RunAction::StepIn => {
                if let Some(target) = options.target_id {
                    args["targetId"] = json!(target);
                }
                "stepIn"
            }
            RunAction::StepOut => "stepOut",
            RunAction::StepBack => "stepBack",
            RunAction::Pause => "pause",
            RunAction::Restart | RunAction::Goto => {
                return Err(DriverError::InvalidArgs(format!(
                    "action `{action}` has a dedicated operation"
                )))
            }
        };

        let gen = self.stop_generation(&conn);
        conn.client.request(command, Some(args))?;

        // a pause must resolve promptly; a continue blocks until the
        // debuggee actually stops
        let timeout = if action == RunAction::Pause {
            Some(self.deadline)
        } else {
            None
        };
        self.wait_for_stop(&conn, gen, timeout)?;
        self.materialize_stop(&conn)
    }

    fn goto(&self, file: &str, line: u32) -> DriverResult<StopState> {
        let conn = self.conn()?;
        let targets = self.goto_targets(file, line)?;
        let target = targets
            .first()
            .ok_or_else(|| DriverError::InvalidArgs(format!("no goto target at {file}:{line}")))?;

        let thread_id = conn
            .shared
            .state
            .lock()
            .last_stop
            .as_ref()
            .and_then(|s| s.thread_id)
            .unwrap_or(1);

        let gen = self.stop_generation(&conn);
        conn.client.request(
            "goto",
            Some(json!({ "threadId": thread_id, "targetId": target.id })),
        )?;
        self.wait_for_stop(&conn, gen, Some(self.deadline))?;
        self.materialize_stop(&conn)
    }

    fn restart_frame(&self, frame_id: i64) -> DriverResult<StopState> {
        let conn = self.conn()?;
        let gen = self.stop_generation(&conn);
        conn.client
            .request("restartFrame", Some(json!({ "frameId": frame_id })))?;
        self.wait_for_stop(&conn, gen, Some(self.deadline))?;
        self.materialize_stop(&conn)
    }

    fn threads(&self) -> DriverResult<Vec<ThreadInfo>> {
        let conn = self.conn()?;
        let body = conn.client.request("threads", None)?;
        let threads = body
            .get("threads")
            .and_then(Value::as_array)
            .map(|threads| {
                threads
                    .iter()
                    .map(|t| ThreadInfo {
                        id: t.get("id").and_then(Value::as_i64).unwrap_or(0),
                        name: events::str_field(t, "name").unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(threads)
    }

    fn stack_trace(
        &self,
        thread_id: i64,
        start_frame: u32,
        count: u32,
    ) -> DriverResult<Vec<StackFrame>> {
        let conn = self.conn()?;
        self.fetch_stack(&conn, thread_id, start_frame, count)
    }

    fn scopes(&self, frame_id: i64) -> DriverResult<Vec<Scope>> {
        let conn = self.conn()?;
        self.fetch_scopes(&conn, frame_id)
    }

    fn inspect(&self, request: &InspectRequest) -> DriverResult<InspectResult> {
        let conn = self.conn()?;

        if let Some(reference) = request.variables_reference {
            let children = self.fetch_variables(&conn, reference)?;
            return Ok(InspectResult {
                value: format!("{} children", children.len()),
                ty: None,
                variables_reference: reference,
                children,
            });
        }

        let expression = request
            .expression
            .as_deref()
            .ok_or_else(|| DriverError::InvalidArgs("expression or variables_reference required".into()))?;

        let mut args = json!({
            "expression": expression,
            "context": request.context.as_deref().unwrap_or("repl"),
        });
        if let Some(frame) = request.frame_id {
            args["frameId"] = json!(frame);
        }
        let body = conn.client.request("evaluate", Some(args))?;
        let reference = body
            .get("variablesReference")
            .and_then(Value::as_i64)
            .unwrap_or(0);
        let children = if reference > 0 {
            self.fetch_variables(&conn, reference).unwrap_or_default()
        } else {
            Vec::new()
        };
        Ok(InspectResult {
            value: events::str_field(&body, "result").unwrap_or_default(),
            ty: events::str_field(&body, "type"),
            variables_reference: reference,
            children,
        })
    }

    fn set_variable(
        &self,
        name: &str,
        value: &str,
        frame_id: Option<i64>,
    ) -> DriverResult<Variable> {
        let conn = self.conn()?;
        let container = self.resolve_locals_container(&conn, frame_id)?;
        let body = conn.client.request(
            "setVariable",
            Some(json!({
                "variablesReference": container,
                "name": name,
                "value": value,
            })),
        )?;
        Ok(Variable {
            name: name.to_string(),
            value: events::str_field(&body, "value").unwrap_or_else(|| value.to_string()),
            ty: events::str_field(&body, "type"),
            variables_reference: body
                .get("variablesReference")
                .and_then(Value::as_i64)
                .unwrap_or(0),
        })
    }

    fn set_expression(
        &self,
        expression: &str,
        value: &str,
        frame_id: Option<i64>,
    ) -> DriverResult<Variable> {
        let conn = self.conn()?;
        let mut args = json!({ "expression": expression, "value": value });
        if let Some(frame) = frame_id {
            args["frameId"] = json!(frame);
        }
        let body = conn.client.request("setExpression", Some(args))?;
        Ok(Variable {
            name: expression.to_string(),
            value: events::str_field(&body, "value").unwrap_or_else(|| value.to_string()),
            ty: events::str_field(&body, "type"),
            variables_reference: body
                .get("variablesReference")
                .and_then(Value::as_i64)
                .unwrap_or(0),
        })
    }

    fn step_in_targets(&self, frame_id: i64) -> DriverResult<Vec<StepInTarget>> {
        let conn = self.conn()?;
        let body = conn
            .client
            .request("stepInTargets", Some(json!({ "frameId": frame_id })))?;
        let targets = body
            .get("targets")
            .and_then(Value::as_array)
            .map(|targets| {
                targets
                    .iter()
                    .map(|t| StepInTarget {
                        id: t.get("id").and_then(Value::as_i64).unwrap_or(0),
                        label: events::str_field(t, "label").unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(targets)
    }

    fn goto_targets(&self, file: &str, line: u32) -> DriverResult<Vec<GotoTarget>> {
        let conn = self.conn()?;
        let body = conn.client.request(
            "gotoTargets",
            Some(json!({ "source": { "path": file }, "line": line })),
        )?;
        let targets = body
            .get("targets")
            .and_then(Value::as_array)
            .map(|targets| {
                targets
                    .iter()
                    .map(|t| GotoTarget {
                        id: t.get("id").and_then(Value::as_i64).unwrap_or(0),
                        label: events::str_field(t, "label").unwrap_or_default(),
                        line: t.get("line").and_then(Value::as_u64).unwrap_or(0) as u32,
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(targets)
    }

    fn completions(
        &self,
        text: &str,
        column: u32,
        frame_id: Option<i64>,
    ) -> DriverResult<Vec<CompletionItem>> {
        let conn = self.conn()?;
        let mut args = json!({ "text": text, "column": column });
        if let Some(frame) = frame_id {
            args["frameId"] = json!(frame);
        }
        let body = conn.client.request("completions", Some(args))?;
        let items = body
            .get("targets")
            .and_then(Value::as_array)
            .map(|targets| {
                targets
                    .iter()
                    .map(|t| CompletionItem {
                        label: events::str_field(t, "label").unwrap_or_default(),
                        text: events::str_field(t, "text"),
                        ty: events::str_field(t, "type"),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(items)
    }

    fn exception_info(&self, thread_id: i64) -> DriverResult<ExceptionDetails> {
        let conn = self.conn()?;
        let body = conn
            .client
            .request("exceptionInfo", Some(json!({ "threadId": thread_id })))?;
        Ok(ExceptionDetails {
            exception_id: events::str_field(&body, "exceptionId").unwrap_or_default(),
            description: events::str_field(&body, "description"),
            break_mode: events::str_field(&body, "breakMode"),
        })
    }

    fn source(&self, source_reference: i64) -> DriverResult<String> {
        let conn = self.conn()?;
        let body = conn.client.request(
            "source",
            Some(json!({
                "sourceReference": source_reference,
                "source": { "sourceReference": source_reference },
            })),
        )?;
        events::str_field(&body, "content")
            .ok_or_else(|| DriverError::Protocol("source response had no content".into()))
    }

    fn modules(&self) -> DriverResult<Vec<Module>> {
        let conn = self.conn()?;
        let body = conn.client.request(
            "modules",
            Some(json!({ "startModule": 0, "moduleCount": 100 })),
        )?;
        let modules = body
            .get("modules")
            .and_then(Value::as_array)
            .map(|modules| {
                modules
                    .iter()
                    .map(|m| Module {
                        id: m
                            .get("id")
                            .map(|id| match id {
                                Value::String(s) => s.clone(),
                                other => other.to_string(),
                            })
                            .unwrap_or_default(),
                        name: events::str_field(m, "name").unwrap_or_default(),
                        path: events::str_field(m, "path"),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(modules)
    }

    fn loaded_sources(&self) -> DriverResult<Vec<LoadedSource>> {
        let conn = self.conn()?;
        let body = conn.client.request("loadedSources", Some(json!({})))?;
        let sources = body
            .get("sources")
            .and_then(Value::as_array)
            .map(|sources| {
                sources
                    .iter()
                    .map(|s| LoadedSource {
                        name: events::str_field(s, "name").unwrap_or_default(),
                        path: events::str_field(s, "path"),
                        source_reference: s.get("sourceReference").and_then(Value::as_i64),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(sources)
    }

    fn capabilities(&self) -> Capabilities {
        match self.conn.lock().as_ref() {
            Some(conn) => conn.shared.state.lock().capabilities.clone(),
            None => Capabilities::default(),
        }
    }

    fn read_memory(&self, address: u64, size: usize) -> DriverResult<MemoryChunk> {
        let conn = self.conn()?;
        let body = conn.client.request(
            "readMemory",
            Some(json!({
                "memoryReference": format!("{address:#x}"),
                "count": size,
            })),
        )?;
        let data = events::str_field(&body, "data").unwrap_or_default();
        let reported = events::str_field(&body, "address").unwrap_or_else(|| format!("{address:#x}"));
        let byte_count = MemoryChunk::from_base64(reported.clone(), data.clone(), 0)
            .decode()
            .map(|b| b.len())
            .unwrap_or(0);
        let mut chunk = MemoryChunk::from_base64(reported, data, byte_count);
        chunk.unreadable_bytes = body.get("unreadableBytes").and_then(Value::as_u64);
        Ok(chunk)
    }

    fn write_memory(&self, address: u64, data: &[u8]) -> DriverResult<usize> {
        use base64::Engine as _;
        let conn = self.conn()?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(data);
        let body = conn.client.request(
            "writeMemory",
            Some(json!({
                "memoryReference": format!("{address:#x}"),
                "data": encoded,
            })),
        )?;
        Ok(body
            .get("bytesWritten")
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .unwrap_or(data.len()))
    }

    fn disassemble(
        &self,
        address: u64,
        count: u32,
        offset: Option<i64>,
        resolve_symbols: bool,
    ) -> DriverResult<Vec<Instruction>> {
        let conn = self.conn()?;
        let mut args = json!({
            "memoryReference": format!("{address:#x}"),
            "instructionCount": count,
            "resolveSymbols": resolve_symbols,
        });
        if let Some(offset) = offset {
            args["instructionOffset"] = json!(offset);
        }
        let body = conn.client.request("disassemble", Some(args))?;
        let instructions = body
            .get("instructions")
            .and_then(Value::as_array)
            .map(|insns| {
                insns
                    .iter()
                    .map(|i| Instruction {
                        address: events::str_field(i, "address").unwrap_or_default(),
                        bytes: events::str_field(i, "instructionBytes"),
                        text: events::str_field(i, "instruction").unwrap_or_default(),
                        symbol: events::str_field(i, "symbol"),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(instructions)
    }

    fn read_registers(&self, _thread_id: i64) -> DriverResult<Vec<Register>> {
        Err(DriverError::NotSupported(
            "registers not available for DAP sessions".into(),
        ))
    }

    fn write_register(&self, _thread_id: i64, _name: &str, _value: &str) -> DriverResult<()> {
        Err(DriverError::NotSupported(
            "registers not available for DAP sessions".into(),
        ))
    }

    fn cancel(&self, request_id: Option<i64>, progress_id: Option<&str>) -> DriverResult<()> {
        if request_id.is_none() && progress_id.is_none() {
            return Err(DriverError::InvalidArgs(
                "cancel needs a request_id or progress_id".into(),
            ));
        }
        let conn = self.conn()?;
        let mut args = json!({});
        if let Some(id) = request_id {
            args["requestId"] = json!(id);
            conn.client.abort(id);
        }
        if let Some(progress) = progress_id {
            args["progressId"] = json!(progress);
        }
        conn.client.request("cancel", Some(args))?;
        Ok(())
    }

    fn terminate_threads(&self, thread_ids: &[i64]) -> DriverResult<()> {
        let conn = self.conn()?;
        conn.client
            .request("terminateThreads", Some(json!({ "threadIds": thread_ids })))?;
        Ok(())
    }

    fn raw_request(&self, command: &str, arguments: Value) -> DriverResult<Value> {
        let conn = self.conn()?;
        conn.client.request(command, Some(arguments))
    }

    fn notifications(&self) -> NotificationQueue {
        self.notifications.clone()
    }

    fn debuggee_pid(&self) -> Option<u32> {
        let conn = self.conn.lock().clone()?;
        let pid = conn.shared.state.lock().process_pid;
        pid
    }
}

impl Drop for DapDriver {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.get_mut().take() {
            conn.client.fail_all();
            let mut child = conn.child.lock();
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Reader loop: parse frames, dispatch responses to the correlator and
/// events to the demultiplexer. A framing error or EOF tears everything
/// down and wakes all waiters.
fn spawn_reader(
    stdout: ChildStdout,
    client: Arc<DapClient>,
    shared: Arc<DapShared>,
    notifications: NotificationQueue,
) -> JoinHandle<()> {
    std::thread::Builder::new()
        .name("dap-reader".to_string())
        .spawn(move || {
            let mut reader = BufReader::new(stdout);
            loop {
                let body = match transport::read_frame(&mut reader) {
                    Ok(body) => body,
                    Err(e) => {
                        debug!(error = %e, "adapter pipe closed");
                        break;
                    }
                };
                match serde_json::from_slice::<IncomingMessage>(&body) {
                    Ok(IncomingMessage::Response(response)) => client.complete(response),
                    Ok(IncomingMessage::Event(event)) => {
                        events::handle_event(&shared, &notifications, event)
                    }
                    Ok(IncomingMessage::Request(request)) => client.decline_reverse(&request),
                    Err(e) => warn!(error = %e, "malformed adapter message"),
                }
            }
            client.fail_all();
            let mut state = shared.state.lock();
            state.terminated = true;
            shared.bump_generation(&mut state);
        })
        .unwrap_or_else(|e| {
            // thread spawn failing means the process is in deep trouble;
            // surface it through the logs and a dead reader handle
            tracing::error!(error = %e, "failed to spawn dap reader thread");
            std::thread::spawn(|| {})
        })
}

fn map_stop_reason(reason: &str) -> StopReason {
    StopReason::from_wire(reason).unwrap_or_else(|| {
        if reason.contains("breakpoint") {
            StopReason::Breakpoint
        } else {
            StopReason::Pause
        }
    })
}

fn map_frame(frame: &Value) -> StackFrame {
    let source_path = frame
        .get("source")
        .and_then(|s| events::str_field(s, "path").or_else(|| events::str_field(s, "name")));
    let line = frame.get("line").and_then(Value::as_u64).unwrap_or(0) as u32;
    let column = frame.get("column").and_then(Value::as_u64).map(|c| c as u32);

    StackFrame {
        id: frame.get("id").and_then(Value::as_i64).unwrap_or(0),
        name: events::str_field(frame, "name").unwrap_or_default(),
        source: source_path.map(|file| SourceLocation { file, line, column }),
    }
}

fn map_variable(var: &Value) -> Variable {
    Variable {
        name: events::str_field(var, "name").unwrap_or_default(),
        value: events::str_field(var, "value").unwrap_or_default(),
        ty: events::str_field(var, "type"),
        variables_reference: var
            .get("variablesReference")
            .and_then(Value::as_i64)
            .unwrap_or(0),
    }
}

fn map_breakpoint_replies(body: &Value, next_id: &mut dyn FnMut() -> i64) -> Vec<Breakpoint> {
    body.get("breakpoints")
        .and_then(Value::as_array)
        .map(|bps| {
            bps.iter()
                .map(|bp| Breakpoint {
                    id: bp
                        .get("id")
                        .and_then(Value::as_i64)
                        .unwrap_or_else(|| next_id()),
                    verified: bp.get("verified").and_then(Value::as_bool).unwrap_or(false),
                    file: String::new(),
                    line: 0,
                    resolved_line: None,
                    name: None,
                    condition: None,
                    hit_condition: None,
                    log_message: None,
                })
                .collect()
        })
        .unwrap_or_default()
}
