// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event demultiplexing and the proxy's shared debuggee state.
//!
//! The reader thread feeds every adapter event through [`handle_event`]:
//! the interesting ones update the shared stop/breakpoint/output state, and
//! all of them are duplicated verbatim into the notification queue for the
//! client's poll stream.

use std::collections::{BTreeMap, HashMap};

use cog_core::{Breakpoint, Capabilities, Notification, NotificationQueue, OutputEntry};
use parking_lot::{Condvar, Mutex};
use serde_json::Value;
use tracing::{debug, trace};

use super::transport::DapEvent;

/// Captured output entries kept per stop.
const OUTPUT_RING_CAP: usize = 256;

/// A `stopped` event before materialization. The full stop body (stack,
/// scopes, locals) is fetched by follow-up requests at publication time.
#[derive(Debug, Clone, Default)]
pub(crate) struct RawStop {
    pub reason: String,
    pub thread_id: Option<i64>,
    pub hit_breakpoint_ids: Vec<i64>,
    pub description: Option<String>,
    pub text: Option<String>,
}

/// Mutable debuggee state shared between the reader thread and callers.
#[derive(Default)]
pub(crate) struct DapState {
    /// Bumped on every stop-like transition; run() waits for it to move.
    pub stop_generation: u64,
    pub last_stop: Option<RawStop>,
    pub initialized: bool,
    pub exit_code: Option<i32>,
    pub terminated: bool,
    pub output: Vec<OutputEntry>,
    pub breakpoints: BTreeMap<i64, Breakpoint>,
    pub log_templates: HashMap<i64, String>,
    pub capabilities: Capabilities,
    pub process_pid: Option<u32>,
    /// Requested source breakpoints per file, resent wholesale on changes.
    pub source_requests: HashMap<String, Vec<SourceBreakpointRequest>>,
    pub function_requests: Vec<FunctionBreakpointRequest>,
}

/// One requested line breakpoint, as sent to the adapter.
#[derive(Debug, Clone)]
pub(crate) struct SourceBreakpointRequest {
    pub id: i64,
    pub line: u32,
    pub condition: Option<String>,
    pub hit_condition: Option<String>,
    pub log_message: Option<String>,
}

/// One requested function breakpoint.
#[derive(Debug, Clone)]
pub(crate) struct FunctionBreakpointRequest {
    pub id: i64,
    pub name: String,
    pub condition: Option<String>,
}

/// Shared state plus the condvar broadcast that wakes stop waiters.
pub(crate) struct DapShared {
    pub state: Mutex<DapState>,
    pub stop_cond: Condvar,
}

impl DapShared {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DapState::default()),
            stop_cond: Condvar::new(),
        }
    }

    /// Wake everything blocked on a stop transition.
    pub fn bump_generation(&self, state: &mut DapState) {
        state.stop_generation += 1;
        self.stop_cond.notify_all();
    }
}

/// Dispatch one adapter event.
pub(crate) fn handle_event(shared: &DapShared, notifications: &NotificationQueue, event: DapEvent) {
    trace!(event = %event.event, "adapter event");

    // Every event is duplicated into the poll stream, params verbatim.
    let body = event.body.clone().unwrap_or(Value::Object(Default::default()));
    match Notification::from_value(&event.event, &body) {
        Ok(n) => notifications.push(n),
        Err(e) => debug!(event = %event.event, error = %e, "failed to queue notification"),
    }

    let mut state = shared.state.lock();
    match event.event.as_str() {
        "initialized" => {
            state.initialized = true;
            shared.stop_cond.notify_all();
        }
        "stopped" => {
            let raw = RawStop {
                reason: str_field(&body, "reason").unwrap_or_else(|| "pause".to_string()),
                thread_id: body.get("threadId").and_then(Value::as_i64),
                hit_breakpoint_ids: body
                    .get("hitBreakpointIds")
                    .and_then(Value::as_array)
                    .map(|ids| ids.iter().filter_map(Value::as_i64).collect())
                    .unwrap_or_default(),
                description: str_field(&body, "description"),
                text: str_field(&body, "text"),
            };
            state.last_stop = Some(raw);
            shared.bump_generation(&mut state);
        }
        "continued" => {
            state.last_stop = None;
        }
        "exited" => {
            state.exit_code = body
                .get("exitCode")
                .and_then(Value::as_i64)
                .map(|c| c as i32);
        }
        "terminated" => {
            state.terminated = true;
            shared.bump_generation(&mut state);
        }
        "output" => {
            if state.output.len() < OUTPUT_RING_CAP {
                state.output.push(OutputEntry {
                    category: str_field(&body, "category").unwrap_or_else(|| "stdout".to_string()),
                    output: str_field(&body, "output").unwrap_or_default(),
                });
            }
        }
        "breakpoint" => {
            apply_breakpoint_change(&mut state, &body);
        }
        "process" => {
            state.process_pid = body
                .get("systemProcessId")
                .and_then(Value::as_u64)
                .map(|p| p as u32);
        }
        "capabilities" => {
            // adapters send deltas: merge, never replace
            if let Some(caps) = body.get("capabilities") {
                let update = Capabilities::from_reply(caps);
                state.capabilities = merge_capabilities(&state.capabilities, &update);
            }
        }
        // thread, module, loadedSource, progress*: notification-only
        _ => {}
    }
}

fn merge_capabilities(current: &Capabilities, update: &Capabilities) -> Capabilities {
    let flags: Vec<&str> = current.flags().chain(update.flags()).collect();
    Capabilities::from_flags(flags)
}

/// A `breakpoint` event changes verification status or the resolved line
/// of an existing record so a later `list` reflects it.
fn apply_breakpoint_change(state: &mut DapState, body: &Value) {
    let Some(info) = body.get("breakpoint") else {
        return;
    };
    let Some(id) = info.get("id").and_then(Value::as_i64) else {
        return;
    };

    if let Some(record) = state.breakpoints.get_mut(&id) {
        if let Some(verified) = info.get("verified").and_then(Value::as_bool) {
            record.verified = verified;
        }
        if let Some(line) = info.get("line").and_then(Value::as_u64) {
            record.resolved_line = Some(line as u32);
        }
    }
}

pub(crate) fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
