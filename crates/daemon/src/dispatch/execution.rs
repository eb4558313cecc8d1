// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution tools: run, goto, restart_frame, poll_events.

use cog_core::{Notification, RunAction, RunOptions, SteppingGranularity};
use cog_engine::{promote, spawn_run, RunCompletion, Session, SessionStatus};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{args, to_result, Dispatcher};
use crate::protocol::ToolError;

fn run_options(args: &Value) -> Result<RunOptions, ToolError> {
    let granularity = match args::optional_str(args, "granularity") {
        None => None,
        Some("statement") => Some(SteppingGranularity::Statement),
        Some("line") => Some(SteppingGranularity::Line),
        Some("instruction") => Some(SteppingGranularity::Instruction),
        Some(other) => {
            return Err(ToolError::invalid_params(format!(
                "field `granularity` must be statement|line|instruction, got `{other}`"
            )))
        }
    };
    Ok(RunOptions {
        thread_id: args::optional_i64(args, "thread_id"),
        granularity,
        single_thread: args::optional_bool(args, "single_thread").unwrap_or(false),
        target_id: args::optional_i64(args, "target_id"),
    })
}

pub(super) fn run(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.session(&args)?;
    let action_str = args::require_str(&args, "action")?;
    let action = RunAction::parse(action_str)
        .ok_or_else(|| ToolError::invalid_params(format!("unknown run action `{action_str}`")))?;
    let options = run_options(&args)?;
    let session_id = session.id().to_string();

    // restart and goto mutate debuggee state and hold to the same guard
    // as their dedicated tools; only pause may target a running session
    if matches!(action, RunAction::Restart | RunAction::Goto)
        && session.status() == SessionStatus::Running
    {
        return Err(ToolError::session_running());
    }

    d.emit(json!({ "event": "run", "session_id": session_id, "action": action.as_str() }));

    if action.is_async() {
        spawn_run(&session, action, options)?;
        return to_result(&json!({
            "status": "running",
            "session_id": session_id,
        }));
    }

    // synchronous actions return the full stop state inline
    let stop = match action {
        RunAction::Pause => session.driver().run(RunAction::Pause, &options),
        RunAction::Restart => session.driver().restart(),
        RunAction::Goto => {
            let file = args::require_str(&args, "file")?;
            let line = args::require_u32(&args, "line")?;
            session.driver().goto(file, line)
        }
        _ => unreachable!("async actions handled above"),
    }
    .map_err(ToolError::from)?;

    session.apply_stop(&stop);
    d.publish_stop(&session_id, action.as_str(), &stop);

    to_result(&json!({
        "session_id": session_id,
        "status": session.status().as_str(),
        "stop": stop,
    }))
}

pub(super) fn goto(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.stopped_session(&args)?;
    let file = args::require_str(&args, "file")?;
    let line = args::require_u32(&args, "line")?;

    let stop = session.driver().goto(file, line).map_err(ToolError::from)?;
    session.apply_stop(&stop);

    let session_id = session.id().to_string();
    d.publish_stop(&session_id, "goto", &stop);

    to_result(&json!({
        "session_id": session_id,
        "status": session.status().as_str(),
        "stop": stop,
    }))
}

pub(super) fn restart_frame(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.stopped_session(&args)?;
    let frame_id = args::require_i64(&args, "frame_id")?;

    let stop = session
        .driver()
        .restart_frame(frame_id)
        .map_err(ToolError::from)?;
    session.apply_stop(&stop);

    let session_id = session.id().to_string();
    d.publish_stop(&session_id, "restart_frame", &stop);

    to_result(&json!({
        "session_id": session_id,
        "status": session.status().as_str(),
        "stop": stop,
    }))
}

/// One event in a poll response. `params` is raw, pre-serialized JSON.
#[derive(Serialize)]
struct EventRecord {
    session_id: String,
    method: String,
    params: Box<serde_json::value::RawValue>,
}

/// Promote finished runs, then drain every driver's notification queue.
///
/// Bypasses the status guard: polling must work while running.
pub(super) fn poll_events(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let sessions: Vec<Arc<Session>> = match args::optional_str(&args, "session_id") {
        Some(id) => vec![d.manager.lookup(id)?],
        None => d.manager.list(),
    };

    let mut events: Vec<EventRecord> = Vec::new();

    for session in &sessions {
        let session_id = session.id().to_string();

        if let Some(completion) = promote(session) {
            match completion {
                RunCompletion::Stopped { action, stop, .. } => {
                    d.publish_stop(&session_id, &action, &stop);
                    if let Ok(params) = serde_json::value::to_raw_value(&stop) {
                        events.push(EventRecord {
                            session_id: session_id.clone(),
                            method: "stopped".to_string(),
                            params,
                        });
                    }
                }
                RunCompletion::Failed { action, error, .. } => {
                    d.emit(json!({
                        "event": "error",
                        "session_id": session_id,
                        "action": action,
                        "error": error,
                    }));
                    if let Ok(params) =
                        serde_json::value::to_raw_value(&json!({ "action": action, "error": error }))
                    {
                        events.push(EventRecord {
                            session_id: session_id.clone(),
                            method: "error".to_string(),
                            params,
                        });
                    }
                }
            }
        }

        for Notification { method, params } in session.notifications().drain() {
            events.push(EventRecord {
                session_id: session_id.clone(),
                method,
                params,
            });
        }
    }

    #[derive(Serialize)]
    struct PollResult {
        events: Vec<EventRecord>,
    }
    to_result(&PollResult { events })
}
