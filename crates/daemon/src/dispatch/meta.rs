// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Meta tools: cancel, terminate_threads, raw passthrough.

use serde_json::{json, Value};

use super::{args, to_result, Dispatcher};
use crate::protocol::ToolError;

/// Bypasses the status guard: cancelling must work while running.
pub(super) fn cancel(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.session(&args)?;
    let request_id = args::optional_i64(&args, "request_id");
    let progress_id = args::optional_str(&args, "progress_id");

    session
        .driver()
        .cancel(request_id, progress_id)
        .map_err(ToolError::from)?;
    to_result(&json!({ "cancelled": true }))
}

pub(super) fn terminate_threads(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.stopped_session(&args)?;
    let thread_ids = args::i64_list(&args, "thread_ids")?;
    if thread_ids.is_empty() {
        return Err(ToolError::invalid_params("field `thread_ids` is required"));
    }

    session
        .driver()
        .terminate_threads(&thread_ids)
        .map_err(ToolError::from)?;
    to_result(&json!({ "terminated": thread_ids }))
}

/// OS pid of the debuggee, once the driver knows it.
pub(super) fn get_pid(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.session(&args)?;
    to_result(&json!({ "pid": session.debuggee_pid() }))
}

/// Escape hatch: forward an arbitrary command to the backend and return
/// its response body verbatim.
pub(super) fn raw_request(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.session(&args)?;
    let command = args::require_str(&args, "command")?;
    let arguments = args
        .get("arguments")
        .cloned()
        .unwrap_or(Value::Object(serde_json::Map::new()));

    let body = session
        .driver()
        .raw_request(command, arguments)
        .map_err(ToolError::from)?;
    to_result(&body)
}
