// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inspection tools: stack, variables, evaluation.
//!
//! All of these hit the stopped-session guard before touching the driver.

use cog_core::InspectRequest;
use serde_json::{json, Value};

use super::{args, to_result, Dispatcher};
use crate::protocol::ToolError;

pub(super) fn threads(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.stopped_session(&args)?;
    let threads = session.driver().threads().map_err(ToolError::from)?;
    to_result(&json!({ "threads": threads }))
}

pub(super) fn stack_trace(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.stopped_session(&args)?;
    let thread_id = args::optional_i64(&args, "thread_id").unwrap_or(1);
    let start = args::optional_u32(&args, "start_frame").unwrap_or(0);
    let count = args::optional_u32(&args, "count").unwrap_or(20);

    let frames = session
        .driver()
        .stack_trace(thread_id, start, count)
        .map_err(ToolError::from)?;
    to_result(&json!({ "frames": frames }))
}

pub(super) fn scopes(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.stopped_session(&args)?;
    let frame_id = args::require_i64(&args, "frame_id")?;
    let scopes = session.driver().scopes(frame_id).map_err(ToolError::from)?;
    to_result(&json!({ "scopes": scopes }))
}

pub(super) fn inspect(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.stopped_session(&args)?;

    let request = InspectRequest {
        expression: args::optional_str(&args, "expression").map(str::to_string),
        variables_reference: args::optional_i64(&args, "variables_reference"),
        frame_id: args::optional_i64(&args, "frame_id"),
        context: args::optional_str(&args, "context").map(str::to_string),
    };
    if request.expression.is_none() && request.variables_reference.is_none() {
        return Err(ToolError::invalid_params(
            "field `expression` or `variables_reference` is required",
        ));
    }

    let result = session.driver().inspect(&request).map_err(ToolError::from)?;
    d.emit(json!({
        "event": "inspect",
        "session_id": session.id().to_string(),
        "expression": request.expression,
    }));
    to_result(&result)
}

pub(super) fn set_variable(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.stopped_session(&args)?;
    let name = args::require_str(&args, "name")?;
    let value = args::require_str(&args, "value")?;
    let frame_id = args::optional_i64(&args, "frame_id");

    let variable = session
        .driver()
        .set_variable(name, value, frame_id)
        .map_err(ToolError::from)?;
    d.emit(json!({
        "event": "activity",
        "session_id": session.id().to_string(),
        "kind": "set_variable",
        "name": name,
    }));
    to_result(&variable)
}

pub(super) fn set_expression(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.stopped_session(&args)?;
    let expression = args::require_str(&args, "expression")?;
    let value = args::require_str(&args, "value")?;
    let frame_id = args::optional_i64(&args, "frame_id");

    let variable = session
        .driver()
        .set_expression(expression, value, frame_id)
        .map_err(ToolError::from)?;
    to_result(&variable)
}

pub(super) fn step_in_targets(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.stopped_session(&args)?;
    let frame_id = args::require_i64(&args, "frame_id")?;
    let targets = session
        .driver()
        .step_in_targets(frame_id)
        .map_err(ToolError::from)?;
    to_result(&json!({ "targets": targets }))
}

pub(super) fn goto_targets(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.stopped_session(&args)?;
    let file = args::require_str(&args, "file")?;
    let line = args::require_u32(&args, "line")?;
    let targets = session
        .driver()
        .goto_targets(file, line)
        .map_err(ToolError::from)?;
    to_result(&json!({ "targets": targets }))
}

pub(super) fn completions(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.stopped_session(&args)?;
    let text = args::require_str(&args, "text")?;
    let column = args::optional_u32(&args, "column").unwrap_or(text.len() as u32 + 1);
    let frame_id = args::optional_i64(&args, "frame_id");

    let items = session
        .driver()
        .completions(text, column, frame_id)
        .map_err(ToolError::from)?;
    to_result(&json!({ "completions": items }))
}

pub(super) fn exception_info(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.stopped_session(&args)?;
    let thread_id = args::optional_i64(&args, "thread_id").unwrap_or(1);
    let details = session
        .driver()
        .exception_info(thread_id)
        .map_err(ToolError::from)?;
    to_result(&details)
}

pub(super) fn source(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.stopped_session(&args)?;
    let reference = args::require_i64(&args, "source_reference")?;
    let content = session.driver().source(reference).map_err(ToolError::from)?;
    to_result(&json!({ "content": content }))
}
