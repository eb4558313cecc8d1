// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Introspection tools: modules, sources, capabilities, symbols.

use serde_json::{json, Value};

use super::{args, to_result, Dispatcher};
use crate::protocol::ToolError;

pub(super) fn modules(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.stopped_session(&args)?;
    let modules = session.driver().modules().map_err(ToolError::from)?;
    to_result(&json!({ "modules": modules }))
}

pub(super) fn loaded_sources(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.stopped_session(&args)?;
    let sources = session.driver().loaded_sources().map_err(ToolError::from)?;
    to_result(&json!({ "sources": sources }))
}

/// Capabilities come from the snapshot taken at session creation; only
/// true flags surface.
pub(super) fn capabilities(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.session(&args)?;
    to_result(&json!({ "capabilities": session.capabilities() }))
}

pub(super) fn find_symbol(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.stopped_session(&args)?;
    let name = args::require_str(&args, "name")?;
    let symbol = session.driver().find_symbol(name).map_err(ToolError::from)?;
    to_result(&symbol)
}

pub(super) fn variable_location(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.stopped_session(&args)?;
    let name = args::require_str(&args, "name")?;
    let frame_id = args::optional_i64(&args, "frame_id");
    let location = session
        .driver()
        .variable_location(name, frame_id)
        .map_err(ToolError::from)?;
    to_result(&location)
}

pub(super) fn expand_macro(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.stopped_session(&args)?;
    let name = args::require_str(&args, "name")?;
    let expansion = session.driver().expand_macro(name).map_err(ToolError::from)?;
    to_result(&json!({ "expansion": expansion }))
}
