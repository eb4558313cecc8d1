// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Low-level tools: memory, registers, disassembly.

use base64::Engine as _;
use serde_json::{json, Value};

use super::{args, to_result, Dispatcher};
use crate::protocol::ToolError;

pub(super) fn read_memory(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.stopped_session(&args)?;
    let address = args::require_address(&args, "address")?;
    let size = args::require_i64(&args, "size")?;
    if size < 0 {
        return Err(ToolError::invalid_params("field `size` must be non-negative"));
    }
    let size = size as usize;

    let chunk = session
        .driver()
        .read_memory(address, size)
        .map_err(ToolError::from)?;
    to_result(&chunk)
}

pub(super) fn write_memory(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.stopped_session(&args)?;
    let address = args::require_address(&args, "address")?;
    let encoded = args::require_str(&args, "data")?;
    let data = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| ToolError::invalid_params(format!("field `data` is not base64: {e}")))?;

    let written = session
        .driver()
        .write_memory(address, &data)
        .map_err(ToolError::from)?;
    d.emit(json!({
        "event": "activity",
        "session_id": session.id().to_string(),
        "kind": "write_memory",
        "address": format!("{address:#x}"),
        "bytes": written,
    }));
    to_result(&json!({ "bytes_written": written }))
}

pub(super) fn disassemble(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.stopped_session(&args)?;
    let address = args::require_address(&args, "address")?;
    let count = args::optional_u32(&args, "count").unwrap_or(16);
    let offset = args::optional_i64(&args, "offset");
    let resolve = args::optional_bool(&args, "resolve_symbols").unwrap_or(false);

    let instructions = session
        .driver()
        .disassemble(address, count, offset, resolve)
        .map_err(ToolError::from)?;
    to_result(&json!({ "instructions": instructions }))
}

pub(super) fn registers(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.stopped_session(&args)?;
    let thread_id = args::optional_i64(&args, "thread_id").unwrap_or(0);
    let registers = session
        .driver()
        .read_registers(thread_id)
        .map_err(ToolError::from)?;
    to_result(&json!({ "registers": registers }))
}

pub(super) fn write_register(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.stopped_session(&args)?;
    let thread_id = args::optional_i64(&args, "thread_id").unwrap_or(0);
    let name = args::require_str(&args, "name")?;
    let value = args::require_str(&args, "value")?;

    session
        .driver()
        .write_register(thread_id, name, value)
        .map_err(ToolError::from)?;
    d.emit(json!({
        "event": "activity",
        "session_id": session.id().to_string(),
        "kind": "write_register",
        "name": name,
    }));
    to_result(&json!({ "written": true }))
}
