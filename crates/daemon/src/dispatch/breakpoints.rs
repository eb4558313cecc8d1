// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Breakpoint tools.

use serde_json::{json, Value};

use super::{args, to_result, Dispatcher};
use crate::protocol::ToolError;

/// The `breakpoint` tool multiplexes on `action`:
/// set, set_function, set_exception, set_instruction, set_data, remove,
/// list.
pub(super) fn breakpoint(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.stopped_session(&args)?;
    let action = args::optional_str(&args, "action").unwrap_or("set");
    let driver = session.driver();

    let result = match action {
        "set" => {
            let file = args::require_str(&args, "file")?;
            let line = args::require_u32(&args, "line")?;
            let records = driver
                .set_line_breakpoint(
                    file,
                    line,
                    args::optional_str(&args, "condition"),
                    args::optional_str(&args, "hit_condition"),
                    args::optional_str(&args, "log_message"),
                )
                .map_err(ToolError::from)?;
            d.emit(json!({
                "event": "breakpoint",
                "session_id": session.id().to_string(),
                "action": "set",
                "file": file,
                "line": line,
            }));
            json!({ "breakpoints": records })
        }
        "set_function" => {
            let name = args::require_str(&args, "name")?;
            let records = driver
                .set_function_breakpoint(name, args::optional_str(&args, "condition"))
                .map_err(ToolError::from)?;
            d.emit(json!({
                "event": "breakpoint",
                "session_id": session.id().to_string(),
                "action": "set_function",
                "name": name,
            }));
            json!({ "breakpoints": records })
        }
        "set_exception" => {
            let filters = args::string_list(&args, "filters")?;
            let records = driver
                .set_exception_breakpoints(&filters)
                .map_err(ToolError::from)?;
            json!({ "breakpoints": records })
        }
        "set_instruction" => {
            let references = args::string_list(&args, "references")?;
            let records = driver
                .set_instruction_breakpoints(&references)
                .map_err(ToolError::from)?;
            json!({ "breakpoints": records })
        }
        "set_data" => {
            let data_id = args::require_str(&args, "data_id")?;
            let access_type = args::optional_str(&args, "access_type").unwrap_or("write");
            let records = driver
                .set_data_breakpoint(data_id, access_type)
                .map_err(ToolError::from)?;
            json!({ "breakpoints": records })
        }
        "remove" => {
            let id = args::require_i64(&args, "id")?;
            driver.remove_breakpoint(id).map_err(ToolError::from)?;
            d.emit(json!({
                "event": "breakpoint",
                "session_id": session.id().to_string(),
                "action": "remove",
                "id": id,
            }));
            json!({ "removed": id })
        }
        "list" => {
            let records = driver.list_breakpoints().map_err(ToolError::from)?;
            json!({ "breakpoints": records })
        }
        other => {
            return Err(ToolError::invalid_params(format!(
                "unknown breakpoint action `{other}`"
            )))
        }
    };

    to_result(&result)
}

pub(super) fn breakpoint_locations(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.stopped_session(&args)?;
    let file = args::require_str(&args, "file")?;
    let line = args::require_u32(&args, "line")?;
    let end_line = args::optional_u32(&args, "end_line");

    let lines = session
        .driver()
        .breakpoint_locations(file, line, end_line)
        .map_err(ToolError::from)?;
    to_result(&json!({ "lines": lines }))
}

pub(super) fn data_breakpoint_info(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.stopped_session(&args)?;
    let name = args::require_str(&args, "name")?;
    let frame_id = args::optional_i64(&args, "frame_id");

    let info = session
        .driver()
        .data_breakpoint_info(name, frame_id)
        .map_err(ToolError::from)?;
    to_result(&info)
}
