// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Result rendering.

use serde_json::Value;

/// Render a tool result for the terminal: pretty JSON for structures,
/// bare text for single-string results.
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

/// One-line summary for a session listing row.
pub fn session_row(session: &Value) -> String {
    let id = session["session_id"].as_str().unwrap_or("?");
    let status = session["status"].as_str().unwrap_or("?");
    let program = session["program"].as_str().unwrap_or("?");
    let backend = session["backend"].as_str().unwrap_or("?");
    format!("{id}  {status:<10}  {backend:<6}  {program}")
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
