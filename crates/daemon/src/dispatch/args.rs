// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Argument extraction and validation helpers.
//!
//! Every failure is a -32602 naming the offending field.

use serde_json::Value;

use crate::protocol::ToolError;

pub fn require_str<'a>(args: &'a Value, field: &str) -> Result<&'a str, ToolError> {
    args.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::invalid_params(format!("missing required field `{field}`")))
}

pub fn optional_str<'a>(args: &'a Value, field: &str) -> Option<&'a str> {
    args.get(field).and_then(Value::as_str)
}

pub fn require_u32(args: &Value, field: &str) -> Result<u32, ToolError> {
    args.get(field)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| {
            ToolError::invalid_params(format!("field `{field}` must be an unsigned integer"))
        })
}

pub fn require_i64(args: &Value, field: &str) -> Result<i64, ToolError> {
    args.get(field)
        .and_then(Value::as_i64)
        .ok_or_else(|| ToolError::invalid_params(format!("field `{field}` must be an integer")))
}

pub fn optional_i64(args: &Value, field: &str) -> Option<i64> {
    args.get(field).and_then(Value::as_i64)
}

pub fn optional_u32(args: &Value, field: &str) -> Option<u32> {
    args.get(field)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
}

pub fn optional_bool(args: &Value, field: &str) -> Option<bool> {
    args.get(field).and_then(Value::as_bool)
}

/// Addresses arrive as a JSON integer or a hex string (`0x1000`).
pub fn require_address(args: &Value, field: &str) -> Result<u64, ToolError> {
    match args.get(field) {
        Some(Value::Number(n)) => n.as_u64().ok_or_else(|| {
            ToolError::invalid_params(format!("field `{field}` must be a non-negative address"))
        }),
        Some(Value::String(s)) => parse_hex_address(s)
            .ok_or_else(|| ToolError::invalid_params(format!("field `{field}` is not a hex address: `{s}`"))),
        _ => Err(ToolError::invalid_params(format!(
            "missing required field `{field}`"
        ))),
    }
}

pub fn parse_hex_address(s: &str) -> Option<u64> {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u64::from_str_radix(digits, 16).ok()
}

/// A list of strings (`filters`, `references`).
pub fn string_list(args: &Value, field: &str) -> Result<Vec<String>, ToolError> {
    match args.get(field) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_str().map(str::to_string).ok_or_else(|| {
                    ToolError::invalid_params(format!("field `{field}` must contain strings"))
                })
            })
            .collect(),
        Some(_) => Err(ToolError::invalid_params(format!(
            "field `{field}` must be an array"
        ))),
    }
}

/// A list of integers (`thread_ids`).
pub fn i64_list(args: &Value, field: &str) -> Result<Vec<i64>, ToolError> {
    match args.get(field) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_i64().ok_or_else(|| {
                    ToolError::invalid_params(format!("field `{field}` must contain integers"))
                })
            })
            .collect(),
        Some(_) => Err(ToolError::invalid_params(format!(
            "field `{field}` must be an array"
        ))),
    }
}

#[cfg(test)]
#[path = "args_tests.rs"]
mod tests;
