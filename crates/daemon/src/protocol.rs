// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client-facing request/response protocol.
//!
//! One JSON object per line each way. Error codes are a stable contract
//! for clients (JSON-RPC numbering plus -32001 for capability faults).

use cog_core::DriverError;
use cog_engine::EngineError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;
pub const NOT_SUPPORTED: i32 = -32001;

/// The guard message for inspection tools hitting a running session.
pub const SESSION_RUNNING_MSG: &str =
    "Session is running. Use poll_events to check status or stop to cancel.";

/// One client request: a tool name plus its arguments object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub tool: String,
    #[serde(default = "empty_args")]
    pub args: serde_json::Value,
}

fn empty_args() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// A tool failure with its client-visible code.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ToolError {
    pub code: i32,
    pub message: String,
}

impl ToolError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            code: PARSE_ERROR,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            code: INVALID_REQUEST,
            message: message.into(),
        }
    }

    pub fn method_not_found(tool: &str) -> Self {
        Self {
            code: METHOD_NOT_FOUND,
            message: format!("unknown tool: {tool}"),
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: INVALID_PARAMS,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: INTERNAL_ERROR,
            message: message.into(),
        }
    }

    pub fn not_supported(message: impl Into<String>) -> Self {
        Self {
            code: NOT_SUPPORTED,
            message: message.into(),
        }
    }

    /// The inspection-while-running guard error.
    pub fn session_running() -> Self {
        Self::internal(SESSION_RUNNING_MSG)
    }
}

impl From<DriverError> for ToolError {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::NotSupported(message) => Self::not_supported(message),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<EngineError> for ToolError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::UnknownSession(id) => Self::invalid_params(format!("unknown session: {id}")),
            EngineError::SessionRunning => Self::session_running(),
            other => Self::internal(other.to_string()),
        }
    }
}

/// Success envelope with the pre-serialized result spliced in raw.
pub fn ok_envelope(result_json: &str) -> String {
    format!("{{\"ok\":true,\"result\":{result_json}}}")
}

/// Failure envelope.
pub fn err_envelope(error: &ToolError) -> String {
    #[derive(Serialize)]
    struct Envelope<'a> {
        ok: bool,
        error: &'a ToolError,
    }
    serde_json::to_string(&Envelope { ok: false, error })
        .unwrap_or_else(|_| format!("{{\"ok\":false,\"error\":{{\"code\":{INTERNAL_ERROR},\"message\":\"encode failure\"}}}}"))
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
