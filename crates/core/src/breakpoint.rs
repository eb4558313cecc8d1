// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Breakpoint records.

use serde::{Deserialize, Serialize};

/// A breakpoint as known to the driver.
///
/// `line` is the requested line; `resolved_line` is the adapter-adjusted
/// location when verification moved it. Function, instruction, and data
/// breakpoints leave `file` empty and describe themselves through `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub id: i64,
    pub verified: bool,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub file: String,
    #[serde(skip_serializing_if = "is_zero", default)]
    pub line: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub resolved_line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hit_condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub log_message: Option<String>,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

impl Breakpoint {
    pub fn at_line(id: i64, file: impl Into<String>, line: u32) -> Self {
        Self {
            id,
            verified: false,
            file: file.into(),
            line,
            resolved_line: None,
            name: None,
            condition: None,
            hit_condition: None,
            log_message: None,
        }
    }

    /// The line clients should display: adapter-resolved when available.
    pub fn effective_line(&self) -> u32 {
        self.resolved_line.unwrap_or(self.line)
    }

    /// True when this breakpoint only logs and resumes.
    pub fn is_log_point(&self) -> bool {
        self.log_message.as_deref().is_some_and(|m| !m.is_empty())
    }
}

/// Result of a `data_breakpoint_info` query: whether the variable can take
/// a data breakpoint and under which id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataBreakpointInfo {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data_id: Option<String>,
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub access_types: Vec<String>,
}

#[cfg(test)]
#[path = "breakpoint_tests.rs"]
mod tests;
