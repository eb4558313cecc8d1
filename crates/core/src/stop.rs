// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stop state: the publishable snapshot of a debuggee at rest.

use serde::{Deserialize, Serialize};

use crate::frame::{SourceLocation, StackFrame, Variable};

/// Why the debuggee stopped. Wire values are the human-readable strings
/// used by stock debug adapters ("function breakpoint" etc.).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopReason {
    Breakpoint,
    Step,
    Exception,
    Entry,
    Pause,
    Goto,
    #[serde(rename = "function breakpoint")]
    FunctionBreakpoint,
    #[serde(rename = "data breakpoint")]
    DataBreakpoint,
    #[serde(rename = "instruction breakpoint")]
    InstructionBreakpoint,
    Exited,
}

impl StopReason {
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            Self::Breakpoint => "breakpoint",
            Self::Step => "step",
            Self::Exception => "exception",
            Self::Entry => "entry",
            Self::Pause => "pause",
            Self::Goto => "goto",
            Self::FunctionBreakpoint => "function breakpoint",
            Self::DataBreakpoint => "data breakpoint",
            Self::InstructionBreakpoint => "instruction breakpoint",
            Self::Exited => "exited",
        }
    }

    /// Map an adapter-reported reason string onto the typed variant.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "breakpoint" => Some(Self::Breakpoint),
            "step" => Some(Self::Step),
            "exception" => Some(Self::Exception),
            "entry" => Some(Self::Entry),
            "pause" => Some(Self::Pause),
            "goto" => Some(Self::Goto),
            "function breakpoint" => Some(Self::FunctionBreakpoint),
            "data breakpoint" => Some(Self::DataBreakpoint),
            "instruction breakpoint" => Some(Self::InstructionBreakpoint),
            "exited" => Some(Self::Exited),
            _ => None,
        }
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_wire_str())
    }
}

/// Exception record attached to a stop with reason `exception`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionDetails {
    pub exception_id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub break_mode: Option<String>,
}

/// One captured stdio/log entry accumulated between stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputEntry {
    pub category: String,
    pub output: String,
}

/// The publishable snapshot of the debuggee at rest.
///
/// `should_resume` drives transparent log-point continuation inside the
/// execution controller and is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopState {
    #[serde(rename = "stop_reason")]
    pub reason: StopReason,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub thread_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub location: Option<SourceLocation>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub frames: Vec<StackFrame>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub locals: Vec<Variable>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub exception: Option<ExceptionDetails>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub log_messages: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub output: Vec<OutputEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub hit_breakpoint_ids: Vec<i64>,
    #[serde(skip)]
    pub should_resume: bool,
}

impl StopState {
    pub fn new(reason: StopReason) -> Self {
        Self {
            reason,
            thread_id: None,
            location: None,
            frames: Vec::new(),
            locals: Vec::new(),
            exception: None,
            exit_code: None,
            log_messages: Vec::new(),
            output: Vec::new(),
            hit_breakpoint_ids: Vec::new(),
            should_resume: false,
        }
    }

    /// Stop state for a debuggee that exited with the given code.
    pub fn exited(exit_code: i32) -> Self {
        let mut state = Self::new(StopReason::Exited);
        state.exit_code = Some(exit_code);
        state
    }

    /// True when this stop ends the session (natural exit).
    pub fn is_exit(&self) -> bool {
        self.exit_code.is_some()
    }
}

#[cfg(test)]
#[path = "stop_tests.rs"]
mod tests;
