// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution-control actions and options.

use serde::{Deserialize, Serialize};

/// An execution-control action.
///
/// Asynchronous actions (`continue`, the steps) go through the pending-run
/// slot and complete via `poll_events`; `pause`, `restart`, and `goto` run
/// synchronously and return a full stop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunAction {
    Continue,
    StepOver,
    StepIn,
    StepOut,
    StepBack,
    Pause,
    Restart,
    Goto,
}

impl RunAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Continue => "continue",
            Self::StepOver => "step_over",
            Self::StepIn => "step_in",
            Self::StepOut => "step_out",
            Self::StepBack => "step_back",
            Self::Pause => "pause",
            Self::Restart => "restart",
            Self::Goto => "goto",
        }
    }

    /// Parse a wire action string. Accepts the stock adapter spellings
    /// (`next`, `stepIn`, ...) as aliases.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "continue" => Some(Self::Continue),
            "step_over" | "next" | "step" => Some(Self::StepOver),
            "step_in" | "stepIn" => Some(Self::StepIn),
            "step_out" | "stepOut" => Some(Self::StepOut),
            "step_back" | "stepBack" => Some(Self::StepBack),
            "pause" => Some(Self::Pause),
            "restart" => Some(Self::Restart),
            "goto" => Some(Self::Goto),
            _ => None,
        }
    }

    /// True for actions that fire-then-poll through the pending-run slot.
    pub fn is_async(&self) -> bool {
        matches!(
            self,
            Self::Continue | Self::StepOver | Self::StepIn | Self::StepOut | Self::StepBack
        )
    }
}

impl std::fmt::Display for RunAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How far a step moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SteppingGranularity {
    Statement,
    Line,
    Instruction,
}

impl SteppingGranularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Statement => "statement",
            Self::Line => "line",
            Self::Instruction => "instruction",
        }
    }
}

/// Options accompanying a run action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunOptions {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub thread_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub granularity: Option<SteppingGranularity>,
    #[serde(default)]
    pub single_thread: bool,
    /// Step-in target id from `step_in_targets`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub target_id: Option<i64>,
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
