// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Launch configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Everything needed to start (or re-start) a debuggee.
///
/// `language` selects the backend: a known scripting/runtime language picks
/// the matching debug adapter, absence (or `native`) picks the in-process
/// native engine. `adapter` overrides the catalog with an explicit adapter
/// command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default = "default_stop_on_entry")]
    pub stop_on_entry: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub adapter: Option<String>,
    #[serde(default)]
    pub adapter_args: Vec<String>,
}

fn default_stop_on_entry() -> bool {
    true
}

impl LaunchConfig {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: HashMap::new(),
            stop_on_entry: true,
            language: None,
            adapter: None,
            adapter_args: Vec::new(),
        }
    }
}

#[cfg(test)]
#[path = "launch_tests.rs"]
mod tests;
