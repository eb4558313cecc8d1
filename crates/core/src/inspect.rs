// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inspection and introspection request/result shapes.

use serde::{Deserialize, Serialize};

use crate::frame::Variable;

/// What to inspect: an expression evaluated at a frame, or the children of
/// a structured value by its variables reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InspectRequest {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub variables_reference: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub frame_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub context: Option<String>,
}

impl InspectRequest {
    pub fn expression(expr: impl Into<String>) -> Self {
        Self {
            expression: Some(expr.into()),
            ..Self::default()
        }
    }
}

/// Result of an inspect: the rendered value plus expandable children.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InspectResult {
    pub value: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
    pub ty: Option<String>,
    #[serde(default)]
    pub variables_reference: i64,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub children: Vec<Variable>,
}

/// One completion proposal for a partial expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionItem {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub text: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
    pub ty: Option<String>,
}

/// A function the debuggee could step into from the current frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepInTarget {
    pub id: i64,
    pub label: String,
}

/// A location execution can jump to within a source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GotoTarget {
    pub id: i64,
    pub label: String,
    pub line: u32,
}

/// Resolved symbol information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub line: Option<u32>,
}

/// Where a variable lives at the current stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableLocation {
    pub name: String,
    /// `register`, `memory`, or `unknown`.
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub register: Option<String>,
}
