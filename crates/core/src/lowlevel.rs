// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Memory, register, disassembly, and module shapes.

use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// A chunk of debuggee memory. Data travels base64-encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryChunk {
    /// Hex address (`0x...`) the chunk starts at.
    pub address: String,
    pub data: String,
    pub byte_count: usize,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub unreadable_bytes: Option<u64>,
}

impl MemoryChunk {
    pub fn new(address: u64, bytes: &[u8]) -> Self {
        Self {
            address: format!("{address:#x}"),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            byte_count: bytes.len(),
            unreadable_bytes: None,
        }
    }

    /// Wrap an already-encoded payload (adapter pass-through).
    pub fn from_base64(address: String, data: String, byte_count: usize) -> Self {
        Self {
            address,
            data,
            byte_count,
            unreadable_bytes: None,
        }
    }

    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        base64::engine::general_purpose::STANDARD.decode(&self.data)
    }
}

/// One machine register and its rendered value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Register {
    pub name: String,
    pub value: String,
}

/// One disassembled instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub bytes: Option<String>,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub symbol: Option<String>,
}

/// A loaded module (shared object, dylib, script package).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub path: Option<String>,
}

/// A source the debuggee has loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadedSource {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source_reference: Option<i64>,
}

#[cfg(test)]
#[path = "lowlevel_tests.rs"]
mod tests;
