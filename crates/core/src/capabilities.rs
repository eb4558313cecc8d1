// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Driver capability flags.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The feature flags a driver supports.
///
/// Stored as an opaque JSON object so an adapter's capability reply can be
/// kept verbatim; only flags that are `true` surface. Clients query this at
/// session creation to discover which operations are available.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capabilities(Map<String, Value>);

impl Capabilities {
    /// Build from an adapter's capability reply, keeping only true flags.
    pub fn from_reply(value: &Value) -> Self {
        let mut flags = Map::new();
        if let Value::Object(map) = value {
            for (key, val) in map {
                if val.as_bool() == Some(true) {
                    flags.insert(key.clone(), Value::Bool(true));
                }
            }
        }
        Self(flags)
    }

    /// Build from a static flag list (native engine, fakes).
    pub fn from_flags<'a>(flags: impl IntoIterator<Item = &'a str>) -> Self {
        let mut map = Map::new();
        for flag in flags {
            map.insert(flag.to_string(), Value::Bool(true));
        }
        Self(map)
    }

    pub fn supports(&self, flag: &str) -> bool {
        self.0.get(flag).and_then(Value::as_bool) == Some(true)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn flags(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

#[cfg(test)]
#[path = "capabilities_tests.rs"]
mod tests;
