// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapter catalog: which debug adapter serves which language.

use cog_core::{DriverError, DriverResult, LaunchConfig};

/// How to start a debug adapter subprocess, plus the hint shown when the
/// binary is missing from the machine.
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterCommand {
    pub command: String,
    pub args: Vec<String>,
    pub install_hint: Option<String>,
}

impl AdapterCommand {
    fn new(command: &str, args: &[&str], hint: &str) -> Self {
        Self {
            command: command.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            install_hint: Some(hint.to_string()),
        }
    }
}

/// True when the launch config targets the in-process native engine
/// rather than an external adapter.
pub fn is_native(config: &LaunchConfig) -> bool {
    if config.adapter.is_some() {
        return false;
    }
    matches!(config.language.as_deref(), None | Some("native"))
}

/// Resolve the adapter command for a launch config.
///
/// An explicit `adapter` override wins; otherwise the language picks from
/// the catalog. Unknown languages fail NotSupported so the client sees a
/// -32001 with the language named.
pub(crate) fn resolve(config: &LaunchConfig) -> DriverResult<AdapterCommand> {
    if let Some(adapter) = &config.adapter {
        return Ok(AdapterCommand {
            command: adapter.clone(),
            args: config.adapter_args.clone(),
            install_hint: None,
        });
    }

    let language = config.language.as_deref().unwrap_or("native");
    resolve_language(language)
}

pub(crate) fn resolve_language(language: &str) -> DriverResult<AdapterCommand> {
    match language {
        "python" => Ok(AdapterCommand::new(
            "python3",
            &["-m", "debugpy.adapter"],
            "pip install debugpy",
        )),
        "node" | "javascript" | "typescript" => Ok(AdapterCommand::new(
            "js-debug-adapter",
            &[],
            "npm install -g @vscode/js-debug",
        )),
        "go" => Ok(AdapterCommand::new(
            "dlv",
            &["dap"],
            "go install github.com/go-delve/delve/cmd/dlv@latest",
        )),
        "ruby" => Ok(AdapterCommand::new(
            "rdbg",
            &["--open"],
            "gem install debug",
        )),
        "c" | "cpp" | "c++" | "rust" => Ok(AdapterCommand::new(
            "codelldb",
            &["--port", "0"],
            "install codelldb (vadimcn.vscode-lldb) and put it on PATH",
        )),
        other => Err(DriverError::NotSupported(format!(
            "no debug adapter registered for language `{other}`"
        ))),
    }
}

/// Map a spawn failure onto the driver taxonomy, attaching the install
/// hint when the adapter binary was simply not found.
pub(crate) fn spawn_error(cmd: &AdapterCommand, err: &std::io::Error) -> DriverError {
    if err.kind() == std::io::ErrorKind::NotFound {
        let hint = cmd
            .install_hint
            .as_deref()
            .map(|h| format!(" (install with: {h})"))
            .unwrap_or_default();
        DriverError::NotSupported(format!("debug adapter `{}` not found{hint}", cmd.command))
    } else {
        DriverError::Other(format!("failed to spawn adapter `{}`: {err}", cmd.command))
    }
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
