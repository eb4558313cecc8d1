// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session lifecycle tools: launch, attach, load_core, sessions, stop,
//! detach, restart.

use cog_core::{LaunchConfig, RunAction, RunOptions};
use cog_engine::{spawn_run, OrphanPolicy, SessionMeta};
use serde_json::{json, Value};
use tracing::info;

use super::{args, to_result, Dispatcher};
use crate::protocol::ToolError;

fn orphan_policy(args: &Value) -> Result<OrphanPolicy, ToolError> {
    match args::optional_str(args, "on_orphan") {
        None | Some("terminate") => Ok(OrphanPolicy::Terminate),
        Some("detach") => Ok(OrphanPolicy::Detach),
        Some(other) => Err(ToolError::invalid_params(format!(
            "field `on_orphan` must be `terminate` or `detach`, got `{other}`"
        ))),
    }
}

pub(super) fn launch(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let config: LaunchConfig = serde_json::from_value(args.clone())
        .map_err(|e| ToolError::invalid_params(format!("bad launch config: {e}")))?;
    let client_pid = args::optional_i64(&args, "client_pid").map(|p| p as u32);
    let policy = orphan_policy(&args)?;

    let created = d
        .factory
        .create(&config, policy == OrphanPolicy::Detach)
        .map_err(ToolError::from)?;
    let entry_stop = created.driver.launch(&config).map_err(ToolError::from)?;

    let meta = SessionMeta {
        program: config.program.clone(),
        language: config.language.clone(),
        backend: created.backend,
    };
    let session = d.manager.create(created.driver, client_pid, policy, meta);
    let session_id = session.id().to_string();

    d.emit(json!({
        "event": "launch",
        "session_id": session_id,
        "program": config.program,
        "language": config.language,
    }));
    info!(%session_id, program = %config.program, "session launched");

    // a launch without an entry hold starts running immediately; the
    // session then owns a pending slot from the first moment
    if !config.stop_on_entry {
        spawn_run(&session, RunAction::Continue, RunOptions::default())?;
        return to_result(&json!({
            "session_id": session_id,
            "status": "running",
        }));
    }

    to_result(&json!({
        "session_id": session_id,
        "status": "stopped",
        "stop": entry_stop,
    }))
}

pub(super) fn attach(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let pid = args::require_i64(&args, "pid")? as u32;
    let language = args::optional_str(&args, "language");
    let client_pid = args::optional_i64(&args, "client_pid").map(|p| p as u32);
    let policy = orphan_policy(&args)?;

    let created = d
        .factory
        .create_for_attach(language, policy == OrphanPolicy::Detach)
        .map_err(ToolError::from)?;
    let entry_stop = created.driver.attach(pid).map_err(ToolError::from)?;

    let meta = SessionMeta {
        program: format!("pid:{pid}"),
        language: language.map(str::to_string),
        backend: created.backend,
    };
    let session = d.manager.create(created.driver, client_pid, policy, meta);
    let session_id = session.id().to_string();

    d.emit(json!({
        "event": "launch",
        "session_id": session_id,
        "attached_pid": pid,
    }));

    to_result(&json!({
        "session_id": session_id,
        "status": "stopped",
        "stop": entry_stop,
    }))
}

pub(super) fn load_core(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let core_path = args::require_str(&args, "core_path")?;
    let executable = args::require_str(&args, "executable")?;
    let policy = orphan_policy(&args)?;

    let config = LaunchConfig::new(executable);
    let created = d.factory.create(&config, false).map_err(ToolError::from)?;
    let stop = created
        .driver
        .load_core(core_path, executable)
        .map_err(ToolError::from)?;

    let meta = SessionMeta {
        program: format!("core:{core_path}"),
        language: None,
        backend: created.backend,
    };
    let session = d.manager.create(created.driver, None, policy, meta);

    to_result(&json!({
        "session_id": session.id().to_string(),
        "status": "stopped",
        "stop": stop,
    }))
}

pub(super) fn sessions(d: &Dispatcher) -> Result<String, ToolError> {
    let sessions: Vec<Value> = d
        .manager
        .list()
        .iter()
        .map(|s| {
            let id = s.id().to_string();
            let last_stop = d.last_stop_summary(&id);
            json!({
                "session_id": id,
                "status": s.status().as_str(),
                "program": s.meta().program,
                "language": s.meta().language,
                "backend": s.meta().backend,
                "last_stop": last_stop,
            })
        })
        .collect();
    to_result(&json!({ "sessions": sessions }))
}

pub(super) fn stop(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.session(&args)?;
    let session_id = session.id().to_string();

    d.manager.destroy(&session_id)?;
    d.emit(json!({ "event": "session_end", "session_id": session_id }));
    info!(%session_id, "session stopped");

    to_result(&json!({ "stopped": true }))
}

/// Terminate-only teardown: end the debuggee without the disconnect
/// path, then unwind the session. Best effort, falls back to full stop.
pub(super) fn terminate(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.session(&args)?;
    let session_id = session.id().to_string();

    if !session.has_pending() {
        if let Err(e) = session.driver().terminate() {
            tracing::debug!(%session_id, error = %e, "terminate request failed");
        }
    }
    d.manager.destroy(&session_id)?;
    d.emit(json!({ "event": "session_end", "session_id": session_id, "terminated": true }));

    to_result(&json!({ "terminated": true }))
}

pub(super) fn detach(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.session(&args)?;
    let session_id = session.id().to_string();

    d.manager.release(&session_id)?;
    d.emit(json!({ "event": "session_end", "session_id": session_id, "detached": true }));

    to_result(&json!({ "detached": true }))
}

pub(super) fn restart(d: &Dispatcher, args: Value) -> Result<String, ToolError> {
    let session = d.stopped_session(&args)?;
    let stop = session.driver().restart().map_err(ToolError::from)?;
    session.apply_stop(&stop);

    let session_id = session.id().to_string();
    d.emit(json!({ "event": "run", "session_id": session_id, "action": "restart" }));
    d.publish_stop(&session_id, "restart", &stop);

    to_result(&json!({
        "session_id": session_id,
        "status": session.status().as_str(),
        "stop": stop,
    }))
}
