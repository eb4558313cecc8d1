// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error types.

use thiserror::Error;

/// Errors from the session registry and execution controller.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown session: {0}")]
    UnknownSession(String),

    #[error("session is running")]
    SessionRunning,

    #[error("a run is already pending for this session")]
    RunPending,

    #[error("worker spawn failed: {0}")]
    SpawnFailed(String),
}
