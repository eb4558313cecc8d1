// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session lifecycle and the async execution controller.
//!
//! The [`SessionManager`] owns the registry binding each session to exactly
//! one driver; the controller turns blocking `run` calls into worker
//! threads publishing through a single-slot atomic handoff, drained by
//! `poll_events`.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod controller;
mod error;
mod manager;
mod pending;
mod session;

pub use controller::{promote, spawn_run, RunCompletion};
pub use error::EngineError;
pub use manager::{ReapedSession, SessionManager};
pub use pending::{PendingRun, RunSlot};
pub use session::{OrphanPolicy, Session, SessionMeta, SessionStatus};
