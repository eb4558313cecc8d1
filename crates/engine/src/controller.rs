// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The async execution controller.
//!
//! `run` must never block the client transport: dispatch spawns a worker
//! bound to the session, the worker blocks in the driver, and completion is
//! published through the pending slot for `poll_events` to promote.

use std::sync::Arc;

use cog_core::{DriverResult, RunAction, RunOptions, StopState};
use cog_drivers::DebugDriver;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::pending::{PendingRun, RunSlot, TAG_ERROR, TAG_OK, TAG_RUNNING};
use crate::session::{Session, SessionStatus};

/// A promoted completion, ready to become a poll event.
#[derive(Debug)]
pub enum RunCompletion {
    Stopped {
        session_id: String,
        action: String,
        stop: StopState,
    },
    Failed {
        session_id: String,
        action: String,
        error: String,
    },
}

/// Start an asynchronous run for the session.
///
/// Rejected when the session is already running or holds a pending slot.
/// On success the session is running and the caller returns immediately;
/// the result surfaces through [`promote`].
pub fn spawn_run(
    session: &Arc<Session>,
    action: RunAction,
    options: RunOptions,
) -> Result<(), EngineError> {
    // the slot lock is held across the whole dispatch so two concurrent
    // runs cannot both claim it
    let mut pending = session.pending_lock();
    if pending.is_some() {
        return Err(EngineError::RunPending);
    }
    if session.status() == SessionStatus::Running {
        return Err(EngineError::SessionRunning);
    }

    session.set_status(SessionStatus::Running);

    let slot = Arc::new(RunSlot::new());
    let session_id = session.id().to_string();
    let action_name = action.to_string();

    let worker = {
        let slot = Arc::clone(&slot);
        let session = Arc::clone(session);
        std::thread::Builder::new()
            .name(format!("run-{session_id}"))
            .spawn(move || {
                match run_to_completion(session.driver(), action, &options) {
                    Ok(stop) => slot.complete_ok(stop),
                    Err(e) => {
                        debug!(error = %e, "run worker finished with error");
                        slot.complete_error(e.to_string());
                    }
                }
            })
    };

    match worker {
        Ok(handle) => {
            *pending = Some(PendingRun::new(slot, handle, session_id, action_name));
            Ok(())
        }
        Err(e) => {
            session.set_status(SessionStatus::Stopped);
            Err(EngineError::SpawnFailed(e.to_string()))
        }
    }
}

/// Drive the blocking run, transparently resuming over log-point stops.
///
/// Log messages from intermediate stops accumulate onto the terminal stop;
/// the intermediate stops themselves are never published.
fn run_to_completion(
    driver: &dyn DebugDriver,
    action: RunAction,
    options: &RunOptions,
) -> DriverResult<StopState> {
    let mut accumulated: Vec<String> = Vec::new();
    let mut stop = driver.run(action, options)?;

    while stop.should_resume {
        accumulated.append(&mut stop.log_messages);
        stop = driver.run(RunAction::Continue, options)?;
    }

    if !accumulated.is_empty() {
        accumulated.append(&mut stop.log_messages);
        stop.log_messages = accumulated;
    }
    Ok(stop)
}

/// Promote a settled pending run, if any.
///
/// Reads the completion tag with acquire ordering; on a terminal value the
/// worker is joined, the session status updated (terminated iff the stop
/// carries an exit code), and the slot freed.
pub fn promote(session: &Session) -> Option<RunCompletion> {
    let mut pending_guard = session.pending_lock();
    let tag = pending_guard.as_ref()?.slot.tag();
    if tag == TAG_RUNNING {
        return None;
    }

    let mut pending = pending_guard.take()?;
    drop(pending_guard);
    pending.join();

    match tag {
        TAG_OK => {
            let stop = pending.slot.take_stop()?;
            session.apply_stop(&stop);
            info!(
                session_id = %pending.session_id,
                action = %pending.action,
                reason = %stop.reason,
                "run completed"
            );
            Some(RunCompletion::Stopped {
                session_id: pending.session_id,
                action: pending.action,
                stop,
            })
        }
        TAG_ERROR => {
            let error = pending
                .slot
                .take_error()
                .unwrap_or_else(|| "unknown".to_string());
            session.set_status(SessionStatus::Stopped);
            warn!(
                session_id = %pending.session_id,
                action = %pending.action,
                error = %error,
                "run failed"
            );
            Some(RunCompletion::Failed {
                session_id: pending.session_id,
                action: pending.action,
                error,
            })
        }
        _ => None,
    }
}

/// Cancel a blocked run during session teardown.
///
/// Never calls the driver's stop path while the worker is in flight:
/// the debuggee is killed directly by pid so the worker unwinds on its
/// own, then joined. The settled result is discarded, so a killed run
/// publishes no synthetic stopped event. With no known pid the driver is
/// torn down instead, which wakes the worker with `Gone`.
pub(crate) fn abort_pending(session: &Session) {
    let Some(mut pending) = session.take_pending() else {
        return;
    };

    if pending.slot.tag() == TAG_RUNNING {
        match session.debuggee_pid() {
            Some(pid) => {
                debug!(pid, "killing debuggee to unblock run worker");
                let _ = kill(Pid::from_raw(pid as i32), Some(Signal::SIGKILL));
            }
            None => {
                let _ = session.driver().terminate();
            }
        }
    }

    pending.join();
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
