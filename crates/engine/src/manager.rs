// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The session registry.

use std::collections::HashMap;
use std::sync::Arc;

use cog_core::SessionId;
use cog_drivers::DebugDriver;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::controller;
use crate::error::EngineError;
use crate::session::{OrphanPolicy, Session, SessionMeta, SessionStatus};

/// Owns every live session. The registry mutex is held only for
/// lookup/insert/remove; sessions carry their own locks, so nothing
/// blocking ever happens under it.
#[derive(Default)]
pub struct SessionManager {
    sessions: Mutex<HashMap<String, Arc<Session>>>,
}

/// A session removed by the orphan watchdog, for event emission.
#[derive(Debug)]
pub struct ReapedSession {
    pub session_id: SessionId,
    pub policy: OrphanPolicy,
    pub client_pid: u32,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a driver as a new session under a fresh opaque id.
    ///
    /// The driver has already completed launch/attach, so its capability
    /// set and notification queue are snapshotted here.
    pub fn create(
        &self,
        driver: Box<dyn DebugDriver>,
        client_pid: Option<u32>,
        on_orphan: OrphanPolicy,
        meta: SessionMeta,
    ) -> Arc<Session> {
        let mut sessions = self.sessions.lock();
        let id = loop {
            let candidate = SessionId::generate();
            if !sessions.contains_key(candidate.as_str()) {
                break candidate;
            }
        };

        let session = Arc::new(Session::new(id.clone(), driver, client_pid, on_orphan, meta));
        session.set_status(SessionStatus::Stopped);
        sessions.insert(id.to_string(), Arc::clone(&session));
        info!(session_id = %id, "session created");
        session
    }

    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.lock().get(id).cloned()
    }

    pub fn lookup(&self, id: &str) -> Result<Arc<Session>, EngineError> {
        self.get(id)
            .ok_or_else(|| EngineError::UnknownSession(id.to_string()))
    }

    /// Live sessions, ordered by id for stable listings.
    pub fn list(&self) -> Vec<Arc<Session>> {
        let mut sessions: Vec<Arc<Session>> = self.sessions.lock().values().cloned().collect();
        sessions.sort_by(|a, b| a.id().as_str().cmp(b.id().as_str()));
        sessions
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Destroy a session: cancel any blocked run, tear the driver down,
    /// free the id.
    pub fn destroy(&self, id: &str) -> Result<(), EngineError> {
        let session = self
            .sessions
            .lock()
            .remove(id)
            .ok_or_else(|| EngineError::UnknownSession(id.to_string()))?;

        controller::abort_pending(&session);
        if let Err(e) = session.driver().stop() {
            warn!(session_id = id, error = %e, "driver teardown failed");
        }
        session.set_status(SessionStatus::Terminated);
        info!(session_id = id, "session destroyed");
        Ok(())
    }

    /// Release a session: detach the driver so the debuggee keeps
    /// running, then unwind the session record.
    pub fn release(&self, id: &str) -> Result<(), EngineError> {
        let session = self
            .sessions
            .lock()
            .remove(id)
            .ok_or_else(|| EngineError::UnknownSession(id.to_string()))?;

        if let Err(e) = session.driver().detach() {
            warn!(session_id = id, error = %e, "detach failed");
        }
        if let Some(mut pending) = session.take_pending() {
            pending.join();
        }
        session.set_status(SessionStatus::Terminated);
        info!(session_id = id, "session released");
        Ok(())
    }

    /// Apply orphan policies for sessions whose client process died.
    pub fn reap_orphans(&self) -> Vec<ReapedSession> {
        let candidates: Vec<(String, u32, OrphanPolicy)> = {
            let sessions = self.sessions.lock();
            sessions
                .values()
                .filter_map(|s| {
                    s.client_pid()
                        .map(|pid| (s.id().to_string(), pid, s.on_orphan()))
                })
                .collect()
        };

        let mut reaped = Vec::new();
        for (id, pid, policy) in candidates {
            if process_alive(pid) {
                continue;
            }
            info!(session_id = %id, client_pid = pid, ?policy, "client died, reaping session");
            match policy {
                OrphanPolicy::Terminate => {
                    let _ = self.destroy(&id);
                }
                OrphanPolicy::Detach => {
                    if let Some(session) = self.sessions.lock().remove(&id) {
                        // let the debuggee keep running, then unwind
                        if let Err(e) = session.driver().detach() {
                            warn!(session_id = %id, error = %e, "detach failed");
                        }
                        if let Some(mut pending) = session.take_pending() {
                            pending.join();
                        }
                        session.set_status(SessionStatus::Terminated);
                    }
                }
            }
            reaped.push(ReapedSession {
                session_id: SessionId::new(id),
                policy,
                client_pid: pid,
            });
        }
        reaped
    }

    /// Destroy everything (daemon shutdown).
    pub fn shutdown(&self) {
        let ids: Vec<String> = self.sessions.lock().keys().cloned().collect();
        for id in ids {
            let _ = self.destroy(&id);
        }
    }
}

fn process_alive(pid: u32) -> bool {
    kill(Pid::from_raw(pid as i32), None).is_ok()
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
