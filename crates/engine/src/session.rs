// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-debuggee session record.

use cog_core::{Capabilities, NotificationQueue, SessionId, StopState};
use cog_drivers::DebugDriver;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::pending::PendingRun;

/// Session state machine: running <-> stopped with a one-way terminal edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Created,
    Running,
    Stopped,
    Terminated,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Terminated => "terminated",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What to do with the debuggee when the owning client dies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrphanPolicy {
    #[default]
    Terminate,
    Detach,
}

/// Descriptive fields surfaced by `sessions` and dashboard events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionMeta {
    pub program: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub language: Option<String>,
    pub backend: String,
}

/// One debuggee under the control of one driver.
///
/// The driver handle is never replaced after creation. The notification
/// queue and capability set are snapshotted here so polling and discovery
/// never have to go through the driver itself.
pub struct Session {
    id: SessionId,
    driver: Box<dyn DebugDriver>,
    status: Mutex<SessionStatus>,
    pending: Mutex<Option<PendingRun>>,
    notifications: NotificationQueue,
    capabilities: Capabilities,
    client_pid: Option<u32>,
    on_orphan: OrphanPolicy,
    meta: SessionMeta,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("client_pid", &self.client_pid)
            .field("on_orphan", &self.on_orphan)
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub(crate) fn new(
        id: SessionId,
        driver: Box<dyn DebugDriver>,
        client_pid: Option<u32>,
        on_orphan: OrphanPolicy,
        meta: SessionMeta,
    ) -> Self {
        let notifications = driver.notifications();
        let capabilities = driver.capabilities();
        Self {
            id,
            driver,
            status: Mutex::new(SessionStatus::Created),
            pending: Mutex::new(None),
            notifications,
            capabilities,
            client_pid,
            on_orphan,
            meta,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn driver(&self) -> &dyn DebugDriver {
        self.driver.as_ref()
    }

    pub fn status(&self) -> SessionStatus {
        *self.status.lock()
    }

    pub fn set_status(&self, status: SessionStatus) {
        *self.status.lock() = status;
    }

    /// Apply a published stop: terminated when it carries an exit code,
    /// stopped otherwise.
    pub fn apply_stop(&self, stop: &StopState) {
        let next = if stop.is_exit() {
            SessionStatus::Terminated
        } else {
            SessionStatus::Stopped
        };
        self.set_status(next);
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    pub fn client_pid(&self) -> Option<u32> {
        self.client_pid
    }

    pub fn on_orphan(&self) -> OrphanPolicy {
        self.on_orphan
    }

    pub fn meta(&self) -> &SessionMeta {
        &self.meta
    }

    pub fn debuggee_pid(&self) -> Option<u32> {
        self.driver.debuggee_pid()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.lock().is_some()
    }

    pub(crate) fn take_pending(&self) -> Option<PendingRun> {
        self.pending.lock().take()
    }

    pub(crate) fn pending_lock(&self) -> parking_lot::MutexGuard<'_, Option<PendingRun>> {
        self.pending.lock()
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
