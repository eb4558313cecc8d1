// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single-slot pending-run record.
//!
//! The worker writes exactly one of (stop state, error token) and then
//! stores the terminal tag with release ordering; the poll path reads the
//! tag with acquire ordering before touching the payload. Single producer,
//! single consumer, one value: no queue needed.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use cog_core::StopState;
use parking_lot::Mutex;

pub(crate) const TAG_RUNNING: u8 = 0;
pub(crate) const TAG_OK: u8 = 1;
pub(crate) const TAG_ERROR: u8 = 2;

/// The atomic completion handoff between worker and poller.
pub struct RunSlot {
    tag: AtomicU8,
    stop: Mutex<Option<StopState>>,
    error: Mutex<Option<String>>,
}

impl RunSlot {
    pub(crate) fn new() -> Self {
        Self {
            tag: AtomicU8::new(TAG_RUNNING),
            stop: Mutex::new(None),
            error: Mutex::new(None),
        }
    }

    /// Worker side: publish a successful stop. The payload store strictly
    /// precedes the terminal tag store.
    pub(crate) fn complete_ok(&self, stop: StopState) {
        *self.stop.lock() = Some(stop);
        self.tag.store(TAG_OK, Ordering::Release);
    }

    /// Worker side: publish a failure token.
    pub(crate) fn complete_error(&self, token: String) {
        *self.error.lock() = Some(token);
        self.tag.store(TAG_ERROR, Ordering::Release);
    }

    pub(crate) fn tag(&self) -> u8 {
        self.tag.load(Ordering::Acquire)
    }

    pub(crate) fn take_stop(&self) -> Option<StopState> {
        self.stop.lock().take()
    }

    pub(crate) fn take_error(&self) -> Option<String> {
        self.error.lock().take()
    }
}

/// An in-flight asynchronous run: worker thread plus its completion slot
/// and owned copies of the strings used for event emission.
pub struct PendingRun {
    pub(crate) slot: Arc<RunSlot>,
    pub(crate) worker: Option<JoinHandle<()>>,
    pub(crate) session_id: String,
    pub(crate) action: String,
}

impl PendingRun {
    pub(crate) fn new(
        slot: Arc<RunSlot>,
        worker: JoinHandle<()>,
        session_id: String,
        action: String,
    ) -> Self {
        Self {
            slot,
            worker: Some(worker),
            session_id,
            action,
        }
    }

    /// True once the worker has stored a terminal tag.
    pub fn is_settled(&self) -> bool {
        self.slot.tag() != TAG_RUNNING
    }

    /// Join the worker thread. Called exactly once, after which the slot
    /// is dropped.
    pub(crate) fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
#[path = "pending_tests.rs"]
mod tests;
