// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Driver notifications and the per-driver FIFO drained by `poll_events`.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// One queued driver notification.
///
/// `params` is the payload exactly as the driver produced it; the dispatcher
/// splices it into the outer response without re-serializing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub method: String,
    pub params: Box<RawValue>,
}

impl Notification {
    pub fn new(method: impl Into<String>, params: Box<RawValue>) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    /// Serialize `body` once and wrap it as a notification.
    pub fn from_value(
        method: impl Into<String>,
        body: &serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            method: method.into(),
            params: serde_json::value::to_raw_value(body)?,
        })
    }
}

/// Shared FIFO of notifications for one driver.
///
/// The queue handle is cloned into the session at creation so draining never
/// goes through the driver itself (and never blocks).
#[derive(Clone, Default)]
pub struct NotificationQueue {
    inner: Arc<Mutex<VecDeque<Notification>>>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, notification: Notification) {
        self.inner.lock().push_back(notification);
    }

    /// Move the queued notifications out in FIFO order, clearing the queue.
    pub fn drain(&self) -> Vec<Notification> {
        let mut queue = self.inner.lock();
        queue.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
#[path = "notification_tests.rs"]
mod tests;
