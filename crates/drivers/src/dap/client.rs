// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request/response correlation against the adapter subprocess.
//!
//! Outgoing requests allocate the next sequence number and register a
//! pending entry (mutex + condvar mailbox) under it; the reader thread
//! deposits the matching response and signals. Callers time out after the
//! driver-wide deadline; teardown retires everything with `Gone`.

use std::collections::HashMap;
use std::process::ChildStdin;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use cog_core::{DriverError, DriverResult};
use parking_lot::{Condvar, Mutex};
use serde_json::Value;
use tracing::{debug, trace, warn};

use super::transport::{self, DapResponse, OutgoingRequest, OutgoingResponse, ReverseRequest};

/// Default deadline for adapter requests.
pub(crate) const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Why a pending entry was retired without a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AbortReason {
    /// Session shutdown or adapter death.
    Gone,
    /// Explicit `cancel` aimed at this request.
    Cancelled,
}

#[derive(Debug)]
enum PendingState {
    Waiting,
    Done(DapResponse),
    Aborted(AbortReason),
}

/// One in-flight request's mailbox.
#[derive(Debug)]
pub(crate) struct PendingEntry {
    state: Mutex<PendingState>,
    cond: Condvar,
}

impl PendingEntry {
    fn new() -> Self {
        Self {
            state: Mutex::new(PendingState::Waiting),
            cond: Condvar::new(),
        }
    }
}

/// Writer half + correlation table for one adapter subprocess.
pub(crate) struct DapClient {
    stdin: Mutex<ChildStdin>,
    seq: AtomicI64,
    pending: Mutex<HashMap<i64, Arc<PendingEntry>>>,
    alive: AtomicBool,
    deadline: Duration,
}

impl DapClient {
    pub fn new(stdin: ChildStdin, deadline: Duration) -> Self {
        Self {
            stdin: Mutex::new(stdin),
            seq: AtomicI64::new(0),
            pending: Mutex::new(HashMap::new()),
            alive: AtomicBool::new(true),
            deadline,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Sequence numbers are integers >= 1, unique for the session lifetime.
    fn next_seq(&self) -> i64 {
        self.seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Send a request and return its sequence number plus pending entry.
    /// The caller decides when (and whether) to block on the reply.
    pub fn send_request(
        &self,
        command: &str,
        arguments: Option<&Value>,
    ) -> DriverResult<(i64, Arc<PendingEntry>)> {
        if !self.is_alive() {
            return Err(DriverError::Gone("adapter has exited".into()));
        }

        let seq = self.next_seq();
        let entry = Arc::new(PendingEntry::new());
        self.pending.lock().insert(seq, Arc::clone(&entry));

        let frame = OutgoingRequest::new(seq, command, arguments);
        let body = serde_json::to_vec(&frame)
            .map_err(|e| DriverError::Protocol(format!("encode {command}: {e}")))?;

        trace!(seq, command, "sending adapter request");
        let result = {
            let mut stdin = self.stdin.lock();
            transport::write_frame(&mut *stdin, &body)
        };
        if let Err(e) = result {
            self.pending.lock().remove(&seq);
            return Err(DriverError::Gone(format!("adapter pipe write failed: {e}")));
        }

        Ok((seq, entry))
    }

    /// Block until the entry resolves or the driver-wide deadline passes.
    /// A response arriving after a timeout is discarded by the reader.
    pub fn wait(&self, seq: i64, entry: &PendingEntry) -> DriverResult<DapResponse> {
        let deadline = Instant::now() + self.deadline;
        let mut state = entry.state.lock();
        loop {
            match &*state {
                PendingState::Waiting => {}
                PendingState::Done(response) => {
                    let response = response.clone();
                    return check_success(response);
                }
                PendingState::Aborted(AbortReason::Gone) => {
                    return Err(DriverError::Gone("adapter request cancelled: session shutdown".into()))
                }
                PendingState::Aborted(AbortReason::Cancelled) => {
                    return Err(DriverError::Other("request cancelled".into()))
                }
            }

            let now = Instant::now();
            if now >= deadline {
                drop(state);
                self.pending.lock().remove(&seq);
                return Err(DriverError::Timeout(format!(
                    "adapter request timed out after {}s",
                    self.deadline.as_secs()
                )));
            }
            self.cond_wait_until(entry, &mut state, deadline);
        }
    }

    fn cond_wait_until(
        &self,
        entry: &PendingEntry,
        state: &mut parking_lot::MutexGuard<'_, PendingState>,
        deadline: Instant,
    ) {
        let timeout = deadline.saturating_duration_since(Instant::now());
        entry.cond.wait_for(state, timeout);
    }

    /// Send a request and wait for its successful body.
    pub fn request(&self, command: &str, arguments: Option<Value>) -> DriverResult<Value> {
        let (seq, entry) = self.send_request(command, arguments.as_ref())?;
        let response = self.wait(seq, &entry)?;
        Ok(response.body.unwrap_or(Value::Null))
    }

    /// Reader-side completion: deposit the response under its request_seq.
    pub fn complete(&self, response: DapResponse) {
        let entry = self.pending.lock().remove(&response.request_seq);
        match entry {
            Some(entry) => {
                let mut state = entry.state.lock();
                *state = PendingState::Done(response);
                entry.cond.notify_all();
            }
            None => {
                // late arrival after timeout or cancel: drop it
                debug!(
                    request_seq = response.request_seq,
                    command = %response.command,
                    "discarding response with no pending entry"
                );
            }
        }
    }

    /// Abort one pending entry (explicit cancel).
    pub fn abort(&self, seq: i64) {
        if let Some(entry) = self.pending.lock().remove(&seq) {
            let mut state = entry.state.lock();
            *state = PendingState::Aborted(AbortReason::Cancelled);
            entry.cond.notify_all();
        }
    }

    /// Retire every pending entry. Called on session teardown and when the
    /// adapter pipe breaks.
    pub fn fail_all(&self) {
        self.alive.store(false, Ordering::Release);
        let entries: Vec<_> = self.pending.lock().drain().collect();
        for (seq, entry) in entries {
            trace!(seq, "cancelling pending adapter request");
            let mut state = entry.state.lock();
            *state = PendingState::Aborted(AbortReason::Gone);
            entry.cond.notify_all();
        }
    }

    /// Decline an adapter reverse request (runInTerminal etc.); the proxy
    /// does not host terminals.
    pub fn decline_reverse(&self, request: &ReverseRequest) {
        let seq = self.next_seq();
        let frame = OutgoingResponse {
            seq,
            kind: "response",
            request_seq: request.seq,
            success: false,
            command: &request.command,
            message: Some("not supported by this client"),
        };
        let Ok(body) = serde_json::to_vec(&frame) else {
            return;
        };
        let mut stdin = self.stdin.lock();
        if let Err(e) = transport::write_frame(&mut *stdin, &body) {
            warn!(command = %request.command, error = %e, "failed to decline reverse request");
        }
    }
}

fn check_success(response: DapResponse) -> DriverResult<DapResponse> {
    if response.success {
        Ok(response)
    } else {
        let detail = response
            .message
            .unwrap_or_else(|| "request failed".to_string());
        Err(DriverError::Protocol(format!(
            "{}: {detail}",
            response.command
        )))
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
