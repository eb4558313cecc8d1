// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fire-and-forget event stream to the dashboard observer socket.
//!
//! Connects lazily on first emit, probes the peer for HUP before each
//! send, closes on any error, and retries connecting at most once every
//! five seconds. Delivery failure is never surfaced to callers.

use std::io::IoSlice;
use std::io::Write;
use std::os::fd::AsFd;
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use parking_lot::Mutex;
use tracing::{debug, trace};

/// Minimum time between reconnect attempts while the observer is away.
const RETRY_BACKOFF: Duration = Duration::from_secs(5);

struct SinkState {
    stream: Option<UnixStream>,
    last_attempt: Option<Instant>,
}

/// One-way sink for dashboard events.
pub struct DashboardSink {
    path: PathBuf,
    state: Mutex<SinkState>,
}

impl DashboardSink {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            state: Mutex::new(SinkState {
                stream: None,
                last_attempt: None,
            }),
        }
    }

    /// Emit one event object. Best effort: errors close the socket and
    /// are swallowed.
    pub fn emit(&self, event: &serde_json::Value) {
        let Ok(body) = serde_json::to_vec(event) else {
            return;
        };

        let mut state = self.state.lock();
        if state.stream.is_none() && !self.try_connect(&mut state) {
            return;
        }

        let Some(stream) = state.stream.as_mut() else {
            return;
        };

        if peer_hung_up(stream) {
            debug!("dashboard observer went away");
            state.stream = None;
            return;
        }

        // one vectored write: body + trailing newline, atomically
        let total = body.len() + 1;
        match stream.write_vectored(&[IoSlice::new(&body), IoSlice::new(b"\n")]) {
            Ok(n) if n == total => trace!(bytes = total, "dashboard event sent"),
            Ok(_) | Err(_) => {
                debug!("dashboard write failed, closing");
                state.stream = None;
            }
        }
    }

    fn try_connect(&self, state: &mut SinkState) -> bool {
        if let Some(last) = state.last_attempt {
            if last.elapsed() < RETRY_BACKOFF {
                return false;
            }
        }
        state.last_attempt = Some(Instant::now());

        match UnixStream::connect(&self.path) {
            Ok(stream) => {
                debug!(path = %self.path.display(), "dashboard observer connected");
                state.stream = Some(stream);
                true
            }
            Err(e) => {
                trace!(error = %e, "dashboard observer unavailable");
                false
            }
        }
    }
}

/// Zero-timeout poll for HUP/ERR so a silently-dead peer is detected
/// before writing into a broken pipe.
fn peer_hung_up(stream: &UnixStream) -> bool {
    let fd = stream.as_fd();
    let mut fds = [PollFd::new(fd, PollFlags::POLLHUP | PollFlags::POLLERR)];
    match poll(&mut fds, PollTimeout::ZERO) {
        Ok(0) => false,
        Ok(_) => fds[0]
            .revents()
            .map(|r| {
                r.intersects(PollFlags::POLLHUP | PollFlags::POLLERR | PollFlags::POLLNVAL)
            })
            .unwrap_or(true),
        Err(_) => true,
    }
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;
