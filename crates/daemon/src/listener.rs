// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for client socket I/O.
//!
//! One request per connection: read a line, dispatch on the blocking
//! pool (tool handlers may wait on drivers), write the envelope, close.
//! The accept loop itself never blocks on a debuggee.

use std::sync::Arc;

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, warn};

use crate::dispatch::Dispatcher;
use crate::protocol::{self, ToolError};
use crate::protocol_wire::{self, ProtocolError};

/// Listener task accepting client connections.
pub struct Listener {
    socket: UnixListener,
    dispatcher: Arc<Dispatcher>,
}

impl Listener {
    pub fn new(socket: UnixListener, dispatcher: Arc<Dispatcher>) -> Self {
        Self { socket, dispatcher }
    }

    /// Accept until the daemon shuts down, spawning a task per connection.
    pub async fn run(self) {
        loop {
            match self.socket.accept().await {
                Ok((stream, _)) => {
                    let dispatcher = Arc::clone(&self.dispatcher);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, dispatcher).await {
                            match e {
                                ProtocolError::ConnectionClosed => debug!("client disconnected"),
                                ProtocolError::Timeout => warn!("connection timeout"),
                                other => error!("connection error: {other}"),
                            }
                        }
                    });
                }
                Err(e) => {
                    error!("accept error: {e}");
                }
            }
        }
    }
}

/// Handle one connection: exactly one request, one response.
pub async fn handle_connection(
    stream: UnixStream,
    dispatcher: Arc<Dispatcher>,
) -> Result<(), ProtocolError> {
    let timeout = crate::env::timeout_ipc();
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    let line = protocol_wire::read_line(&mut reader, timeout).await?;

    let envelope = match serde_json::from_str::<protocol::Request>(&line) {
        Ok(request) => {
            debug!(tool = %request.tool, "dispatching");
            let result = tokio::task::spawn_blocking(move || {
                dispatcher.call_tool(&request.tool, request.args)
            })
            .await
            .unwrap_or_else(|e| Err(ToolError::internal(format!("dispatch panicked: {e}"))));

            match result {
                Ok(result_json) => protocol::ok_envelope(&result_json),
                Err(error) => protocol::err_envelope(&error),
            }
        }
        Err(e) => protocol::err_envelope(&ToolError::parse(format!("bad request: {e}"))),
    };

    protocol_wire::write_line(&mut writer, &envelope, timeout).await?;
    writer.shutdown().await?;
    Ok(())
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
