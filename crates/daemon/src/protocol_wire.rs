// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire format for the client socket.
//!
//! One UTF-8 line of JSON per request, one line back. Anything bigger than
//! the line cap or slower than the timeout drops the connection.

use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt};

use super::protocol::Request;

/// Maximum request/response line (8 MiB).
pub const MAX_LINE_SIZE: usize = 8 * 1024 * 1024;

/// Protocol errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Line too long: {size} bytes (max {max})")]
    LineTooLong { size: usize, max: usize },

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Timeout")]
    Timeout,
}

/// Read one newline-terminated JSON line.
pub async fn read_line<R: AsyncBufReadExt + Unpin>(
    reader: &mut R,
    timeout: Duration,
) -> Result<String, ProtocolError> {
    let mut line = String::new();
    let n = tokio::time::timeout(timeout, reader.read_line(&mut line))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    if n == 0 {
        return Err(ProtocolError::ConnectionClosed);
    }
    if line.len() > MAX_LINE_SIZE {
        return Err(ProtocolError::LineTooLong {
            size: line.len(),
            max: MAX_LINE_SIZE,
        });
    }
    Ok(line)
}

/// Read and decode one request.
pub async fn read_request<R: AsyncBufReadExt + Unpin>(
    reader: &mut R,
    timeout: Duration,
) -> Result<Request, ProtocolError> {
    let line = read_line(reader, timeout).await?;
    Ok(serde_json::from_str(&line)?)
}

/// Write one response line (the envelope is already serialized).
pub async fn write_line<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    envelope: &str,
    timeout: Duration,
) -> Result<(), ProtocolError> {
    let write = async {
        writer.write_all(envelope.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok::<(), std::io::Error>(())
    };
    tokio::time::timeout(timeout, write)
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    Ok(())
}

#[cfg(test)]
#[path = "protocol_wire_tests.rs"]
mod tests;
