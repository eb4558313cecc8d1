// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire framing for the adapter protocol.
//!
//! Each message is a header block (`Content-Length: N` plus a blank-line
//! terminator) followed by exactly N bytes of JSON body.

use std::io::{BufRead, Read, Write};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum adapter message body (16 MB). Anything larger is a protocol
/// violation on the pipe.
pub(crate) const MAX_BODY_SIZE: usize = 16 * 1024 * 1024;

/// Write one framed message.
pub(crate) fn write_frame<W: Write>(writer: &mut W, body: &[u8]) -> std::io::Result<()> {
    write!(writer, "Content-Length: {}\r\n\r\n", body.len())?;
    writer.write_all(body)?;
    writer.flush()
}

/// Read one framed message body. Returns `UnexpectedEof` when the pipe
/// closes cleanly between messages.
pub(crate) fn read_frame<R: BufRead>(reader: &mut R) -> std::io::Result<Vec<u8>> {
    let mut content_length: Option<usize> = None;

    loop {
        let mut line = String::new();
        let n = reader.read_line(&mut line)?;
        if n == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "adapter pipe closed",
            ));
        }
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            break;
        }
        if let Some(value) = line.strip_prefix("Content-Length:") {
            content_length = value.trim().parse().ok();
        }
        // other headers (Content-Type) are ignored
    }

    let len = content_length.ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "missing Content-Length header",
        )
    })?;
    if len > MAX_BODY_SIZE {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("adapter message too large: {len} bytes"),
        ));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body)?;
    Ok(body)
}

/// An outgoing request frame.
#[derive(Debug, Serialize)]
pub(crate) struct OutgoingRequest<'a> {
    pub seq: i64,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub command: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<&'a Value>,
}

impl<'a> OutgoingRequest<'a> {
    pub fn new(seq: i64, command: &'a str, arguments: Option<&'a Value>) -> Self {
        Self {
            seq,
            kind: "request",
            command,
            arguments,
        }
    }
}

/// An outgoing reply to an adapter reverse request.
#[derive(Debug, Serialize)]
pub(crate) struct OutgoingResponse<'a> {
    pub seq: i64,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub request_seq: i64,
    pub success: bool,
    pub command: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'a str>,
}

/// Messages arriving from the adapter, dispatched by their `type` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub(crate) enum IncomingMessage {
    Response(DapResponse),
    Event(DapEvent),
    Request(ReverseRequest),
}

/// A response to one of our requests, matched by `request_seq`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DapResponse {
    #[serde(default)]
    pub seq: i64,
    pub request_seq: i64,
    pub success: bool,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub body: Option<Value>,
}

/// An adapter-initiated event.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DapEvent {
    #[serde(default)]
    pub seq: i64,
    pub event: String,
    #[serde(default)]
    pub body: Option<Value>,
}

/// An adapter-initiated request (runInTerminal, startDebugging, ...).
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ReverseRequest {
    #[serde(default)]
    pub seq: i64,
    pub command: String,
    #[serde(default)]
    #[allow(dead_code)]
    pub arguments: Option<Value>,
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
