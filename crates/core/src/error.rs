// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Driver failure taxonomy.

use thiserror::Error;

/// Result alias used by every driver operation.
pub type DriverResult<T> = Result<T, DriverError>;

/// Errors a driver operation can return.
///
/// The dispatcher maps these onto the client-visible JSON-RPC codes:
/// `NotSupported` becomes -32001, everything else collapses to -32603
/// with the error text as the token.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("not supported: {0}")]
    NotSupported(String),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("denied: {0}")]
    Denied(String),

    #[error("gone: {0}")]
    Gone(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl DriverError {
    /// Standard failure for an operation the backend cannot express.
    pub fn unsupported(operation: &str) -> Self {
        Self::NotSupported(format!("operation not supported: {operation}"))
    }

    /// True when the backend itself is gone (adapter exited, pipe broken).
    pub fn is_gone(&self) -> bool {
        matches!(self, Self::Gone(_))
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
