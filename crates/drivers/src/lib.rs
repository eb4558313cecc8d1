// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Debugger driver backends.
//!
//! Two concrete drivers implement the [`DebugDriver`] vocabulary: the
//! [`DapDriver`] adapter proxy, which supervises an external debug adapter
//! subprocess speaking the stock Content-Length/JSON wire dialect over its
//! stdio, and the [`NativeDriver`] process supervisor for targets with no
//! adapter. Clients never branch on the variant; `capabilities()` is how a
//! driver communicates what it can do.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod catalog;
mod dap;
mod driver;
mod logpoint;
mod native;

pub use catalog::{is_native, AdapterCommand};
pub use dap::DapDriver;
pub use driver::DebugDriver;
pub use native::NativeDriver;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeDriver, FakeHandle};
