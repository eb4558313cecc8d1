// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Core domain types for the cog debugging daemon.
//!
//! Pure data: value objects exchanged between the tool dispatcher, the
//! session engine, and the drivers, plus their parsing and serialization.
//! No I/O lives here.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod breakpoint;
mod capabilities;
mod error;
mod frame;
mod id;
mod inspect;
mod launch;
mod lowlevel;
mod notification;
mod run;
mod stop;

pub use breakpoint::{Breakpoint, DataBreakpointInfo};
pub use capabilities::Capabilities;
pub use error::{DriverError, DriverResult};
pub use frame::{Scope, SourceLocation, StackFrame, ThreadInfo, Variable};
pub use id::SessionId;
pub use inspect::{
    CompletionItem, GotoTarget, InspectRequest, InspectResult, StepInTarget, SymbolInfo,
    VariableLocation,
};
pub use launch::LaunchConfig;
pub use lowlevel::{Instruction, LoadedSource, MemoryChunk, Module, Register};
pub use notification::{Notification, NotificationQueue};
pub use run::{RunAction, RunOptions, SteppingGranularity};
pub use stop::{ExceptionDetails, OutputEntry, StopReason, StopState};
