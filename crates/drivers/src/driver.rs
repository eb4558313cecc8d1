// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The polymorphic driver interface.

use cog_core::{
    Breakpoint, Capabilities, CompletionItem, DataBreakpointInfo, DriverError, DriverResult,
    ExceptionDetails, GotoTarget, InspectRequest, InspectResult, Instruction, LaunchConfig,
    LoadedSource, MemoryChunk, Module, NotificationQueue, Register, RunAction, RunOptions, Scope,
    StackFrame, StepInTarget, StopState, SymbolInfo, ThreadInfo, Variable, VariableLocation,
};

/// The full debugger operation vocabulary.
///
/// Drivers are internally synchronized: every operation takes `&self` and
/// returns fully-owned results. `run` blocks the calling thread until the
/// debuggee stops; the execution controller runs it on a dedicated worker.
/// Operations a backend cannot express return [`DriverError::NotSupported`]
/// (the default bodies below do exactly that), and the capability set
/// reported at session creation tells clients what to expect.
///
/// The dispatcher, not the driver, enforces the "not while running" guard.
#[allow(unused_variables)]
pub trait DebugDriver: Send + Sync {
    // --- lifecycle ---

    /// Start the debuggee. Returns the entry stop.
    fn launch(&self, config: &LaunchConfig) -> DriverResult<StopState>;

    /// Take control of a running process.
    fn attach(&self, pid: u32) -> DriverResult<StopState> {
        Err(DriverError::unsupported("attach"))
    }

    /// Open a core dump against an executable.
    fn load_core(&self, core_path: &str, executable: &str) -> DriverResult<StopState> {
        Err(DriverError::unsupported("load_core"))
    }

    /// Tear the session down, ending the debuggee unless the driver was
    /// created in detach mode.
    fn stop(&self) -> DriverResult<()>;

    /// End the debuggee but keep best-effort semantics: drivers without a
    /// separate terminate path fall back to a full stop.
    fn terminate(&self) -> DriverResult<()> {
        self.stop()
    }

    /// Release the debuggee and let it keep running. Best effort; falls
    /// back to a full stop.
    fn detach(&self) -> DriverResult<()> {
        self.stop()
    }

    /// Restart the debuggee. Returns the new entry stop.
    fn restart(&self) -> DriverResult<StopState> {
        Err(DriverError::unsupported("restart"))
    }

    // --- breakpoints ---

    fn set_line_breakpoint(
        &self,
        file: &str,
        line: u32,
        condition: Option<&str>,
        hit_condition: Option<&str>,
        log_message: Option<&str>,
    ) -> DriverResult<Vec<Breakpoint>> {
        Err(DriverError::unsupported("set_line_breakpoint"))
    }

    fn set_function_breakpoint(
        &self,
        name: &str,
        condition: Option<&str>,
    ) -> DriverResult<Vec<Breakpoint>> {
        Err(DriverError::unsupported("set_function_breakpoint"))
    }

    fn set_exception_breakpoints(&self, filters: &[String]) -> DriverResult<Vec<Breakpoint>> {
        Err(DriverError::unsupported("set_exception_breakpoints"))
    }

    fn set_instruction_breakpoints(&self, references: &[String]) -> DriverResult<Vec<Breakpoint>> {
        Err(DriverError::unsupported("set_instruction_breakpoints"))
    }

    fn set_data_breakpoint(&self, data_id: &str, access_type: &str) -> DriverResult<Vec<Breakpoint>> {
        Err(DriverError::unsupported("set_data_breakpoint"))
    }

    fn remove_breakpoint(&self, id: i64) -> DriverResult<()> {
        Err(DriverError::unsupported("remove_breakpoint"))
    }

    fn list_breakpoints(&self) -> DriverResult<Vec<Breakpoint>> {
        Ok(Vec::new())
    }

    fn data_breakpoint_info(
        &self,
        name: &str,
        frame_id: Option<i64>,
    ) -> DriverResult<DataBreakpointInfo> {
        Err(DriverError::unsupported("data_breakpoint_info"))
    }

    fn breakpoint_locations(
        &self,
        file: &str,
        line: u32,
        end_line: Option<u32>,
    ) -> DriverResult<Vec<u32>> {
        Err(DriverError::unsupported("breakpoint_locations"))
    }

    // --- execution ---

    /// Resume or step the debuggee and block until the next stop.
    fn run(&self, action: RunAction, options: &RunOptions) -> DriverResult<StopState>;

    fn goto(&self, file: &str, line: u32) -> DriverResult<StopState> {
        Err(DriverError::unsupported("goto"))
    }

    fn restart_frame(&self, frame_id: i64) -> DriverResult<StopState> {
        Err(DriverError::unsupported("restart_frame"))
    }

    // --- inspection ---

    fn threads(&self) -> DriverResult<Vec<ThreadInfo>> {
        Err(DriverError::unsupported("threads"))
    }

    fn stack_trace(
        &self,
        thread_id: i64,
        start_frame: u32,
        count: u32,
    ) -> DriverResult<Vec<StackFrame>> {
        Err(DriverError::unsupported("stack_trace"))
    }

    fn scopes(&self, frame_id: i64) -> DriverResult<Vec<Scope>> {
        Err(DriverError::unsupported("scopes"))
    }

    fn inspect(&self, request: &InspectRequest) -> DriverResult<InspectResult> {
        Err(DriverError::unsupported("inspect"))
    }

    fn set_variable(
        &self,
        name: &str,
        value: &str,
        frame_id: Option<i64>,
    ) -> DriverResult<Variable> {
        Err(DriverError::unsupported("set_variable"))
    }

    fn set_expression(
        &self,
        expression: &str,
        value: &str,
        frame_id: Option<i64>,
    ) -> DriverResult<Variable> {
        Err(DriverError::unsupported("set_expression"))
    }

    fn step_in_targets(&self, frame_id: i64) -> DriverResult<Vec<StepInTarget>> {
        Err(DriverError::unsupported("step_in_targets"))
    }

    fn goto_targets(&self, file: &str, line: u32) -> DriverResult<Vec<GotoTarget>> {
        Err(DriverError::unsupported("goto_targets"))
    }

    fn completions(
        &self,
        text: &str,
        column: u32,
        frame_id: Option<i64>,
    ) -> DriverResult<Vec<CompletionItem>> {
        Err(DriverError::unsupported("completions"))
    }

    fn exception_info(&self, thread_id: i64) -> DriverResult<ExceptionDetails> {
        Err(DriverError::unsupported("exception_info"))
    }

    fn source(&self, source_reference: i64) -> DriverResult<String> {
        Err(DriverError::unsupported("source"))
    }

    // --- introspection ---

    fn modules(&self) -> DriverResult<Vec<Module>> {
        Err(DriverError::unsupported("modules"))
    }

    fn loaded_sources(&self) -> DriverResult<Vec<LoadedSource>> {
        Err(DriverError::unsupported("loaded_sources"))
    }

    /// The feature flags this driver supports. Queried once at session
    /// creation and surfaced to clients.
    fn capabilities(&self) -> Capabilities;

    fn find_symbol(&self, name: &str) -> DriverResult<SymbolInfo> {
        Err(DriverError::unsupported("find_symbol"))
    }

    fn variable_location(&self, name: &str, frame_id: Option<i64>) -> DriverResult<VariableLocation> {
        Err(DriverError::unsupported("variable_location"))
    }

    fn expand_macro(&self, name: &str) -> DriverResult<String> {
        Err(DriverError::unsupported("expand_macro"))
    }

    // --- low-level ---

    fn read_memory(&self, address: u64, size: usize) -> DriverResult<MemoryChunk> {
        Err(DriverError::unsupported("read_memory"))
    }

    fn write_memory(&self, address: u64, data: &[u8]) -> DriverResult<usize> {
        Err(DriverError::unsupported("write_memory"))
    }

    fn disassemble(
        &self,
        address: u64,
        count: u32,
        offset: Option<i64>,
        resolve_symbols: bool,
    ) -> DriverResult<Vec<Instruction>> {
        Err(DriverError::unsupported("disassemble"))
    }

    fn read_registers(&self, thread_id: i64) -> DriverResult<Vec<Register>> {
        Err(DriverError::unsupported("read_registers"))
    }

    fn write_register(&self, thread_id: i64, name: &str, value: &str) -> DriverResult<()> {
        Err(DriverError::unsupported("write_register"))
    }

    // --- meta ---

    fn cancel(&self, request_id: Option<i64>, progress_id: Option<&str>) -> DriverResult<()> {
        Err(DriverError::unsupported("cancel"))
    }

    fn terminate_threads(&self, thread_ids: &[i64]) -> DriverResult<()> {
        Err(DriverError::unsupported("terminate_threads"))
    }

    /// Escape hatch: pass an arbitrary command through to the backend.
    fn raw_request(
        &self,
        command: &str,
        arguments: serde_json::Value,
    ) -> DriverResult<serde_json::Value> {
        Err(DriverError::unsupported("raw_request"))
    }

    /// Shared handle to this driver's notification FIFO. Draining goes
    /// through the handle and never blocks on the driver.
    fn notifications(&self) -> NotificationQueue;

    /// OS pid of the debuggee, once known. The controller kills this pid
    /// directly when a blocked run must be cancelled.
    fn debuggee_pid(&self) -> Option<u32> {
        None
    }
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
