// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    breakpoint = { StopReason::Breakpoint, "breakpoint" },
    step = { StopReason::Step, "step" },
    exception = { StopReason::Exception, "exception" },
    entry = { StopReason::Entry, "entry" },
    pause = { StopReason::Pause, "pause" },
    goto_ = { StopReason::Goto, "goto" },
    function_bp = { StopReason::FunctionBreakpoint, "function breakpoint" },
    data_bp = { StopReason::DataBreakpoint, "data breakpoint" },
    instruction_bp = { StopReason::InstructionBreakpoint, "instruction breakpoint" },
    exited = { StopReason::Exited, "exited" },
)]
fn stop_reason_wire_round_trip(reason: StopReason, wire: &str) {
    assert_eq!(reason.as_wire_str(), wire);
    assert_eq!(StopReason::from_wire(wire), Some(reason));
    let json = serde_json::to_string(&reason).unwrap();
    assert_eq!(json, format!("\"{wire}\""));
}

#[test]
fn unknown_wire_reason_is_none() {
    assert_eq!(StopReason::from_wire("coffee break"), None);
}

#[test]
fn empty_collections_are_omitted_on_the_wire() {
    let state = StopState::new(StopReason::Pause);
    let json = serde_json::to_value(&state).unwrap();
    let obj = json.as_object().unwrap();
    assert_eq!(obj.get("stop_reason").unwrap(), "pause");
    assert!(!obj.contains_key("frames"));
    assert!(!obj.contains_key("locals"));
    assert!(!obj.contains_key("log_messages"));
    assert!(!obj.contains_key("exit_code"));
}

#[test]
fn should_resume_never_serializes() {
    let mut state = StopState::new(StopReason::Breakpoint);
    state.should_resume = true;
    let json = serde_json::to_string(&state).unwrap();
    assert!(!json.contains("should_resume"));

    // and deserializing never sets it
    let back: StopState = serde_json::from_str(&json).unwrap();
    assert!(!back.should_resume);
}

#[test]
fn exited_state_carries_the_code() {
    let state = StopState::exited(3);
    assert!(state.is_exit());
    assert_eq!(state.exit_code, Some(3));
    let json = serde_json::to_value(&state).unwrap();
    assert_eq!(json["stop_reason"], "exited");
    assert_eq!(json["exit_code"], 3);
}
