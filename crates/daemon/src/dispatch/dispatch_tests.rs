// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::protocol::{INVALID_PARAMS, METHOD_NOT_FOUND, SESSION_RUNNING_MSG};
use cog_core::{StopReason, StopState};
use cog_drivers::{FakeDriver, FakeHandle};
use serde_json::json;
use std::time::{Duration, Instant};

/// Factory wiring every new session to a scripted fake driver.
struct FakeFactory {
    handles: Arc<Mutex<Vec<FakeHandle>>>,
}

impl DriverFactory for FakeFactory {
    fn create(&self, _config: &LaunchConfig, _detach: bool) -> DriverResult<CreatedDriver> {
        let (driver, handle) = FakeDriver::new();
        self.handles.lock().push(handle);
        Ok(CreatedDriver {
            driver: Box::new(driver),
            backend: "fake".to_string(),
        })
    }

    fn create_for_attach(
        &self,
        _language: Option<&str>,
        _detach: bool,
    ) -> DriverResult<CreatedDriver> {
        let (driver, handle) = FakeDriver::new();
        self.handles.lock().push(handle);
        Ok(CreatedDriver {
            driver: Box::new(driver),
            backend: "fake".to_string(),
        })
    }
}

fn test_dispatcher() -> (Dispatcher, Arc<Mutex<Vec<FakeHandle>>>) {
    let handles = Arc::new(Mutex::new(Vec::new()));
    let factory = FakeFactory {
        handles: Arc::clone(&handles),
    };
    let dir = std::env::temp_dir().join(format!("cog-test-{}", std::process::id()));
    let dispatcher = Dispatcher::new(
        Arc::new(SessionManager::new()),
        Box::new(factory),
        dir.join("no-observer.sock"),
    );
    (dispatcher, handles)
}

fn call(d: &Dispatcher, tool: &str, args: serde_json::Value) -> Result<Value, ToolError> {
    d.call_tool(tool, args)
        .map(|s| serde_json::from_str(&s).expect("result must be valid JSON"))
}

fn launch(d: &Dispatcher) -> String {
    let result = call(d, "launch", json!({ "program": "./a.out" })).unwrap();
    assert_eq!(result["status"], "stopped");
    result["session_id"].as_str().unwrap().to_string()
}

fn poll_until_event(d: &Dispatcher, session_id: &str) -> Value {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let result = call(d, "poll_events", json!({ "session_id": session_id })).unwrap();
        let events = result["events"].as_array().unwrap().clone();
        if !events.is_empty() {
            return Value::Array(events);
        }
        assert!(Instant::now() < deadline, "no event arrived");
        std::thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn unknown_tool_is_method_not_found() {
    let (d, _) = test_dispatcher();
    let err = d.call_tool("frobnicate", json!({})).unwrap_err();
    assert_eq!(err.code, METHOD_NOT_FOUND);
    assert!(err.message.contains("frobnicate"));
}

#[test]
fn launch_creates_a_stopped_session_listed_by_sessions() {
    let (d, _) = test_dispatcher();
    let session_id = launch(&d);

    let result = call(&d, "sessions", json!({})).unwrap();
    let sessions = result["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["session_id"], session_id.as_str());
    assert_eq!(sessions[0]["status"], "stopped");
    assert_eq!(sessions[0]["backend"], "fake");
}

#[test]
fn launch_without_program_is_invalid_params() {
    let (d, _) = test_dispatcher();
    let err = d.call_tool("launch", json!({})).unwrap_err();
    assert_eq!(err.code, INVALID_PARAMS);
    assert!(err.message.contains("program"), "{}", err.message);
}

#[test]
fn unknown_session_is_invalid_params() {
    let (d, _) = test_dispatcher();
    let err = d
        .call_tool("threads", json!({ "session_id": "s404404" }))
        .unwrap_err();
    assert_eq!(err.code, INVALID_PARAMS);
    assert!(err.message.contains("s404404"));
}

#[test]
fn breakpoint_set_list_remove_round_trip() {
    let (d, _) = test_dispatcher();
    let session_id = launch(&d);

    let result = call(
        &d,
        "breakpoint",
        json!({ "session_id": session_id, "action": "set", "file": "main.c", "line": 10 }),
    )
    .unwrap();
    let records = result["breakpoints"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["file"], "main.c");
    assert_eq!(records[0]["line"], 10);
    assert_eq!(records[0]["verified"], true);
    let id = records[0]["id"].as_i64().unwrap();

    let listed = call(
        &d,
        "breakpoint",
        json!({ "session_id": session_id, "action": "list" }),
    )
    .unwrap();
    assert_eq!(listed["breakpoints"].as_array().unwrap().len(), 1);

    call(
        &d,
        "breakpoint",
        json!({ "session_id": session_id, "action": "remove", "id": id }),
    )
    .unwrap();
    let listed = call(
        &d,
        "breakpoint",
        json!({ "session_id": session_id, "action": "list" }),
    )
    .unwrap();
    assert!(listed["breakpoints"].as_array().unwrap().is_empty());
}

#[test]
fn continue_returns_running_and_poll_promotes_the_exit() {
    let (d, handles) = test_dispatcher();
    let session_id = launch(&d);

    let result = call(&d, "run", json!({ "session_id": session_id, "action": "continue" })).unwrap();
    assert_eq!(result["status"], "running");
    assert_eq!(result["session_id"], session_id.as_str());

    handles.lock()[0].push_stop(StopState::exited(0));

    let events = poll_until_event(&d, &session_id);
    let event = &events[0];
    assert_eq!(event["session_id"], session_id.as_str());
    assert_eq!(event["method"], "stopped");
    assert_eq!(event["params"]["stop_reason"], "exited");
    assert_eq!(event["params"]["exit_code"], 0);

    // the exit transitioned the session to terminated, and the listing
    // remembers the stop
    let sessions = call(&d, "sessions", json!({})).unwrap();
    assert_eq!(sessions["sessions"][0]["status"], "terminated");
    assert_eq!(sessions["sessions"][0]["last_stop"]["reason"], "exited");
}

#[test]
fn breakpoint_hit_carries_location_and_ids() {
    let (d, handles) = test_dispatcher();
    let session_id = launch(&d);

    call(&d, "run", json!({ "session_id": session_id, "action": "continue" })).unwrap();

    let mut stop = StopState::new(StopReason::Breakpoint);
    stop.thread_id = Some(1);
    stop.hit_breakpoint_ids = vec![1];
    stop.location = Some(cog_core::SourceLocation::new("main.c", 10));
    handles.lock()[0].push_stop(stop);

    let events = poll_until_event(&d, &session_id);
    let params = &events[0]["params"];
    assert_eq!(params["stop_reason"], "breakpoint");
    assert_eq!(params["hit_breakpoint_ids"][0], 1);
    assert_eq!(params["location"]["file"], "main.c");
    assert_eq!(params["location"]["line"], 10);
}

#[test]
fn inspection_on_a_running_session_is_rejected_without_the_driver() {
    let (d, handles) = test_dispatcher();
    let session_id = launch(&d);
    call(&d, "run", json!({ "session_id": session_id, "action": "continue" })).unwrap();

    let before = handles.lock()[0].calls().len();
    let err = d
        .call_tool("inspect", json!({ "session_id": session_id, "expression": "x" }))
        .unwrap_err();
    assert_eq!(err.code, crate::protocol::INTERNAL_ERROR);
    assert_eq!(err.message, SESSION_RUNNING_MSG);

    // the driver never saw the inspect
    assert_eq!(handles.lock()[0].calls().len(), before);

    handles.lock()[0].push_stop(StopState::exited(0));
    poll_until_event(&d, &session_id);
}

#[test]
fn synchronous_restart_and_goto_are_rejected_while_running() {
    let (d, handles) = test_dispatcher();
    let session_id = launch(&d);
    call(&d, "run", json!({ "session_id": session_id, "action": "continue" })).unwrap();

    let before = handles.lock()[0].calls().len();
    let err = d
        .call_tool("run", json!({ "session_id": session_id, "action": "restart" }))
        .unwrap_err();
    assert_eq!(err.code, crate::protocol::INTERNAL_ERROR);
    assert_eq!(err.message, SESSION_RUNNING_MSG);

    let err = d
        .call_tool(
            "run",
            json!({ "session_id": session_id, "action": "goto", "file": "main.c", "line": 3 }),
        )
        .unwrap_err();
    assert_eq!(err.message, SESSION_RUNNING_MSG);

    // the blocked worker keeps sole ownership of the driver
    assert_eq!(handles.lock()[0].calls().len(), before);

    handles.lock()[0].push_stop(StopState::exited(0));
    poll_until_event(&d, &session_id);
}

#[test]
fn second_run_while_pending_is_rejected() {
    let (d, handles) = test_dispatcher();
    let session_id = launch(&d);
    call(&d, "run", json!({ "session_id": session_id, "action": "continue" })).unwrap();

    let err = d
        .call_tool("run", json!({ "session_id": session_id, "action": "continue" }))
        .unwrap_err();
    assert_eq!(err.code, crate::protocol::INTERNAL_ERROR);

    handles.lock()[0].push_stop(StopState::exited(0));
    poll_until_event(&d, &session_id);
}

#[test]
fn stop_during_a_blocked_run_destroys_the_session_silently() {
    let (d, _handles) = test_dispatcher();
    let session_id = launch(&d);
    call(&d, "run", json!({ "session_id": session_id, "action": "continue" })).unwrap();

    let result = call(&d, "stop", json!({ "session_id": session_id })).unwrap();
    assert_eq!(result["stopped"], true);

    // gone from the listing, and no synthetic stopped event anywhere
    let sessions = call(&d, "sessions", json!({})).unwrap();
    assert!(sessions["sessions"].as_array().unwrap().is_empty());

    let err = d
        .call_tool("poll_events", json!({ "session_id": session_id }))
        .unwrap_err();
    assert_eq!(err.code, INVALID_PARAMS);
}

#[test]
fn failed_run_surfaces_an_error_event_and_returns_to_stopped() {
    let (d, handles) = test_dispatcher();
    let session_id = launch(&d);
    call(&d, "run", json!({ "session_id": session_id, "action": "continue" })).unwrap();

    handles.lock()[0].kill();

    let events = poll_until_event(&d, &session_id);
    assert_eq!(events[0]["method"], "error");
    assert!(events[0]["params"]["error"].as_str().unwrap().contains("killed"));

    let sessions = call(&d, "sessions", json!({})).unwrap();
    assert_eq!(sessions["sessions"][0]["status"], "stopped");
}

#[test]
fn log_point_stops_surface_only_as_accumulated_messages() {
    let (d, handles) = test_dispatcher();
    let session_id = launch(&d);

    let mut log_stop = StopState::new(StopReason::Breakpoint);
    log_stop.log_messages = vec!["x=42".to_string()];
    log_stop.should_resume = true;
    let mut terminal = StopState::new(StopReason::Breakpoint);
    terminal.hit_breakpoint_ids = vec![2];

    {
        let handles = handles.lock();
        handles[0].push_stop(log_stop);
        handles[0].push_stop(terminal);
    }

    call(&d, "run", json!({ "session_id": session_id, "action": "continue" })).unwrap();
    let events = poll_until_event(&d, &session_id);

    assert_eq!(events.as_array().unwrap().len(), 1, "one terminal stop only");
    let params = &events[0]["params"];
    assert_eq!(params["log_messages"][0], "x=42");
    assert_eq!(params["hit_breakpoint_ids"][0], 2);
}

#[test]
fn poll_twice_on_an_idle_session_is_empty_the_second_time() {
    let (d, handles) = test_dispatcher();
    let session_id = launch(&d);

    handles.lock()[0].push_notification("output", &json!({ "output": "hello\n" }));

    let events = poll_until_event(&d, &session_id);
    assert_eq!(events[0]["method"], "output");
    assert_eq!(events[0]["params"]["output"], "hello\n");

    let result = call(&d, "poll_events", json!({ "session_id": session_id })).unwrap();
    assert!(result["events"].as_array().unwrap().is_empty());
}

#[test]
fn set_variable_then_inspect_round_trips() {
    let (d, _) = test_dispatcher();
    let session_id = launch(&d);

    call(
        &d,
        "set_variable",
        json!({ "session_id": session_id, "name": "x", "value": "41" }),
    )
    .unwrap();
    let result = call(
        &d,
        "inspect",
        json!({ "session_id": session_id, "expression": "x" }),
    )
    .unwrap();
    assert_eq!(result["value"], "41");
}

#[test]
fn capabilities_surface_only_true_flags() {
    let (d, _) = test_dispatcher();
    let session_id = launch(&d);

    let result = call(&d, "capabilities", json!({ "session_id": session_id })).unwrap();
    let caps = result["capabilities"].as_object().unwrap();
    assert_eq!(caps.get("supportsLogPoints"), Some(&json!(true)));
    assert!(caps.values().all(|v| v == &json!(true)));
}

#[test]
fn registers_tool_returns_a_non_empty_array() {
    let (d, _) = test_dispatcher();
    let session_id = launch(&d);

    let result = call(&d, "registers", json!({ "session_id": session_id })).unwrap();
    assert!(!result["registers"].as_array().unwrap().is_empty());
}

#[test]
fn raw_request_passes_the_body_through() {
    let (d, _) = test_dispatcher();
    let session_id = launch(&d);

    let result = call(
        &d,
        "raw_request",
        json!({ "session_id": session_id, "command": "customProbe", "arguments": { "x": 1 } }),
    )
    .unwrap();
    assert_eq!(result["echo"], "customProbe");
    assert_eq!(result["arguments"]["x"], 1);
}

#[test]
fn pause_returns_a_full_stop_state_synchronously() {
    let (d, _) = test_dispatcher();
    let session_id = launch(&d);

    let result = call(&d, "run", json!({ "session_id": session_id, "action": "pause" })).unwrap();
    assert_eq!(result["status"], "stopped");
    assert_eq!(result["stop"]["stop_reason"], "pause");
}

#[test]
fn launch_without_entry_hold_starts_running() {
    let (d, handles) = test_dispatcher();
    let result = call(
        &d,
        "launch",
        json!({ "program": "./a.out", "stop_on_entry": false }),
    )
    .unwrap();
    assert_eq!(result["status"], "running");
    let session_id = result["session_id"].as_str().unwrap().to_string();

    // running implies a pending slot exists
    let sessions = call(&d, "sessions", json!({})).unwrap();
    assert_eq!(sessions["sessions"][0]["status"], "running");

    handles.lock()[0].push_stop(StopState::exited(0));
    poll_until_event(&d, &session_id);
}

#[test]
fn get_pid_reports_the_debuggee_pid() {
    let (d, handles) = test_dispatcher();
    let session_id = launch(&d);

    let result = call(&d, "get_pid", json!({ "session_id": session_id })).unwrap();
    assert!(result["pid"].is_null());

    handles.lock()[0].set_pid(31337);
    let result = call(&d, "get_pid", json!({ "session_id": session_id })).unwrap();
    assert_eq!(result["pid"], 31337);
}

#[test]
fn terminate_tears_the_session_down() {
    let (d, handles) = test_dispatcher();
    let session_id = launch(&d);

    let result = call(&d, "terminate", json!({ "session_id": session_id })).unwrap();
    assert_eq!(result["terminated"], true);
    assert!(handles.lock()[0].calls().contains(&"terminate".to_string()));

    let sessions = call(&d, "sessions", json!({})).unwrap();
    assert!(sessions["sessions"].as_array().unwrap().is_empty());
}

#[test]
fn attach_creates_a_session_bound_to_the_pid() {
    let (d, _) = test_dispatcher();
    let result = call(&d, "attach", json!({ "pid": 4242 })).unwrap();
    assert_eq!(result["status"], "stopped");

    let sessions = call(&d, "sessions", json!({})).unwrap();
    assert_eq!(sessions["sessions"][0]["program"], "pid:4242");
}
