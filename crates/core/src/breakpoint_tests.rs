// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn effective_line_prefers_the_resolved_one() {
    let mut bp = Breakpoint::at_line(1, "main.c", 10);
    assert_eq!(bp.effective_line(), 10);
    bp.resolved_line = Some(12);
    assert_eq!(bp.effective_line(), 12);
}

#[test]
fn log_point_requires_a_nonempty_template() {
    let mut bp = Breakpoint::at_line(1, "main.c", 10);
    assert!(!bp.is_log_point());
    bp.log_message = Some(String::new());
    assert!(!bp.is_log_point());
    bp.log_message = Some("x={x}".into());
    assert!(bp.is_log_point());
}

#[test]
fn function_breakpoints_omit_file_and_line() {
    let bp = Breakpoint {
        id: 2,
        verified: true,
        file: String::new(),
        line: 0,
        resolved_line: None,
        name: Some("compute".into()),
        condition: None,
        hit_condition: None,
        log_message: None,
    };
    let json = serde_json::to_value(&bp).unwrap();
    let obj = json.as_object().unwrap();
    assert!(!obj.contains_key("file"));
    assert!(!obj.contains_key("line"));
    assert_eq!(json["name"], "compute");
}

#[test]
fn record_round_trips() {
    let mut bp = Breakpoint::at_line(7, "lib.rs", 33);
    bp.verified = true;
    bp.condition = Some("n > 2".into());
    let json = serde_json::to_string(&bp).unwrap();
    let back: Breakpoint = serde_json::from_str(&json).unwrap();
    assert_eq!(back, bp);
}
