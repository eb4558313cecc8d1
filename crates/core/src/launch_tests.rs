// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn stop_on_entry_defaults_to_true() {
    let config: LaunchConfig = serde_json::from_str(r#"{"program":"./a.out"}"#).unwrap();
    assert!(config.stop_on_entry);
    assert!(config.args.is_empty());
    assert!(config.language.is_none());
}

#[test]
fn explicit_stop_on_entry_false_is_honored() {
    let config: LaunchConfig =
        serde_json::from_str(r#"{"program":"./a.out","stop_on_entry":false}"#).unwrap();
    assert!(!config.stop_on_entry);
}

#[test]
fn full_config_round_trips() {
    let config: LaunchConfig = serde_json::from_str(
        r#"{
            "program": "app.py",
            "args": ["--fast"],
            "cwd": "/work",
            "env": {"PYTHONPATH": "/lib"},
            "language": "python",
            "adapter": "python3",
            "adapter_args": ["-m", "debugpy.adapter"]
        }"#,
    )
    .unwrap();
    assert_eq!(config.program, "app.py");
    assert_eq!(config.args, vec!["--fast"]);
    assert_eq!(config.env.get("PYTHONPATH").map(String::as_str), Some("/lib"));
    assert_eq!(config.adapter.as_deref(), Some("python3"));

    let json = serde_json::to_string(&config).unwrap();
    let back: LaunchConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}
