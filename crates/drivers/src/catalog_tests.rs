// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use cog_core::LaunchConfig;
use yare::parameterized;

#[parameterized(
    python = { "python", "python3" },
    node = { "node", "js-debug-adapter" },
    typescript = { "typescript", "js-debug-adapter" },
    go = { "go", "dlv" },
    ruby = { "ruby", "rdbg" },
    cpp = { "cpp", "codelldb" },
)]
fn known_languages_resolve(language: &str, command: &str) {
    let resolved = resolve_language(language).unwrap();
    assert_eq!(resolved.command, command);
    assert!(resolved.install_hint.is_some());
}

#[test]
fn unknown_language_is_not_supported() {
    let err = resolve_language("cobol").unwrap_err();
    let text = err.to_string();
    assert!(text.contains("cobol"), "should name the language: {text}");
}

#[test]
fn explicit_adapter_override_wins() {
    let mut config = LaunchConfig::new("app.py");
    config.language = Some("python".into());
    config.adapter = Some("/opt/custom-adapter".into());
    config.adapter_args = vec!["--stdio".into()];

    let resolved = resolve(&config).unwrap();
    assert_eq!(resolved.command, "/opt/custom-adapter");
    assert_eq!(resolved.args, vec!["--stdio"]);
    assert!(resolved.install_hint.is_none());
}

#[test]
fn no_language_means_native() {
    let config = LaunchConfig::new("./a.out");
    assert!(is_native(&config));

    let mut scripted = LaunchConfig::new("app.py");
    scripted.language = Some("python".into());
    assert!(!is_native(&scripted));

    // an adapter override always routes through the proxy
    let mut overridden = LaunchConfig::new("./a.out");
    overridden.adapter = Some("lldb-dap".into());
    assert!(!is_native(&overridden));
}

#[test]
fn missing_binary_spawn_error_carries_the_hint() {
    let cmd = resolve_language("python").unwrap();
    let err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
    let mapped = spawn_error(&cmd, &err);
    let text = mapped.to_string();
    assert!(text.contains("pip install debugpy"), "{text}");
    assert!(matches!(mapped, cog_core::DriverError::NotSupported(_)));
}
