// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::dispatch::{CreatedDriver, DriverFactory};
use cog_core::{DriverResult, LaunchConfig};
use cog_drivers::FakeDriver;
use cog_engine::SessionManager;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

struct FakeFactory;

impl DriverFactory for FakeFactory {
    fn create(&self, _config: &LaunchConfig, _detach: bool) -> DriverResult<CreatedDriver> {
        let (driver, _handle) = FakeDriver::new();
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
        let (driver, _handle) = FakeDriver::new();
        Ok(CreatedDriver {
            driver: Box::new(driver),
            backend: "fake".to_string(),
        })
    }
}

async fn serve() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let socket_path = dir.path().join("daemon.sock");
    let listener = UnixListener::bind(&socket_path).unwrap();

    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(SessionManager::new()),
        Box::new(FakeFactory),
        dir.path().join("dashboard.sock"),
    ));
    tokio::spawn(Listener::new(listener, dispatcher).run());

    (dir, socket_path)
}

async fn round_trip(socket_path: &std::path::Path, request: &str) -> serde_json::Value {
    let stream = UnixStream::connect(socket_path).await.unwrap();
    let (read, mut write) = stream.into_split();

    write.write_all(request.as_bytes()).await.unwrap();
    write.write_all(b"\n").await.unwrap();

    let mut reader = BufReader::new(read);
    let mut line = String::new();
    reader.read_line(&mut line).await.unwrap();
    serde_json::from_str(&line).unwrap()
}

#[tokio::test]
async fn one_request_per_connection_round_trips() {
    let (_dir, socket_path) = serve().await;

    let response = round_trip(&socket_path, r#"{"tool":"sessions","args":{}}"#).await;
    assert_eq!(response["ok"], true);
    assert!(response["result"]["sessions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn launch_then_sessions_across_two_connections() {
    let (_dir, socket_path) = serve().await;

    let response = round_trip(
        &socket_path,
        r#"{"tool":"launch","args":{"program":"./a.out"}}"#,
    )
    .await;
    assert_eq!(response["ok"], true);
    let session_id = response["result"]["session_id"].as_str().unwrap().to_string();

    let response = round_trip(&socket_path, r#"{"tool":"sessions","args":{}}"#).await;
    assert_eq!(response["result"]["sessions"][0]["session_id"], session_id.as_str());
}

#[tokio::test]
async fn malformed_json_yields_a_parse_error_envelope() {
    let (_dir, socket_path) = serve().await;

    let response = round_trip(&socket_path, "{nope").await;
    assert_eq!(response["ok"], false);
    assert_eq!(response["error"]["code"], serde_json::json!(-32700));
}

#[tokio::test]
async fn unknown_tool_yields_method_not_found() {
    let (_dir, socket_path) = serve().await;

    let response = round_trip(&socket_path, r#"{"tool":"nope","args":{}}"#).await;
    assert_eq!(response["ok"], false);
    assert_eq!(response["error"]["code"], serde_json::json!(-32601));
}

#[tokio::test]
async fn concurrent_connections_are_served() {
    let (_dir, socket_path) = serve().await;

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let path = socket_path.clone();
        tasks.push(tokio::spawn(async move {
            round_trip(&path, r#"{"tool":"sessions","args":{}}"#).await
        }));
    }
    for task in tasks {
        let response = task.await.unwrap();
        assert_eq!(response["ok"], true);
    }
}
