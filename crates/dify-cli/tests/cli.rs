//! CLI tests against a mock Dify deployment.
//!
//! Each test gets its own HOME so the stored session never leaks between
//! tests or into the developer's real data directory.

mod common;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{run_cli_with_env, run_cli_with_env_failure, run_cli_with_env_success};

fn token_body(access: &str, refresh: &str) -> serde_json::Value {
    json!({
        "result": "success",
        "data": {"access_token": access, "refresh_token": refresh}
    })
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/console/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("access-1", "refresh-1")))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/console/api/datasets/api-keys"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": "key-1",
                "type": "dataset",
                "token": "dataset-0123456789",
                "created_at": 1700000000
            }]
        })))
        .mount(server)
        .await;
}

#[cfg(target_os = "linux")]
fn session_file(home: &TempDir) -> std::path::PathBuf {
    home.path().join("data").join("dify").join("session.json")
}

fn login_args(base_url: &str) -> Vec<String> {
    [
        "login",
        "--base-url",
        base_url,
        "--email",
        "admin@example.com",
        "--password",
        "secret",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn as_strs(args: &[String]) -> Vec<&str> {
    args.iter().map(String::as_str).collect()
}

#[test]
fn test_help_lists_commands() {
    let home = TempDir::new().unwrap();
    let stdout = run_cli_with_env_success(&["--help"], home.path());

    for command in ["login", "status", "refresh-token", "api-key", "run-workflow"] {
        assert!(stdout.contains(command), "missing {} in help", command);
    }
}

#[test]
fn test_version_starts_with_package_version() {
    let home = TempDir::new().unwrap();
    let stdout = run_cli_with_env_success(&["--version"], home.path());
    let expected = format!("dify {}", env!("CARGO_PKG_VERSION"));
    assert!(stdout.starts_with(&expected), "unexpected version: {}", stdout);
}

#[test]
fn test_status_without_session_fails() {
    let home = TempDir::new().unwrap();
    let stderr = run_cli_with_env_failure(&["status"], home.path());
    assert!(stderr.contains("No active session"));
}

#[test]
fn test_login_requires_credentials() {
    let home = TempDir::new().unwrap();
    let output = run_cli_with_env(&["login", "--base-url", "http://127.0.0.1:1"], home.path());
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--email"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_then_status() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    let home = TempDir::new().unwrap();

    let args = login_args(&server.uri());
    let output = run_cli_with_env(&as_strs(&args), home.path());
    assert!(
        output.status.success(),
        "Login failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = run_cli_with_env_success(&["status"], home.path());
    assert!(stdout.contains(&server.uri()));
    assert!(stdout.contains("datase…6789"));
    assert!(!stdout.contains("dataset-0123456789"));
}

#[cfg(target_os = "linux")]
#[tokio::test(flavor = "multi_thread")]
async fn test_session_file_is_private() {
    use std::os::unix::fs::PermissionsExt;

    let server = MockServer::start().await;
    mount_login(&server).await;
    let home = TempDir::new().unwrap();

    let args = login_args(&server.uri());
    run_cli_with_env_success(&as_strs(&args), home.path());

    let file = session_file(&home);
    let mode = std::fs::metadata(&file).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[cfg(target_os = "linux")]
#[tokio::test(flavor = "multi_thread")]
async fn test_refresh_token_persists_new_tokens() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/console/api/refresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("access-2", "refresh-2")))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let args = login_args(&server.uri());
    run_cli_with_env_success(&as_strs(&args), home.path());
    run_cli_with_env_success(&["refresh-token"], home.path());

    let file = session_file(&home);
    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(file).unwrap()).unwrap();
    assert_eq!(stored["access_token"], "access-2");
    assert_eq!(stored["refresh_token"], "refresh-2");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_login_fails() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/console/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "fail"})))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let args = login_args(&server.uri());
    let stderr = run_cli_with_env_failure(&as_strs(&args), home.path());
    assert!(stderr.contains("Failed to login"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_run_workflow_streaming_prints_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/workflows/run"))
        .and(header("authorization", "Bearer app-key"))
        .respond_with(ResponseTemplate::new(200).set_body_string(concat!(
            "data: {\"event\":\"text_chunk\",\"data\":{\"text\":\"hello \"}}\n\n",
            "data: {\"event\":\"text_chunk\",\"data\":{\"text\":\"world\"}}\n\n",
            "data: {\"event\":\"workflow_finished\",\"data\":{\"status\":\"succeeded\"}}\n\n",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let stdout = run_cli_with_env_success(
        &[
            "run-workflow",
            "--base-url",
            &server.uri(),
            "--app-key",
            "app-key",
            "--input",
            "query=hi",
            "--stream",
        ],
        home.path(),
    );

    assert!(stdout.contains("hello world"));
}
