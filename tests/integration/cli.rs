//! Binary behaviour: argument handling and fail-fast exit codes

use assert_cmd::Command;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ans_fetch_cmd() -> Command {
    let mut cmd = Command::cargo_bin("ans-fetch").unwrap();
    cmd.env_remove("ANS_TOKEN")
        .env_remove("RUST_LOG")
        .env_remove("LOG_FORMAT");
    cmd
}

#[test]
fn test_help_succeeds() {
    ans_fetch_cmd().arg("--help").assert().success();
}

#[test]
fn test_missing_token_exits_with_failure() {
    let output = ans_fetch_cmd()
        .args(["get", "courses/1", "--base-url", "http://127.0.0.1:1/api/v2/"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no ANS token configured"), "stderr: {stderr}");
}

#[test]
fn test_unparseable_date_is_rejected() {
    ans_fetch_cmd()
        .args(["assignments", "--from", "2021/09/01", "--to", "2022-08-31"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_reversed_date_range_is_rejected() {
    ans_fetch_cmd()
        .args(["--token", "abc", "assignments", "--from", "2022-01-02", "--to", "2022-01-01"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_transport_failure_exits_with_failure() {
    ans_fetch_cmd()
        .args(["--token", "abc", "--base-url", "http://127.0.0.1:1/api/v2/", "get", "courses/1"])
        .assert()
        .failure()
        .code(1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_prints_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/courses/5"))
        .and(header("authorization", "Token token=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5, "name": "Physics"})))
        .expect(1)
        .mount(&server)
        .await;

    let base_url = format!("{}/api/v2", server.uri());
    let output = tokio::task::spawn_blocking(move || {
        ans_fetch_cmd()
            .args(["get", "courses/5", "--workers", "1", "--base-url", &base_url])
            .env("ANS_TOKEN", "abc")
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success());
    let body: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body, json!({"id": 5, "name": "Physics"}));
}
