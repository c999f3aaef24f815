//! Integration tests for the `peerly` CLI binary.
//!
//! Parsing, help, completions and offline route resolution run without a
//! server; list and login flows run against a wiremock backend.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `peerly` binary with env isolation.
///
/// Clears all `PEERLY_*` env vars and points config directories at
/// `home` so tests never touch the user's real configuration.
fn peerly_at(home: &str) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("peerly");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home)
        .env_remove("PEERLY_PROFILE")
        .env_remove("PEERLY_SERVER")
        .env_remove("PEERLY_USER")
        .env_remove("PEERLY_PASSWORD")
        .env_remove("PEERLY_TOKEN")
        .env_remove("PEERLY_OUTPUT")
        .env_remove("PEERLY_INSECURE")
        .env_remove("PEERLY_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

fn peerly_cmd() -> assert_cmd::Command {
    peerly_at("/tmp/peerly-cli-test-nonexistent")
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// An unsigned session token carrying `claims`.
fn token_for(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}

fn instructor_token() -> String {
    token_for(&json!({
        "id": 6,
        "name": "instructor6",
        "full_name": "Grace Hopper",
        "role": "Instructor",
        "institution_id": 1
    }))
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = peerly_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    peerly_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("peer-review")
            .and(predicate::str::contains("duties"))
            .and(predicate::str::contains("assignments"))
            .and(predicate::str::contains("routes")),
    );
}

#[test]
fn test_version_flag() {
    peerly_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("peerly"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    peerly_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    peerly_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = peerly_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_duties_list_without_server() {
    let output = peerly_cmd().args(["duties", "list"]).output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("config init") || text.contains("No config"),
        "Expected a hint to configure a server:\n{text}"
    );
}

#[test]
fn test_anonymous_list_requires_login() {
    let output = peerly_cmd()
        .args(["--server", "http://127.0.0.1:9", "duties", "list"])
        .output()
        .unwrap();
    // The guard stops it before any request is made.
    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("peerly login"));
}

// ── Offline routing ─────────────────────────────────────────────────

#[test]
fn test_routes_list_has_catch_all_last() {
    let output = peerly_cmd()
        .args(["routes", "list", "-o", "plain"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let paths: Vec<&str> = stdout.lines().collect();
    assert!(paths.contains(&"/duties"));
    assert!(paths.contains(&"/assignments/:id/review"));
    assert_eq!(paths.last().copied(), Some("/*"));
}

#[test]
fn test_resolve_anonymous_redirects_to_login() {
    peerly_cmd()
        .args(["routes", "resolve", "/duties", "-o", "json"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains(r#""outcome": "redirect""#)
                .and(predicate::str::contains(r#""redirect_to": "/login?from=%2Fduties""#)),
        );
}

#[test]
fn test_resolve_student_is_sent_home() {
    peerly_cmd()
        .args(["routes", "resolve", "/courses", "--as", "Student"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/courses -> /"));
}

#[test]
fn test_resolve_ta_extracts_params() {
    let output = peerly_cmd()
        .args([
            "routes",
            "resolve",
            "/assignments/12/review?tab=grades",
            "--as",
            "TA",
            "-o",
            "json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let body: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["page"], "ReviewReport");
    assert_eq!(body["params"]["id"], "12");
    assert_eq!(body["query"]["tab"], "grades");
}

#[test]
fn test_resolve_unknown_role_is_rejected() {
    let output = peerly_cmd()
        .args(["routes", "resolve", "/", "--as", "Dean"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Against a backend ───────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_duties_list_json_hides_other_private_duties() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/duties"))
        .and(query_param("visible_to", "6"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "Reader", "instructor_id": 2, "private": false},
            {"id": 2, "name": "Secret", "instructor_id": 2, "private": true},
            {"id": 3, "name": "Mentor", "instructor_id": 6, "private": true}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let output = peerly_cmd()
        .args([
            "--server",
            &server.uri(),
            "--token",
            &instructor_token(),
            "-o",
            "json",
            "duties",
            "list",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let rows: Vec<Value> = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = rows.iter().map(|r| r["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["Mentor", "Reader"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_error_maps_to_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/assignments"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"error": "Not allowed"})))
        .mount(&server)
        .await;

    let output = peerly_cmd()
        .args([
            "--server",
            &server.uri(),
            "--token",
            &instructor_token(),
            "assignments",
            "list",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(5), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_saves_token_to_profile() {
    let home = tempfile::tempdir().unwrap();
    let home_str = home.path().to_str().unwrap().to_owned();
    let token = instructor_token();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(json!({"user_name": "instructor6", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": token })))
        .expect(1)
        .mount(&server)
        .await;

    let output = peerly_at(&home_str)
        .args([
            "--server",
            &server.uri(),
            "--user",
            "instructor6",
            "--password",
            "pw",
            "login",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("Logged in as Grace Hopper (Instructor)"));

    let saved = std::fs::read_to_string(home.path().join("peerly").join("config.toml")).unwrap();
    assert!(saved.contains(&token), "token not saved:\n{saved}");

    peerly_at(&home_str)
        .arg("logout")
        .assert()
        .success()
        .stderr(predicate::str::contains("Logged out"));
    let saved = std::fs::read_to_string(home.path().join("peerly").join("config.toml")).unwrap();
    assert!(!saved.contains(&token));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_login_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid username or password"})),
        )
        .mount(&server)
        .await;

    let output = peerly_cmd()
        .args([
            "--server",
            &server.uri(),
            "--user",
            "student1",
            "--password",
            "wrong",
            "login",
            "--no-save",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
}
