//! End-to-end tests for the smoke runner
//!
//! These tests stand up a mock message proxy and verify the complete run:
//! 1. Scenario order and the requests each scenario sends
//! 2. Critical short-circuiting and guard skips
//! 3. Timeouts and failure accounting
//! 4. The `proxy-smoke` binary's JSON output and exit codes

use std::path::{Path, PathBuf};
use std::time::Duration;

use proxy_smoke::common::config::Config;
use proxy_smoke::testing::{proxy, Artifact, Outcome};
use proxy_smoke::{CredentialLoader, Credentials, RunSummary, ScenarioRunner};
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PREFIX: &str = "/api/message-proxy/element";
const ROOM: &str = "!abc:example.org";

/// Mock proxy plus a scratch directory for credential and config files
struct TestContext {
    server: MockServer,
    temp_dir: TempDir,
}

impl TestContext {
    async fn new() -> Self {
        Self {
            server: MockServer::start().await,
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    fn config(&self) -> Config {
        let mut config = Config::default();
        config.target.base_url = self.server.uri();
        config
    }

    fn endpoint(suffix: &str) -> String {
        format!("{}{}", PREFIX, suffix)
    }

    /// Write a three-line credential file and return its path
    fn credential_file(&self) -> PathBuf {
        let path = self.temp_dir.path().join("userdata");
        std::fs::write(&path, "https://matrix.example.org\nalice\nhunter2\n")
            .expect("Failed to write credentials");
        path
    }

    fn login_credentials(&self) -> Credentials {
        CredentialLoader::new(Some(self.credential_file()), "https://matrix.org")
            .with_env(|_| None)
            .load()
    }

    /// Write a config file pointing at the mock server
    fn config_file(&self) -> PathBuf {
        let path = self.temp_dir.path().join("config.toml");
        let content = format!(
            "[target]\nbase_url = \"{}\"\n\n[timeouts]\nrequest_secs = 5\n",
            self.server.uri()
        );
        std::fs::write(&path, content).expect("Failed to write config");
        path
    }

    async fn mount(&self, verb: &str, suffix: &str, status: u16, body: Value) {
        Mock::given(method(verb))
            .and(path(Self::endpoint(suffix)))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    async fn run(&self, config: &Config, credentials: Credentials) -> RunSummary {
        ScenarioRunner::new(config)
            .quiet(true)
            .run(&proxy::scenarios(&config.scenarios), credentials)
            .await
            .expect("run should not hit an internal fault")
    }

    /// Mount every endpoint of a healthy proxy with one room
    async fn mount_healthy(&self) {
        self.mount("GET", "/health", 200, json!({"status": "ok"})).await;

        Mock::given(method("POST"))
            .and(path(Self::endpoint("/login")))
            .and(body_partial_json(json!({
                "homeserver": "https://matrix.example.org",
                "username": "alice",
                "password": "hunter2",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "access_token": "tok1",
                "device_id": "DEV1",
                "user_id": "@alice:matrix.example.org",
            })))
            .expect(1)
            .mount(&self.server)
            .await;

        self.mount(
            "GET",
            "/rooms",
            200,
            json!({"success": true, "data": [{
                "room_id": ROOM,
                "name": "General",
                "member_count": 3,
            }]}),
        )
        .await;
        self.mount(
            "GET",
            &format!("/rooms/{}/messages", ROOM),
            200,
            json!({"chunk": [
                {"sender": "@bob:example.org", "content": {"body": "hi"}},
                {"sender": "@carol:example.org", "body": "hello"},
            ]}),
        )
        .await;
        self.mount(
            "GET",
            &format!("/rooms/{}/members", ROOM),
            200,
            json!({"members": [
                {"user_id": "@alice:example.org", "power_level": 100},
                {"user_id": "@bob:example.org", "power_level": 50},
                {"user_id": "@carol:example.org", "power_level": 0},
            ]}),
        )
        .await;

        Mock::given(method("POST"))
            .and(path(Self::endpoint(&format!("/rooms/{}/send", ROOM))))
            .and(body_partial_json(json!({"msg_type": "m.text"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true, "event_id": "$evt1"})),
            )
            .expect(1)
            .mount(&self.server)
            .await;

        Mock::given(method("PUT"))
            .and(path(Self::endpoint(&format!("/rooms/{}/typing", ROOM))))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&self.server)
            .await;

        self.mount("POST", "/logout", 200, json!({"success": true})).await;
    }
}

fn outcome(summary: &RunSummary, name: &str) -> Outcome {
    summary
        .result(name)
        .unwrap_or_else(|| panic!("no result for {}", name))
        .outcome
}

#[tokio::test]
async fn test_full_run_against_healthy_proxy() {
    let ctx = TestContext::new().await;
    ctx.mount_healthy().await;

    let summary = ctx.run(&ctx.config(), ctx.login_credentials()).await;

    assert_eq!(summary.total, 8, "{:#?}", summary.results);
    assert_eq!(summary.passed, 8);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.skipped, 0);
    assert!(summary.all_passed());

    let order: Vec<&str> = summary.results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        order,
        [
            proxy::HEALTH,
            proxy::AUTHENTICATE,
            proxy::ROOMS,
            proxy::MESSAGES,
            proxy::MEMBERS,
            proxy::SEND_MESSAGE,
            proxy::TYPING,
            proxy::LOGOUT,
        ]
    );

    match &summary.result(proxy::AUTHENTICATE).unwrap().artifact {
        Some(Artifact::Session(creds)) => {
            assert_eq!(creds.access_token.as_deref(), Some("tok1"));
            assert_eq!(creds.device_id.as_deref(), Some("DEV1"));
        }
        other => panic!("expected session artifact, got {:?}", other),
    }
    assert_eq!(
        summary.result(proxy::SEND_MESSAGE).unwrap().artifact,
        Some(Artifact::Event("$evt1".into()))
    );
    match &summary.result(proxy::MEMBERS).unwrap().artifact {
        Some(Artifact::Members(members)) => {
            assert_eq!(members.total, 3);
            assert_eq!(members.admins, 1);
            assert_eq!(members.moderators, 1);
            assert_eq!(members.regular, 1);
        }
        other => panic!("expected member summary, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unhealthy_proxy_stops_the_run() {
    let ctx = TestContext::new().await;
    ctx.mount("GET", "/health", 500, json!({"error": "database down"}))
        .await;
    Mock::given(method("POST"))
        .and(path(TestContext::endpoint("/login")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&ctx.server)
        .await;

    let summary = ctx.run(&ctx.config(), ctx.login_credentials()).await;

    assert_eq!(summary.total, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.results.len(), 1);
    let health = summary.result(proxy::HEALTH).unwrap();
    assert_eq!(health.detail.as_deref(), Some("HTTP 500: database down"));
    assert!(summary.aborted.is_some());
}

#[tokio::test]
async fn test_rejected_login_stops_the_run() {
    let ctx = TestContext::new().await;
    ctx.mount("GET", "/health", 200, json!({})).await;
    ctx.mount(
        "POST",
        "/login",
        200,
        json!({"success": false, "error": "Invalid password"}),
    )
    .await;

    let summary = ctx.run(&ctx.config(), ctx.login_credentials()).await;

    assert_eq!(summary.total, 2);
    assert_eq!(summary.passed, 1);
    assert_eq!(outcome(&summary, proxy::AUTHENTICATE), Outcome::Failed);
    assert!(summary
        .result(proxy::AUTHENTICATE)
        .unwrap()
        .detail
        .as_deref()
        .unwrap()
        .contains("Invalid password"));
    assert!(summary.result(proxy::ROOMS).is_none());
}

#[tokio::test]
async fn test_no_rooms_skips_room_scenarios() {
    let ctx = TestContext::new().await;
    ctx.mount("GET", "/health", 200, json!({})).await;
    ctx.mount(
        "POST",
        "/login",
        200,
        json!({"success": true, "access_token": "tok1"}),
    )
    .await;
    ctx.mount("GET", "/rooms", 200, json!({"rooms": []})).await;
    ctx.mount("POST", "/logout", 200, json!({"success": true})).await;

    let summary = ctx.run(&ctx.config(), ctx.login_credentials()).await;

    assert_eq!(summary.total, 4);
    assert_eq!(summary.passed, 4);
    assert_eq!(summary.skipped, 4);
    for name in [proxy::MESSAGES, proxy::MEMBERS, proxy::SEND_MESSAGE, proxy::TYPING] {
        assert_eq!(outcome(&summary, name), Outcome::Skipped, "{}", name);
    }
    assert_eq!(
        summary.result(proxy::ROOMS).unwrap().artifact,
        Some(Artifact::Rooms(Vec::new()))
    );
}

#[tokio::test]
async fn test_slow_endpoint_times_out() {
    let ctx = TestContext::new().await;
    ctx.mount("GET", "/health", 200, json!({})).await;
    ctx.mount(
        "POST",
        "/login",
        200,
        json!({"success": true, "access_token": "tok1"}),
    )
    .await;
    Mock::given(method("GET"))
        .and(path(TestContext::endpoint("/rooms")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"rooms": []}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&ctx.server)
        .await;
    ctx.mount("POST", "/logout", 200, json!({"success": true})).await;

    let config = ctx.config();
    let summary = ScenarioRunner::new(&config)
        .with_timeout(Duration::from_millis(200))
        .quiet(true)
        .run(&proxy::scenarios(&config.scenarios), ctx.login_credentials())
        .await
        .expect("a timeout is an expected failure");

    let rooms = summary.result(proxy::ROOMS).unwrap();
    assert_eq!(rooms.outcome, Outcome::Failed);
    assert_eq!(rooms.error_code, Some("TIMEOUT"));
    assert!(rooms.detail.as_deref().unwrap().contains("timed out"));

    // Room scenarios have nothing to act on; logout still runs
    assert_eq!(outcome(&summary, proxy::MESSAGES), Outcome::Skipped);
    assert_eq!(outcome(&summary, proxy::LOGOUT), Outcome::Passed);
    assert_eq!(summary.failed, 1);
}

#[tokio::test]
async fn test_without_credentials_only_health_runs() {
    let ctx = TestContext::new().await;
    ctx.mount("GET", "/health", 200, json!({})).await;

    let summary = ctx
        .run(&ctx.config(), Credentials::anonymous("https://matrix.org"))
        .await;

    assert_eq!(summary.total, 1);
    assert_eq!(summary.passed, 1);
    assert_eq!(outcome(&summary, proxy::AUTHENTICATE), Outcome::Skipped);
    assert_eq!(outcome(&summary, proxy::LOGOUT), Outcome::Skipped);
    assert!(summary.all_passed());
}

#[tokio::test]
async fn test_session_restore_uses_environment_token() {
    let ctx = TestContext::new().await;
    ctx.mount("GET", "/health", 200, json!({})).await;
    Mock::given(method("POST"))
        .and(path(TestContext::endpoint("/restore_session")))
        .and(body_partial_json(json!({
            "user_id": "@alice:example.org",
            "access_token": "saved",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "user": {"user_id": "@alice:example.org", "display_name": "Alice"},
        })))
        .expect(1)
        .mount(&ctx.server)
        .await;
    ctx.mount("GET", "/rooms", 200, json!({"joined_rooms": []})).await;
    ctx.mount("POST", "/logout", 200, json!({})).await;

    let missing = ctx.temp_dir.path().join("missing");
    let credentials = CredentialLoader::new(Some(missing), "https://matrix.org")
        .with_env(|key| match key {
            "MATRIX_USER_ID" => Some("@alice:example.org".to_string()),
            "MATRIX_ACCESS_TOKEN" => Some("saved".to_string()),
            _ => None,
        })
        .load();

    let summary = ctx.run(&ctx.config(), credentials).await;

    assert_eq!(outcome(&summary, proxy::AUTHENTICATE), Outcome::Passed);
    assert_eq!(outcome(&summary, proxy::LOGOUT), Outcome::Passed);
    assert_eq!(summary.failed, 0);
}

/// Run the compiled binary against the mock proxy
async fn run_binary(args: &[&str], config: &Path) -> std::process::Output {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_proxy-smoke"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .await
        .expect("Failed to run proxy-smoke")
}

#[tokio::test]
async fn test_binary_reports_json_and_exit_code() {
    let ctx = TestContext::new().await;
    ctx.mount_healthy().await;
    let config = ctx.config_file();
    let credentials = ctx.credential_file();
    let report = ctx.temp_dir.path().join("report.json");

    let output = run_binary(
        &[
            "run",
            "--json",
            "--credentials",
            credentials.to_str().unwrap(),
            "--report",
            report.to_str().unwrap(),
        ],
        &config,
    )
    .await;

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout: Value = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(stdout["total"], 8);
    assert_eq!(stdout["all_passed"], true);

    let written: Value =
        serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(written["passed"], 8);
}

#[tokio::test]
async fn test_binary_exits_nonzero_on_failure() {
    let ctx = TestContext::new().await;
    ctx.mount("GET", "/health", 503, json!({"error": "starting"}))
        .await;
    let config = ctx.config_file();
    let credentials = ctx.credential_file();

    let output = run_binary(
        &["run", "--json", "--credentials", credentials.to_str().unwrap()],
        &config,
    )
    .await;

    assert_eq!(output.status.code(), Some(1));
    let stdout: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stdout["failed"], 1);
    assert_eq!(stdout["results"][0]["error_code"], "HTTP_STATUS");
}

#[tokio::test]
async fn test_binary_rejects_bad_config() {
    let ctx = TestContext::new().await;
    let config = ctx.temp_dir.path().join("config.toml");
    std::fs::write(&config, "[target\nbase_url = ").unwrap();

    let output = run_binary(&["config"], &config).await;

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
}
