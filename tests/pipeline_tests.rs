//! End-to-end behaviour of the synchronous pipeline.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::http::{header, Method, StatusCode};

use gatekeeper::config::{EnvironmentConfig, GatewayConfig, RunMode};
use gatekeeper::feedback::Severity;
use gatekeeper::pipeline::RawBody;
use gatekeeper::InboundRequest;

mod common;

use common::{REVOKED_TOKEN, USER_TOKEN};

fn at(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(1_800_000_000 + secs)
}

fn get(path: &str) -> InboundRequest {
    InboundRequest::new(Method::GET, path)
}

fn bearer(request: InboundRequest, token: &str) -> InboundRequest {
    request.with_header("authorization", &format!("Bearer {token}"))
}

#[test]
fn test_paginated_infractions_resolve_to_handler() {
    let pipeline = common::pipeline(&common::demo_config());
    let response = pipeline.handle(bearer(get("/infractions/p/2/pp/10"), USER_TOKEN), at(0));

    assert_eq!(response.status, StatusCode::OK);
    let body = response.body.unwrap();
    assert_eq!(body["status"], "success");
    assert_eq!(body["count"], 10);
    assert_eq!(body["results"][0]["id"], 10);
    assert_eq!(body["results"][0]["handler"], "getAllInfractionsPaginated");
}

#[test]
fn test_missing_and_bad_credentials() {
    let pipeline = common::pipeline(&common::demo_config());

    let response = pipeline.handle(get("/infractions/p/1/pp/5"), at(0));
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.body.unwrap(),
        serde_json::json!({"status": "error", "message": "No credentials provided"})
    );

    for token in [REVOKED_TOKEN, "forged"] {
        let response = pipeline.handle(bearer(get("/infractions/p/1/pp/5"), token), at(0));
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.body.unwrap()["message"], "Invalid or expired credentials");
    }
}

#[test]
fn test_query_token_fallback() {
    let pipeline = common::pipeline(&common::demo_config());
    let request = get("/profiles/9").with_query_string(&format!("token={USER_TOKEN}"));
    let response = pipeline.handle(request, at(0));

    assert_eq!(response.status, StatusCode::OK);
    let body = response.body.unwrap();
    assert_eq!(body["result"]["id"], "9");
    assert_eq!(body["result"]["viewer"], "alice");
}

#[test]
fn test_tables_are_partitioned_by_verdict() {
    let pipeline = common::pipeline(&common::demo_config());

    // Anonymous-only route is not visible to an authenticated caller.
    let login = InboundRequest::new(Method::POST, "/login").with_body(serde_json::json!({"user": "bob"}));
    let response = pipeline.handle(bearer(login.clone(), USER_TOKEN), at(0));
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = pipeline.handle(login, at(0));
    assert_eq!(response.status, StatusCode::CREATED);
    let body = response.body.unwrap();
    assert_eq!(body["message"], "Logged in");
    assert_eq!(body["result"]["user"], "bob");

    // Routes registered in both tables stay reachable anonymously.
    let anon = pipeline.handle(get("/items"), at(0)).body.unwrap();
    assert_eq!(anon["count"], 3);
}

#[test]
fn test_list_payloads_are_capped() {
    let mut config = common::demo_config();
    config.response.item_limit = 100;
    let pipeline = common::pipeline(&config);

    let body = pipeline.handle(bearer(get("/items"), USER_TOKEN), at(0)).body.unwrap();
    assert_eq!(body["count"], 100);
    assert_eq!(body["results"].as_array().unwrap().len(), 100);
}

#[test]
fn test_handler_failure_becomes_error_envelope() {
    let pipeline = common::pipeline(&common::demo_config());

    let response = pipeline.handle(bearer(get("/profiles/404"), USER_TOKEN), at(0));
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body.unwrap()["message"], "No such profile");

    let response = pipeline.handle(bearer(get("/infractions/p/x/pp/10"), USER_TOKEN), at(0));
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[test]
fn test_unknown_route_for_authenticated_caller_is_404() {
    let pipeline = common::pipeline(&common::demo_config());
    let response = pipeline.handle(bearer(get("/nowhere"), USER_TOKEN), at(0));

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body.unwrap()["status"], "error");
}

#[test]
fn test_open_preflight_is_bodyless() {
    let pipeline = common::pipeline(&common::demo_config());
    let request = InboundRequest::new(Method::OPTIONS, "/infractions/p/2/pp/10")
        .with_header("origin", "https://example.org");
    let response = pipeline.handle(request, at(0));

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.is_none());
    assert!(response.headers.contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
    assert_eq!(response.headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://example.org");
}

#[test]
fn test_disallowed_method() {
    let pipeline = common::pipeline(&common::demo_config());
    let response = pipeline.handle(InboundRequest::new(Method::PATCH, "/items"), at(0));

    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
    assert!(response.headers.contains_key(header::ALLOW));
    assert_eq!(response.body.unwrap()["status"], "error");
}

fn restricted_config() -> GatewayConfig {
    let mut config = common::demo_config();
    config.environment = EnvironmentConfig {
        restricted: true,
        allowed_domain: "https://app.example.org".into(),
        allowed_referer_host: "app.example.org".into(),
        allowed_ips: vec!["10.1.1.1".into()],
    };
    config.rate_limit.limit = 5;
    config.rate_limit.period_secs = 60;
    config
}

fn restricted(request: InboundRequest) -> InboundRequest {
    request
        .with_header("origin", "https://app.example.org")
        .with_header("referer", "https://app.example.org/app")
        .with_header("cookie", "session_id=sess-42")
        .with_client_ip("10.1.1.1".parse().unwrap())
}

#[test]
fn test_rate_limit_six_requests_in_a_minute() {
    let pipeline = common::pipeline(&restricted_config());

    for t in [0, 10, 20, 30, 40] {
        let response = pipeline.handle(restricted(get("/items")), at(t));
        assert_eq!(response.status, StatusCode::OK, "request at {t}s");
    }

    let limited = pipeline.handle(restricted(get("/items")), at(50));
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.headers[header::RETRY_AFTER], "10");
    assert_eq!(limited.body.unwrap()["status"], "error");

    let response = pipeline.handle(restricted(get("/items")), at(61));
    assert_eq!(response.status, StatusCode::OK);
}

#[test]
fn test_restricted_environment_rejections() {
    let pipeline = common::pipeline(&restricted_config());

    let wrong_ip = restricted(get("/items")).with_client_ip("10.9.9.9".parse().unwrap());
    let response = pipeline.handle(wrong_ip, at(0));
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(response.headers.is_empty());
    assert_eq!(response.body.unwrap()["status"], "error");

    let wrong_origin = restricted(get("/items")).with_header("origin", "https://evil.example.com");
    assert_eq!(pipeline.handle(wrong_origin, at(0)).status, StatusCode::FORBIDDEN);

    let ok = pipeline.handle(restricted(get("/items")), at(0));
    assert_eq!(ok.headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://app.example.org");
}

#[test]
fn test_gate_answers_before_the_body_is_decoded() {
    let pipeline = common::pipeline(&restricted_config());
    let form_body = || RawBody::Bytes("a=1&b=2".into());

    let foreign = restricted(InboundRequest::new(Method::POST, "/login"))
        .with_header("origin", "https://evil.example.com")
        .with_raw_body(form_body());
    let response = pipeline.handle(foreign, at(0));
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body.unwrap()["message"], "Origin not allowed");

    let oversized = restricted(InboundRequest::new(Method::POST, "/login"))
        .with_client_ip("192.168.1.1".parse().unwrap())
        .with_raw_body(RawBody::TooLarge { limit: 8 });
    assert_eq!(pipeline.handle(oversized, at(0)).status, StatusCode::FORBIDDEN);

    let allowed = restricted(InboundRequest::new(Method::POST, "/login")).with_raw_body(form_body());
    let response = pipeline.handle(allowed, at(0));
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body.unwrap()["status"], "error");
}

#[test]
fn test_bad_body_is_reported_only_for_a_routed_request() {
    let pipeline = common::pipeline(&common::demo_config());
    let garbled = |path: &str| InboundRequest::new(Method::GET, path).with_raw_body(RawBody::Bytes("{oops".into()));

    // Authentication still terminates first.
    assert_eq!(pipeline.handle(garbled("/profiles/3"), at(0)).status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        pipeline.handle(bearer(garbled("/nowhere"), USER_TOKEN), at(0)).status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(pipeline.handle(garbled("/items"), at(0)).status, StatusCode::BAD_REQUEST);

    let oversized = InboundRequest::new(Method::POST, "/login").with_raw_body(RawBody::TooLarge { limit: 8 });
    assert_eq!(pipeline.handle(oversized, at(0)).status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[test]
fn test_development_mode_diagnostics() {
    let mut config = common::demo_config();
    config.mode = RunMode::Development;
    config.response.item_limit = 2;
    let pipeline = common::pipeline(&config);

    let response = pipeline.handle(bearer(get("/infractions/p/1/pp/5"), USER_TOKEN), at(0));
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let body = response.body.unwrap();
    assert_eq!(body["summary"]["count"], 2);
    assert_eq!(body["raw"].as_array().unwrap().len(), 2);
    assert_eq!(body["original_status"], 200);
    assert!(body["encoded"].is_string());

    let devmode = &body["devmode"];
    assert_eq!(devmode["table"], "authenticated");
    assert_eq!(devmode["identity"]["user_id"], "alice");
    assert!(devmode["identity"].get("token").is_none());
    let success = devmode["feedback"]["success"][0].as_str().unwrap();
    assert!(success.starts_with("page 1 loaded — recorded at "));
    assert!(!devmode["routes"]["anonymous"].as_array().unwrap().is_empty());
}

#[test]
fn test_gate_rejections_keep_real_status_in_development() {
    let mut config = common::demo_config();
    config.mode = RunMode::Development;
    let pipeline = common::pipeline(&config);

    let response = pipeline.handle(get("/whoami"), at(0));
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.body.unwrap().get("devmode").is_none());
}

#[test]
fn test_dev_override_requires_both_flags_and_development() {
    let mut config = common::demo_config();
    config.mode = RunMode::Development;
    config.auth.dev_override.enabled = true;
    config.auth.dev_override.logged_in = true;
    config.auth.dev_override.user_id = "dev".into();

    let body = common::pipeline(&config).handle(get("/whoami"), at(0)).body.unwrap();
    assert_eq!(body["summary"]["result"]["user_id"], "dev");

    config.auth.dev_override.logged_in = false;
    let response = common::pipeline(&config).handle(get("/whoami"), at(0));
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    config.auth.dev_override.logged_in = true;
    config.mode = RunMode::Production;
    let response = common::pipeline(&config).handle(bearer(get("/whoami"), "forged"), at(0));
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[test]
fn test_feedback_is_isolated_per_test_run() {
    let mut config = common::demo_config();
    config.feedback.test_mode = true;
    let pipeline = common::pipeline(&config);

    pipeline.handle(get("/notes").with_header("x-test-run", "run-a"), at(0));
    pipeline.handle(
        bearer(get("/profiles/3"), USER_TOKEN).with_header("x-test-run", "run-b"),
        at(0),
    );

    let a = pipeline.feedback_for_test("run-a", None);
    assert_eq!(a.len(), 2);
    assert_eq!(pipeline.feedback_for_test("run-a", Some(Severity::Warning)).len(), 1);

    let b = pipeline.feedback_for_test("run-b", None);
    assert_eq!(b.len(), 1);
    assert_eq!(b[0].severity, Severity::Diagnostic);
    assert!(b[0].text.starts_with("profile 3 read"));

    pipeline.clear_test_feedback("run-a");
    assert!(pipeline.feedback_for_test("run-a", None).is_empty());
}

#[test]
fn test_feedback_never_changes_status() {
    let pipeline = common::pipeline(&common::demo_config());
    let response = pipeline.handle(get("/notes"), at(0));
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.unwrap().get("devmode").is_none());
}

#[test]
fn test_reload_switches_mode_and_keeps_routes() {
    let config = common::demo_config();
    let pipeline = common::pipeline(&config);
    assert_eq!(pipeline.handle(get("/items"), at(0)).status, StatusCode::OK);
    let status = pipeline.handle(get("/status"), at(0)).body.unwrap();
    assert_eq!(status["result"]["mode"], "production");

    let mut reloaded = config.clone();
    reloaded.mode = RunMode::Development;
    reloaded.routes.clear();
    pipeline.reload(&reloaded);

    assert_eq!(pipeline.mode(), RunMode::Development);
    let response = pipeline.handle(get("/items"), at(0));
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body.unwrap()["original_status"], 200);

    let status = pipeline.handle(get("/status"), at(0)).body.unwrap();
    assert_eq!(status["summary"]["result"]["mode"], "development");
}
