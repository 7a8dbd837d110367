#![allow(clippy::unwrap_used)]
// Integration tests for `Transport` using wiremock.

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use bmclink_api::{
    ConnectionDescriptor, ConnectionKind, Error, Method, RequestOptions, RetryPolicy, Transport,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn descriptor_for(server: &MockServer) -> ConnectionDescriptor {
    let addr = server.address();
    ConnectionDescriptor::new(addr.ip().to_string(), "admin", SecretString::from("secret"))
        .with_tls(false)
        .with_port(addr.port())
        .with_retry(RetryPolicy::new(3, Duration::from_millis(1)))
}

async fn setup() -> (MockServer, Transport) {
    let server = MockServer::start().await;
    let transport = Transport::new(descriptor_for(&server)).unwrap();
    (server, transport)
}

fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

// ── Authentication ──────────────────────────────────────────────────

#[tokio::test]
async fn test_authenticated_request_sends_basic_auth() {
    let (server, transport) = setup().await;

    // base64("admin:secret")
    Mock::given(method("GET"))
        .and(path("/redfish/v1"))
        .and(header("authorization", "Basic YWRtaW46c2VjcmV0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "RedfishVersion": "1.11.0" })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = transport.get("/redfish/v1").await.unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.is_success());
}

#[tokio::test]
async fn test_unauthenticated_request_carries_no_credentials() {
    let (server, transport) = setup().await;

    Mock::given(method("GET"))
        .and(path("/redfish/v1"))
        .and(|req: &Request| !req.headers.contains_key("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let resp = transport
        .request(
            Method::GET,
            "/redfish/v1",
            RequestOptions::new().unauthenticated(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_host_header_override() {
    let server = MockServer::start().await;
    let transport =
        Transport::new(descriptor_for(&server).with_host_header("bmc.example.com")).unwrap();

    Mock::given(method("GET"))
        .and(path("/redfish/v1/Systems"))
        .and(header("host", "bmc.example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Members": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = transport.get("/redfish/v1/Systems").await.unwrap();
    assert_eq!(resp.status(), 200);
}

// ── Bodies and helpers ──────────────────────────────────────────────

#[tokio::test]
async fn test_post_sends_json_body() {
    let (server, transport) = setup().await;

    let body = json!({ "ResetType": "ForceRestart" });
    Mock::given(method("POST"))
        .and(path("/redfish/v1/Systems/1/Actions/ComputerSystem.Reset"))
        .and(header("content-type", "application/json"))
        .and(body_json(&body))
        .respond_with(
            ResponseTemplate::new(202).insert_header("Location", "/redfish/v1/TaskService/Tasks/7"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let resp = transport
        .post("/redfish/v1/Systems/1/Actions/ComputerSystem.Reset", &body)
        .await
        .unwrap();
    assert_eq!(resp.status(), 202);
    assert_eq!(resp.location(), Some("/redfish/v1/TaskService/Tasks/7"));
}

#[tokio::test]
async fn test_redfish_version_from_service_root() {
    let (server, transport) = setup().await;

    Mock::given(method("GET"))
        .and(path("/redfish/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "RedfishVersion": "1.6.0" })))
        .mount(&server)
        .await;

    let version = transport.redfish_version().await.unwrap();
    assert_eq!(version.as_deref(), Some("1.6.0"));
}

#[tokio::test]
async fn test_get_json_rejects_error_status() {
    let (server, transport) = setup().await;

    Mock::given(method("GET"))
        .and(path("/redfish/v1"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;

    let result = transport.service_root().await;
    assert!(
        matches!(result, Err(Error::Status { status: 403, .. })),
        "expected Status error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_invalid_json_keeps_body() {
    let (server, transport) = setup().await;

    Mock::given(method("GET"))
        .and(path("/redfish/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let result = transport.service_root().await;
    match result {
        Err(Error::Deserialization { body, .. }) => assert_eq!(body, "<html>login</html>"),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

// ── Retry policy ────────────────────────────────────────────────────

#[tokio::test]
async fn test_retryable_status_is_retried_until_success() {
    let (server, transport) = setup().await;

    Mock::given(method("GET"))
        .and(path("/redfish/v1/Systems/1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/redfish/v1/Systems/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "PowerState": "On" })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = transport.get("/redfish/v1/Systems/1").await.unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_permanent_failure_makes_exactly_four_attempts() {
    let (server, transport) = setup().await;

    Mock::given(method("GET"))
        .and(path("/redfish/v1/Systems/1"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&server)
        .await;

    let err = transport.get("/redfish/v1/Systems/1").await.unwrap_err();
    assert!(
        matches!(err, Error::RetriesExhausted { attempts: 4, .. }),
        "expected RetriesExhausted after 4 attempts, got: {err:?}"
    );
    assert_eq!(err.status(), Some(503));
}

#[tokio::test]
async fn test_every_method_is_retried() {
    let (server, transport) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/redfish/v1/Systems/1"))
        .respond_with(ResponseTemplate::new(502))
        .expect(4)
        .mount(&server)
        .await;

    let err = transport
        .patch("/redfish/v1/Systems/1", &json!({ "Boot": {} }))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RetriesExhausted { attempts: 4, .. }));
}

#[tokio::test]
async fn test_non_retryable_status_returns_immediately() {
    let (server, transport) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/redfish/v1/AccountService/Accounts/3"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let resp = transport
        .delete("/redfish/v1/AccountService/Accounts/3")
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    assert!(!resp.is_success());
}

#[tokio::test]
async fn test_timeout_is_classified() {
    let server = MockServer::start().await;
    let transport =
        Transport::new(descriptor_for(&server).with_retry(RetryPolicy::none())).unwrap();

    Mock::given(method("GET"))
        .and(path("/redfish/v1"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let err = transport
        .request(
            Method::GET,
            "/redfish/v1",
            RequestOptions::new().timeout(Duration::from_millis(50)),
        )
        .await
        .unwrap_err();
    assert!(err.is_timeout(), "expected timeout, got: {err:?}");
}

#[tokio::test]
async fn test_timeouts_are_retried() {
    let server = MockServer::start().await;
    let transport = Transport::new(
        descriptor_for(&server).with_retry(RetryPolicy::new(1, Duration::from_millis(1))),
    )
    .unwrap();

    Mock::given(method("GET"))
        .and(path("/redfish/v1"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .expect(2)
        .mount(&server)
        .await;

    let err = transport
        .request(
            Method::GET,
            "/redfish/v1",
            RequestOptions::new().timeout(Duration::from_millis(50)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RetriesExhausted { attempts: 2, .. }));
    assert!(err.is_timeout());
}

// ── Connection failures ─────────────────────────────────────────────

#[tokio::test]
async fn test_refused_connection_is_retried_then_raised() {
    let descriptor = ConnectionDescriptor::new("127.0.0.1", "admin", SecretString::from("secret"))
        .with_tls(false)
        .with_port(closed_port())
        .with_retry(RetryPolicy::new(2, Duration::from_millis(1)));
    let transport = Transport::new(descriptor).unwrap();

    let err = transport.get("/redfish/v1").await.unwrap_err();
    assert!(matches!(err, Error::RetriesExhausted { attempts: 3, .. }));
    assert!(matches!(
        err.root_cause(),
        Error::Connection {
            kind: ConnectionKind::Unreachable,
            ..
        }
    ));
}

#[tokio::test]
async fn test_tls_against_plain_http_listener_is_diagnosed() {
    let server = MockServer::start().await;
    let transport = Transport::new(descriptor_for(&server).with_tls(true)).unwrap();

    let err = transport.get("/redfish/v1").await.unwrap_err();
    assert!(
        matches!(
            err,
            Error::Connection {
                kind: ConnectionKind::PlaintextOnTlsPort,
                ..
            }
        ),
        "expected plaintext diagnosis without retries, got: {err:?}"
    );
}
