//! HTTP source backend against a mock secret-manager API.

use base64::Engine;
use keyline::secrets::SecretName;
use keyline::source::{HttpSecretSource, HttpSourceConfig, SecretSource, SourceError};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn source_for(server: &MockServer, token: Option<&str>) -> HttpSecretSource {
    HttpSecretSource::new(HttpSourceConfig {
        base_url: server.uri(),
        token: token.map(String::from),
        timeout_secs: 2,
    })
    .unwrap()
}

fn version_body(version: &str, payload: &[u8]) -> serde_json::Value {
    serde_json::json!({
        "version": version,
        "payload": { "data": base64::engine::general_purpose::STANDARD.encode(payload) }
    })
}

#[tokio::test]
async fn fetches_and_decodes_latest_version() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secrets/db-password/versions/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(version_body("v7", b"hunter2")))
        .mount(&server)
        .await;

    let source = source_for(&server, None);
    let secret = source.fetch(&SecretName::from("db-password")).await.unwrap();

    assert_eq!(secret.version.as_str(), "v7");
    assert_eq!(secret.payload.expose(), b"hunter2");
}

#[tokio::test]
async fn sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secrets/api-key/versions/latest"))
        .and(header("authorization", "Bearer store-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(version_body("v1", b"abc")))
        .expect(1)
        .mount(&server)
        .await;

    let source = source_for(&server, Some("store-token"));
    source.fetch(&SecretName::from("api-key")).await.unwrap();
}

#[tokio::test]
async fn maps_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = source_for(&server, None).fetch(&SecretName::from("gone")).await.unwrap_err();
    assert!(matches!(err, SourceError::NotFound { .. }));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn maps_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = source_for(&server, None).fetch(&SecretName::from("locked")).await.unwrap_err();
    assert!(matches!(err, SourceError::Unauthorized { .. }));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn maps_server_errors_as_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = source_for(&server, None).fetch(&SecretName::from("flaky")).await.unwrap_err();
    assert!(matches!(err, SourceError::Unavailable { .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn undecodable_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = source_for(&server, None).fetch(&SecretName::from("weird")).await.unwrap_err();
    assert!(matches!(err, SourceError::Malformed { .. }));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn invalid_base64_is_malformed() {
    let server = MockServer::start().await;
    let body = serde_json::json!({ "version": "v1", "payload": { "data": "!!! not base64 !!!" } });
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let err = source_for(&server, None).fetch(&SecretName::from("weird")).await.unwrap_err();
    assert!(matches!(err, SourceError::Malformed { .. }));
}

#[tokio::test]
async fn oversized_payload_is_rejected() {
    let server = MockServer::start().await;
    let oversized = vec![b'x'; keyline::secrets::MAX_PAYLOAD_BYTES + 1];
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(version_body("v1", &oversized)))
        .mount(&server)
        .await;

    let err = source_for(&server, None).fetch(&SecretName::from("huge")).await.unwrap_err();
    assert!(matches!(err, SourceError::PayloadTooLarge { .. }));
    assert!(!err.is_transient());
}
