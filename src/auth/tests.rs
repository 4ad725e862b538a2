//! Tests for the auth module

use super::*;
use crate::error::Error;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn token_body(token: &str) -> serde_json::Value {
    serde_json::json!({
        "access_token": token,
        "expires_in": 3600,
        "token_type": "Bearer",
        "scope": "api email openid profile"
    })
}

#[tokio::test]
async fn test_personal_access_token() {
    let auth = Authenticator::new(Credentials::token("my-pat"));

    let client = reqwest::Client::new();
    let req = client.get("https://example.com/api");
    let req = auth.apply(req).await.unwrap();

    let built = req.build().unwrap();
    assert_eq!(built.headers().get("Authorization").unwrap(), "Bearer my-pat");
}

#[tokio::test]
async fn test_password_grant_exchange() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/connect/token"))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("client_id=pat"))
        .and(body_string_contains("grant_type=password"))
        .and(body_string_contains("username=client-1"))
        .and(body_string_contains("password=code-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("exchanged")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let auth = Authenticator::new(Credentials::password_grant(
        format!("{}/connect/token", mock_server.uri()),
        "client-1",
        "code-1",
    ));

    let client = reqwest::Client::new();
    let req = auth.apply(client.get("https://example.com/api")).await.unwrap();

    let built = req.build().unwrap();
    assert_eq!(
        built.headers().get("Authorization").unwrap(),
        "Bearer exchanged"
    );
}

#[tokio::test]
async fn test_token_is_cached() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/connect/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("cached")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let auth = Authenticator::new(Credentials::password_grant(
        format!("{}/connect/token", mock_server.uri()),
        "client",
        "code",
    ));

    for _ in 0..3 {
        assert_eq!(auth.access_token().await.unwrap(), "cached");
    }
}

#[tokio::test]
async fn test_invalidate_forces_exchange() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/connect/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("fresh")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut creds = Credentials::password_grant(
        format!("{}/connect/token", mock_server.uri()),
        "client",
        "code",
    );
    creds.personal_access_token = Some("stale".to_string());
    let auth = Authenticator::new(creds);

    assert_eq!(auth.access_token().await.unwrap(), "stale");
    auth.invalidate().await;
    assert!(!auth.has_cached_token().await);
    assert_eq!(auth.access_token().await.unwrap(), "fresh");
}

#[tokio::test]
async fn test_invalidate_without_grant_fails() {
    let auth = Authenticator::new(Credentials::token("only-pat"));
    auth.invalidate().await;

    let err = auth.access_token().await.unwrap_err();
    assert!(matches!(err, Error::Auth { .. }));
}

#[tokio::test]
async fn test_token_request_failure_is_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/connect/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let auth = Authenticator::new(Credentials::password_grant(
        format!("{}/connect/token", mock_server.uri()),
        "client",
        "bad-code",
    ));

    let err = auth.access_token().await.unwrap_err();
    match err {
        Error::TokenRequest { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body, "invalid_grant");
        }
        other => panic!("Expected TokenRequest error, got {other:?}"),
    }
}
