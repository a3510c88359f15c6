//! Integration tests for `TokenManager`.
//!
//! A `wiremock` server stands in for the platform's token endpoint. Each test
//! seeds a `MemoryTokenStore`, runs the manager, and asserts on both the number
//! of grant calls and what ended up in the store.

use std::sync::Arc;

use chrono::{Duration, Utc};
use mallfeed_core::GrantMode;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mallfeed_client::{
    build_http_client, AccessToken, ClientError, MemoryTokenStore, OAuthClient, OAuthCredentials,
    TokenManager, TokenState, TokenStore,
};

fn credentials() -> OAuthCredentials {
    OAuthCredentials {
        client_id: "client-abc".to_owned(),
        client_secret: SecretString::from("secret-xyz"),
        scope: "mall.read_product".to_owned(),
        redirect_uri: "https://feed.example.com/".to_owned(),
    }
}

fn manager(server: &MockServer, store: Arc<MemoryTokenStore>, mode: GrantMode) -> TokenManager {
    let http = build_http_client(5, "mallfeed-test/0.1").expect("http client");
    let oauth = OAuthClient::new(http, &server.uri(), credentials()).expect("oauth client");
    TokenManager::new(oauth, store, mode)
}

fn access_expiring_in(token: &str, secs: i64) -> AccessToken {
    AccessToken {
        token: SecretString::from(token.to_owned()),
        expires_at: Utc::now() + Duration::seconds(secs),
    }
}

fn token_body(access: &str, refresh: Option<&str>) -> serde_json::Value {
    match refresh {
        Some(refresh) => json!({
            "access_token": access,
            "refresh_token": refresh,
            "expires_in": 7200
        }),
        None => json!({ "access_token": access, "expires_in": 7200 }),
    }
}

// ---------------------------------------------------------------------------
// Cache hits
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fresh_cached_token_is_returned_without_network_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("NEW", None)))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_state(TokenState {
        access: Some(access_expiring_in("CACHED", 10 * 60)),
        refresh_token: None,
    }));
    let manager = manager(&server, Arc::clone(&store), GrantMode::ClientCredentials);

    let token = manager.acquire_token().await.expect("cached token");
    assert_eq!(token.expose_secret(), "CACHED");
    server.verify().await;
}

#[tokio::test]
async fn token_inside_safety_margin_triggers_exactly_one_renewal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("scope=mall.read_product"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("NEW", None)))
        .expect(1)
        .mount(&server)
        .await;

    // Expires in 4 minutes: still valid, but inside the 5 minute margin.
    let store = Arc::new(MemoryTokenStore::with_state(TokenState {
        access: Some(access_expiring_in("OLD", 4 * 60)),
        refresh_token: None,
    }));
    let manager = manager(&server, Arc::clone(&store), GrantMode::ClientCredentials);

    let token = manager.acquire_token().await.expect("renewed token");
    assert_eq!(token.expose_secret(), "NEW");

    // The renewed token is now cached; a second call stays off the network.
    let again = manager.acquire_token().await.expect("cached token");
    assert_eq!(again.expose_secret(), "NEW");

    let stored = store.get().access.expect("access token stored");
    assert!(stored.expires_at > Utc::now() + Duration::minutes(100));
    server.verify().await;
}

#[tokio::test]
async fn expired_token_is_renewed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("NEW", None)))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_state(TokenState {
        access: Some(access_expiring_in("OLD", -30)),
        refresh_token: None,
    }));
    let manager = manager(&server, store, GrantMode::ClientCredentials);

    let token = manager.acquire_token().await.expect("renewed token");
    assert_eq!(token.expose_secret(), "NEW");
    server.verify().await;
}

#[tokio::test]
async fn oversized_expires_in_is_capped_instead_of_overflowing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "T1", "expires_in": 10_000_000_000_000_i64 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    let manager = manager(&server, store.clone(), GrantMode::ClientCredentials);

    let first = manager.acquire_token().await.expect("token issued");
    assert_eq!(first.expose_secret(), "T1");
    let second = manager.acquire_token().await.expect("cached token");
    assert_eq!(second.expose_secret(), "T1");

    let stored = store.get().access.expect("access token stored");
    assert!(stored.expires_at > Utc::now() + Duration::days(365));
    server.verify().await;
}

#[tokio::test]
async fn oversized_refresh_margin_is_clamped() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryTokenStore::with_state(TokenState {
        access: Some(access_expiring_in("CACHED", 2 * 24 * 60 * 60)),
        refresh_token: None,
    }));
    let manager =
        manager(&server, store, GrantMode::ClientCredentials).with_refresh_margin_secs(i64::MAX);

    let token = manager.acquire_token().await.expect("cached token");
    assert_eq!(token.expose_secret(), "CACHED");
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

// ---------------------------------------------------------------------------
// Refresh-token mode
// ---------------------------------------------------------------------------

#[tokio::test]
async fn authorization_code_mode_without_refresh_token_requires_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("NEW", None)))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    let manager = manager(&server, store, GrantMode::AuthorizationCode);

    let err = manager.acquire_token().await.unwrap_err();
    assert!(
        matches!(err, ClientError::AuthRequired),
        "expected AuthRequired, got: {err:?}"
    );
    server.verify().await;
}

#[tokio::test]
async fn refresh_grant_rotates_refresh_token_when_supplied() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=R1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("A2", Some("R2"))))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_state(TokenState::with_refresh_token(
        SecretString::from("R1"),
    )));
    let manager = manager(&server, Arc::clone(&store), GrantMode::AuthorizationCode);

    let token = manager.acquire_token().await.expect("refreshed token");
    assert_eq!(token.expose_secret(), "A2");
    let state = store.get();
    assert_eq!(state.refresh_token.expect("refresh").expose_secret(), "R2");
    server.verify().await;
}

#[tokio::test]
async fn refresh_grant_keeps_old_refresh_token_when_not_rotated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("A2", None)))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_state(TokenState {
        access: Some(access_expiring_in("A1", -10)),
        refresh_token: Some(SecretString::from("R1")),
    }));
    let manager = manager(&server, Arc::clone(&store), GrantMode::AuthorizationCode);

    manager.acquire_token().await.expect("refreshed token");
    let state = store.get();
    assert_eq!(state.access.expect("access").token.expose_secret(), "A2");
    assert_eq!(state.refresh_token.expect("refresh").expose_secret(), "R1");
}

#[tokio::test]
async fn rejected_refresh_clears_both_tokens_and_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_string(r#"{"error":"invalid_grant","error_description":"expired"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_state(TokenState {
        access: Some(access_expiring_in("A1", -10)),
        refresh_token: Some(SecretString::from("R1")),
    }));
    let manager = manager(&server, Arc::clone(&store), GrantMode::AuthorizationCode);

    let err = manager.acquire_token().await.unwrap_err();
    match err {
        ClientError::UpstreamAuth { status, ref body, .. } => {
            assert_eq!(status, 400);
            assert!(body.contains("invalid_grant"));
        }
        other => panic!("expected UpstreamAuth, got: {other:?}"),
    }

    let state = store.get();
    assert!(state.access.is_none());
    assert!(state.refresh_token.is_none());
    server.verify().await;
}

#[tokio::test]
async fn rejected_client_credentials_grant_clears_access_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("<html>denied</html>"))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_state(TokenState {
        access: Some(access_expiring_in("A1", 60)),
        refresh_token: None,
    }));
    let manager = manager(&server, Arc::clone(&store), GrantMode::ClientCredentials);

    let err = manager.acquire_token().await.unwrap_err();
    assert!(
        matches!(err, ClientError::UpstreamAuth { status: 401, .. }),
        "expected UpstreamAuth(401), got: {err:?}"
    );
    assert!(store.get().access.is_none());
}

// ---------------------------------------------------------------------------
// Single flight
// ---------------------------------------------------------------------------

#[tokio::test]
async fn concurrent_callers_share_one_renewal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_body("A2", Some("R2")))
                .set_delay(std::time::Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_state(TokenState::with_refresh_token(
        SecretString::from("R1"),
    )));
    let manager = manager(&server, Arc::clone(&store), GrantMode::AuthorizationCode);

    let (first, second, third) = futures::join!(
        manager.acquire_token(),
        manager.acquire_token(),
        manager.acquire_token()
    );

    for token in [first, second, third] {
        assert_eq!(token.expect("token").expose_secret(), "A2");
    }
    server.verify().await;
}

// ---------------------------------------------------------------------------
// Authorization code exchange
// ---------------------------------------------------------------------------

#[tokio::test]
async fn exchange_code_stores_token_pair() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=abc123"))
        .and(body_string_contains(
            "redirect_uri=https%3A%2F%2Ffeed.example.com%2F",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("A1", Some("R1"))))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    let manager = manager(&server, Arc::clone(&store), GrantMode::AuthorizationCode);

    manager.exchange_code("abc123").await.expect("exchange");
    assert!(manager.has_fresh_token());

    let state = store.get();
    assert_eq!(state.access.expect("access").token.expose_secret(), "A1");
    assert_eq!(state.refresh_token.expect("refresh").expose_secret(), "R1");
    server.verify().await;
}

#[tokio::test]
async fn failed_exchange_leaves_existing_tokens_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid_code"))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_state(TokenState::with_refresh_token(
        SecretString::from("R1"),
    )));
    let manager = manager(&server, Arc::clone(&store), GrantMode::AuthorizationCode);

    let err = manager.exchange_code("stale").await.unwrap_err();
    assert!(matches!(err, ClientError::UpstreamAuth { status: 400, .. }));
    assert_eq!(
        store.get().refresh_token.expect("refresh kept").expose_secret(),
        "R1"
    );
}
