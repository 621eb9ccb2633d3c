use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use groundwork_api::app::{AppState, build_app, build_app_with_state};
use groundwork_http::{HttpConfig, HttpServer};
use groundwork_jwt::{Claims, KeyConfig, SigningAlgorithm, TokenManager};
use reqwest::StatusCode;
use serde_json::json;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(app: axum::Router) -> Self {
        // Same server wrapper as prod, bound to an ephemeral port.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let server = HttpServer::new(HttpConfig::default())
            .unwrap()
            .mount("/", app);
        let handle = tokio::spawn(async move {
            server
                .serve_listener(listener, std::future::pending())
                .await
                .unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn hmac(secret: &str) -> Arc<TokenManager> {
    Arc::new(TokenManager::from_secret(SigningAlgorithm::HS256, secret.as_bytes()).unwrap())
}

fn jwt_fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../jwt/tests/fixtures")
        .join(name)
}

fn mint(tokens: &TokenManager, uid: &str) -> String {
    let claims = Claims::new(uid)
        .with_display_name("Test User")
        .issued_now()
        .expires_in(ChronoDuration::minutes(10));
    tokens.signed_token(&claims).unwrap()
}

async fn error_code(res: reqwest::Response) -> String {
    let body: serde_json::Value = res.json().await.unwrap();
    body["error"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn(build_app(hmac("test-secret"))).await;

    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn(build_app(hmac("test-secret"))).await;

    let res = reqwest::get(srv.url("/whoami")).await.unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.headers()["www-authenticate"], "Bearer");
    assert_eq!(error_code(res).await, "missing_token");
}

#[tokio::test]
async fn principal_is_derived_from_token() {
    let tokens = hmac("test-secret");
    let srv = TestServer::spawn(build_app(tokens.clone())).await;
    let token = mint(&tokens, "user-42");

    let client = reqwest::Client::new();
    let res = client
        .get(srv.url("/whoami"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["uid"], "user-42");
    assert_eq!(body["algorithm"], "HS256");
    assert_eq!(body["claims"]["display_name"], "Test User");
}

#[tokio::test]
async fn expired_token_is_rejected_with_its_kind() {
    let tokens = hmac("test-secret");
    let srv = TestServer::spawn(build_app(tokens.clone())).await;

    let claims = Claims::new("user-42").expires_at(Utc::now() - ChronoDuration::hours(1));
    let token = tokens.signed_token(&claims).unwrap();

    let res = reqwest::Client::new()
        .get(srv.url("/whoami"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await, "expired_token");
}

#[tokio::test]
async fn token_from_another_secret_is_rejected() {
    let srv = TestServer::spawn(build_app(hmac("test-secret"))).await;
    let forged = mint(&hmac("wrong-secret"), "user-42");

    let res = reqwest::Client::new()
        .get(srv.url("/whoami"))
        .bearer_auth(forged)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await, "invalid_signature");
}

#[tokio::test]
async fn token_for_another_algorithm_is_rejected() {
    let es256 = TokenManager::new(
        SigningAlgorithm::ES256,
        &KeyConfig::public_only(jwt_fixture("es256_a_public.pem")),
    )
    .unwrap();
    let srv = TestServer::spawn(build_app(Arc::new(es256))).await;
    let token = mint(&hmac("test-secret"), "user-42");

    let res = reqwest::Client::new()
        .get(srv.url("/whoami"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await, "algorithm_mismatch");
}

#[tokio::test]
async fn garbage_token_is_malformed() {
    let srv = TestServer::spawn(build_app(hmac("test-secret"))).await;

    let res = reqwest::Client::new()
        .get(srv.url("/whoami"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await, "malformed_token");
}

#[tokio::test]
async fn issued_token_authenticates() {
    let state = AppState::new(hmac("test-secret"))
        .with_token_ttl(ChronoDuration::minutes(5))
        .with_issuer(Some(String::from("groundwork-test")));
    let srv = TestServer::spawn(build_app_with_state(state)).await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/token"))
        .json(&json!({ "uid": "user-7", "email": "u7@example.com", "audience": ["web"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let issued: serde_json::Value = res.json().await.unwrap();
    assert_eq!(issued["token_type"], "Bearer");
    let expires_at = issued["expires_at"].as_i64().unwrap();
    let ttl = expires_at - Utc::now().timestamp();
    assert!((0..=300).contains(&ttl), "{ttl}");

    let res = client
        .get(srv.url("/whoami"))
        .bearer_auth(issued["access_token"].as_str().unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["uid"], "user-7");
    assert_eq!(body["claims"]["email"], "u7@example.com");
    assert_eq!(body["claims"]["iss"], "groundwork-test");
    assert_eq!(body["claims"]["aud"], json!(["web"]));
}

#[tokio::test]
async fn issuing_requires_a_uid() {
    let srv = TestServer::spawn(build_app(hmac("test-secret"))).await;

    let res = reqwest::Client::new()
        .post(srv.url("/token"))
        .json(&json!({ "uid": "  " }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "validation_error");
}

#[tokio::test]
async fn verify_only_service_does_not_issue() {
    let verifier = TokenManager::new(
        SigningAlgorithm::ES256,
        &KeyConfig::public_only(jwt_fixture("es256_a_public.pem")),
    )
    .unwrap();
    let signer = TokenManager::new(
        SigningAlgorithm::ES256,
        &KeyConfig::private_only(jwt_fixture("es256_a_private.pem")),
    )
    .unwrap();
    let srv = TestServer::spawn(build_app(Arc::new(verifier))).await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/token"))
        .json(&json!({ "uid": "user-1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Tokens minted elsewhere with the matching private key are accepted.
    let res = client
        .get(srv.url("/whoami"))
        .bearer_auth(mint(&signer, "user-1"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_paths_are_not_found_without_a_token() {
    let srv = TestServer::spawn(build_app(hmac("test-secret"))).await;

    let res = reqwest::get(srv.url("/does-not-exist")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Known path, wrong method: still decided by the router, not by auth.
    let res = reqwest::Client::new()
        .delete(srv.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
}
