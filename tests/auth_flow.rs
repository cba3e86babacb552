//! End-to-end wallet sign-in over the HTTP router.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use chrono::{DateTime, Duration};
use http_body_util::BodyExt;
use hottasks_auth::clock::ManualClock;
use hottasks_auth::cookies::{CookieJar, CookieSource, AUTH_CHALLENGE_COOKIE, AUTH_SESSION_COOKIE};
use hottasks_auth::eip191::{address_of, personal_message_hash, Eip191Verifier};
use hottasks_auth::{router, AppState, AuthConfig, WalletAuth};
use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use serde_json::{json, Value};
use tower::ServiceExt; // For `oneshot`

struct Wallet {
    key: SigningKey,
    address: String,
}

impl Wallet {
    fn random() -> Self {
        let key = SigningKey::random(&mut OsRng);
        let address = address_of(key.verifying_key());
        Self { key, address }
    }

    fn sign(&self, message: &str) -> String {
        let (sig, recid) = self
            .key
            .sign_prehash_recoverable(&personal_message_hash(message))
            .unwrap();
        let mut bytes = sig.to_bytes().to_vec();
        bytes.push(recid.to_byte() + 27);
        format!("0x{}", hex::encode(bytes))
    }
}

struct Harness {
    app: axum::Router,
    clock: Arc<ManualClock>,
}

impl Harness {
    fn new() -> Self {
        let clock = Arc::new(ManualClock::new(
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        ));
        let auth = WalletAuth::with_parts(
            AuthConfig::new("integration-test-secret").unwrap(),
            clock.clone(),
            Arc::new(Eip191Verifier),
        );
        Self {
            app: router(AppState::new(auth)),
            clock,
        }
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        jar: &CookieJar,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::HOST, "tasks.example.com")
            .header("x-forwarded-proto", "https");
        let cookies = jar.to_header();
        if !cookies.is_empty() {
            builder = builder.header(header::COOKIE, cookies);
        }
        let body = match body {
            Some(v) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        self.app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
    }

    /// Sends a request and folds the response cookies back into `jar`.
    async fn call(
        &self,
        method: &str,
        uri: &str,
        jar: &mut CookieJar,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let res = self.send(method, uri, jar, body).await;
        jar.apply_set_cookies(res.headers());
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn challenge(&self, jar: &mut CookieJar, address: &str) -> String {
        let (status, body) = self
            .call("POST", "/api/auth/nonce", jar, Some(json!({ "address": address })))
            .await;
        assert_eq!(status, StatusCode::OK);
        body["message"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_full_sign_in() {
    let h = Harness::new();
    let wallet = Wallet::random();
    let mut jar = CookieJar::new();

    let message = h.challenge(&mut jar, &wallet.address).await;
    assert!(message.starts_with("tasks.example.com wants you to sign in to HOTTasks.\n"));
    assert!(message.contains("\nURI: https://tasks.example.com\n"));
    assert!(message.contains("\nChain ID: 11155111\n"));
    assert!(jar.cookie(AUTH_CHALLENGE_COOKIE).is_some());

    let (status, body) = h
        .call(
            "POST",
            "/api/auth/verify",
            &mut jar,
            Some(json!({ "address": wallet.address, "signature": wallet.sign(&message) })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "authenticated": true, "address": wallet.address }));
    assert!(jar.cookie(AUTH_SESSION_COOKIE).is_some());
    assert!(jar.cookie(AUTH_CHALLENGE_COOKIE).is_none());

    let (_, body) = h.call("GET", "/api/auth/session", &mut jar, None).await;
    assert_eq!(body, json!({ "authenticated": true, "address": wallet.address }));
}

#[tokio::test]
async fn test_cookie_attributes() {
    let h = Harness::new();
    let wallet = Wallet::random();
    let res = h
        .send(
            "POST",
            "/api/auth/nonce",
            &CookieJar::new(),
            Some(json!({ "address": wallet.address })),
        )
        .await;
    let cookie = res.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("hot_auth_challenge="));
    assert!(cookie.contains("Max-Age=600"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(!cookie.contains("Secure"));
}

#[tokio::test]
async fn test_answered_challenge_cannot_be_reused() {
    let h = Harness::new();
    let wallet = Wallet::random();
    let mut jar = CookieJar::new();
    let message = h.challenge(&mut jar, &wallet.address).await;
    let verify = json!({ "address": wallet.address, "signature": wallet.sign(&message) });

    let (status, _) = h.call("POST", "/api/auth/verify", &mut jar, Some(verify.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = h.call("POST", "/api/auth/verify", &mut jar, Some(verify)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Challenge missing or expired.");
}

#[tokio::test]
async fn test_address_mismatch_sets_no_session() {
    let h = Harness::new();
    let alice = Wallet::random();
    let mallory = Wallet::random();
    let mut jar = CookieJar::new();
    let message = h.challenge(&mut jar, &alice.address).await;

    let res = h
        .send(
            "POST",
            "/api/auth/verify",
            &jar,
            Some(json!({ "address": mallory.address, "signature": mallory.sign(&message) })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().get(header::SET_COOKIE).is_none());
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "Challenge address mismatch.");
}

#[tokio::test]
async fn test_expired_challenge() {
    let h = Harness::new();
    let wallet = Wallet::random();
    let mut jar = CookieJar::new();
    let message = h.challenge(&mut jar, &wallet.address).await;

    h.clock.advance(Duration::minutes(10) + Duration::seconds(1));

    let (status, body) = h
        .call(
            "POST",
            "/api/auth/verify",
            &mut jar,
            Some(json!({ "address": wallet.address, "signature": wallet.sign(&message) })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Challenge missing or expired.");
    assert!(jar.cookie(AUTH_SESSION_COOKIE).is_none());
}

#[tokio::test]
async fn test_bad_signature() {
    let h = Harness::new();
    let wallet = Wallet::random();
    let mut jar = CookieJar::new();
    h.challenge(&mut jar, &wallet.address).await;

    let (status, body) = h
        .call(
            "POST",
            "/api/auth/verify",
            &mut jar,
            Some(json!({
                "address": wallet.address,
                "signature": wallet.sign("not the challenge"),
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Signature verification failed.");
}

#[tokio::test]
async fn test_malformed_requests() {
    let h = Harness::new();
    let mut jar = CookieJar::new();

    let bodies = [
        None,
        Some(json!({})),
        Some(json!({ "address": 42 })),
        Some(json!({ "address": "0x1234" })),
    ];
    for body in bodies {
        let (status, res) = h.call("POST", "/api/auth/nonce", &mut jar, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(res["error"], "Valid wallet address required.");
    }

    // mixed case with a broken checksum
    let (status, _) = h
        .call(
            "POST",
            "/api/auth/nonce",
            &mut jar,
            Some(json!({ "address": "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAeD" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, res) = h
        .call(
            "POST",
            "/api/auth/verify",
            &mut jar,
            Some(json!({ "address": Wallet::random().address })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(res["error"], "Invalid authentication payload.");
}

#[tokio::test]
async fn test_array_bodies_are_empty() {
    let h = Harness::new();
    let wallet = Wallet::random();
    let mut jar = CookieJar::new();

    let (status, res) = h
        .call("POST", "/api/auth/nonce", &mut jar, Some(json!([wallet.address])))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(res["error"], "Valid wallet address required.");
    assert!(jar.cookie(AUTH_CHALLENGE_COOKIE).is_none());

    let message = h.challenge(&mut jar, &wallet.address).await;
    let (status, res) = h
        .call(
            "POST",
            "/api/auth/verify",
            &mut jar,
            Some(json!([wallet.address, wallet.sign(&message)])),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(res["error"], "Invalid authentication payload.");
    assert!(jar.cookie(AUTH_SESSION_COOKIE).is_none());
}

#[tokio::test]
async fn test_session_without_cookies() {
    let h = Harness::new();
    let (status, body) = h.call("GET", "/api/auth/session", &mut CookieJar::new(), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "authenticated": false, "address": null }));
}

#[tokio::test]
async fn test_forged_session_cookie() {
    let h = Harness::new();
    let mut jar = CookieJar::new();
    jar.insert(AUTH_SESSION_COOKIE, "eyJraW5kIjoic2Vzc2lvbiJ9.AAAA");
    let (_, body) = h.call("GET", "/api/auth/session", &mut jar, None).await;
    assert_eq!(body, json!({ "authenticated": false, "address": null }));
}

#[tokio::test]
async fn test_logout_does_not_revoke_copied_token() {
    let h = Harness::new();
    let wallet = Wallet::random();
    let mut jar = CookieJar::new();
    let message = h.challenge(&mut jar, &wallet.address).await;
    h.call(
        "POST",
        "/api/auth/verify",
        &mut jar,
        Some(json!({ "address": wallet.address, "signature": wallet.sign(&message) })),
    )
    .await;
    let captured = jar.clone();

    let (status, body) = h.call("POST", "/api/auth/logout", &mut jar, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
    assert!(jar.cookie(AUTH_SESSION_COOKIE).is_none());

    let (_, body) = h.call("GET", "/api/auth/session", &mut jar, None).await;
    assert_eq!(body["authenticated"], false);

    // No revocation list: the old value keeps working until it expires.
    let mut replay = captured.clone();
    let (_, body) = h.call("GET", "/api/auth/session", &mut replay, None).await;
    assert_eq!(body, json!({ "authenticated": true, "address": wallet.address }));

    h.clock.advance(Duration::days(7) + Duration::seconds(1));
    let mut replay = captured;
    let (_, body) = h.call("GET", "/api/auth/session", &mut replay, None).await;
    assert_eq!(body["authenticated"], false);
}

#[tokio::test]
async fn test_health() {
    let h = Harness::new();
    let (status, body) = h.call("GET", "/health", &mut CookieJar::new(), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
}
