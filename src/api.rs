use std::time::Duration as StdDuration;

use axum::{
    body::Bytes,
    extract::{FromRef, State},
    http::{header, HeaderMap},
    response::{AppendHeaders, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

use crate::address::is_address;
use crate::auth::WalletAuth;
use crate::cookies::{
    build_clear_cookie, build_set_cookie, CookieOptions, AUTH_CHALLENGE_COOKIE,
    AUTH_CHALLENGE_MAX_AGE_SECONDS, AUTH_SESSION_COOKIE, AUTH_SESSION_MAX_AGE_SECONDS,
};
use crate::error::AuthError;
use crate::identity::MaybeSessionWallet;
use crate::types::*;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub auth: WalletAuth,
}

impl AppState {
    pub fn new(auth: WalletAuth) -> Self {
        Self { auth }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/nonce", post(nonce))
        .route("/api/auth/verify", post(verify))
        .route("/api/auth/session", get(session))
        .route("/api/auth/logout", post(logout))
        .route("/health", get(health))
        .with_state(state)
        .layer(TimeoutLayer::new(StdDuration::from_secs(10)))
        .layer(TraceLayer::new_for_http())
}

// ---------- API HANDLERS ---------- //

async fn nonce(
    State(auth): State<WalletAuth>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AuthError> {
    let req: NonceReq = lenient_json(&body);
    let address = string_field(&req.address).trim();
    if address.is_empty() || !is_address(address) {
        return Err(AuthError::InvalidAddress);
    }

    let issued = auth.create_challenge(address, &headers);
    let secure = auth.config().secure_cookies;
    let cookie = build_set_cookie(
        AUTH_CHALLENGE_COOKIE,
        &issued.token,
        CookieOptions::new(secure, AUTH_CHALLENGE_MAX_AGE_SECONDS),
    );

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(NonceRes {
            message: issued.message,
        }),
    )
        .into_response())
}

async fn verify(
    State(auth): State<WalletAuth>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AuthError> {
    let req: VerifyReq = lenient_json(&body);
    let login = auth.verify_login(
        string_field(&req.address),
        string_field(&req.signature),
        &headers,
    )?;

    let secure = auth.config().secure_cookies;
    let session_cookie = build_set_cookie(
        AUTH_SESSION_COOKIE,
        &login.session_token,
        CookieOptions::new(secure, AUTH_SESSION_MAX_AGE_SECONDS),
    );

    Ok((
        AppendHeaders([
            (header::SET_COOKIE, session_cookie),
            (header::SET_COOKIE, build_clear_cookie(AUTH_CHALLENGE_COOKIE, secure)),
        ]),
        Json(SessionRes {
            authenticated: true,
            address: Some(login.address),
        }),
    )
        .into_response())
}

async fn session(MaybeSessionWallet(address): MaybeSessionWallet) -> Json<SessionRes> {
    Json(SessionRes {
        authenticated: address.is_some(),
        address,
    })
}

/// Overwrites both cookies. Tokens copied elsewhere stay valid until `exp`.
async fn logout(State(auth): State<WalletAuth>) -> Response {
    let secure = auth.config().secure_cookies;
    info!("wallet logout");
    (
        AppendHeaders([
            (header::SET_COOKIE, build_clear_cookie(AUTH_SESSION_COOKIE, secure)),
            (header::SET_COOKIE, build_clear_cookie(AUTH_CHALLENGE_COOKIE, secure)),
        ]),
        Json(OkRes { ok: true }),
    )
        .into_response()
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"ok": true}))
}

/// Anything other than a JSON object (missing, not JSON, an array) reads as all-defaults.
fn lenient_json<T: DeserializeOwned + Default>(body: &[u8]) -> T {
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) if value.is_object() => serde_json::from_value(value).unwrap_or_default(),
        _ => T::default(),
    }
}
