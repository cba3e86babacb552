//! Wallet sign-in: challenge issuance, signature check, session minting.
//!
//! Flow:
//! 1. `POST /api/auth/nonce` mints a signed challenge (cookie) and the message to sign.
//! 2. The wallet signs the message off-system (personal_sign).
//! 3. `POST /api/auth/verify` re-derives the challenge from the cookie, checks the
//!    signature, and swaps the challenge cookie for a session cookie.
//!
//! Nothing is stored server-side. A challenge is trusted because its HMAC checks out,
//! not because it can be found in a table.

use std::sync::Arc;

use axum::http::HeaderMap;
use chrono::SecondsFormat;
use rand::RngCore;
use tracing::{debug, info, warn};

use crate::address::{is_address, normalize_wallet_address};
use crate::canon::canonical_message;
use crate::clock::{Clock, SystemClock};
use crate::config::AuthConfig;
use crate::cookies::{
    CookieSource, AUTH_CHALLENGE_COOKIE, AUTH_CHALLENGE_MAX_AGE_SECONDS, AUTH_SESSION_COOKIE,
    AUTH_SESSION_MAX_AGE_SECONDS, WALLET_COOKIE,
};
use crate::eip191::{Eip191Verifier, SignatureVerifier};
use crate::error::AuthError;
use crate::token::TokenSigner;
use crate::types::{ChallengePayload, SessionPayload, TokenKind};

const DEFAULT_HOST: &str = "localhost:3000";

#[derive(Debug, Clone)]
pub struct IssuedChallenge {
    pub token: String,
    pub message: String,
    pub payload: ChallengePayload,
}

#[derive(Debug, Clone)]
pub struct VerifiedLogin {
    pub address: String,
    pub session_token: String,
}

#[derive(Clone)]
pub struct WalletAuth {
    config: Arc<AuthConfig>,
    signer: TokenSigner,
    clock: Arc<dyn Clock>,
    verifier: Arc<dyn SignatureVerifier>,
}

impl WalletAuth {
    pub fn new(config: AuthConfig) -> Self {
        Self::with_parts(config, Arc::new(SystemClock), Arc::new(Eip191Verifier))
    }

    pub fn with_parts(
        config: AuthConfig,
        clock: Arc<dyn Clock>,
        verifier: Arc<dyn SignatureVerifier>,
    ) -> Self {
        let signer = TokenSigner::new(&config);
        Self {
            config: Arc::new(config),
            signer,
            clock,
            verifier,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    pub fn now(&self) -> i64 {
        self.clock.unix()
    }

    pub fn message_for(&self, payload: &ChallengePayload) -> String {
        canonical_message(payload, &self.config.app_name)
    }

    // ---------- challenge ---------- //

    pub fn create_challenge(&self, address: &str, headers: &HeaderMap) -> IssuedChallenge {
        let (uri, domain) = request_origin(headers);
        let now = self.clock.now();

        let payload = ChallengePayload {
            kind: TokenKind::Challenge,
            address: normalize_wallet_address(address),
            nonce: gen_nonce(),
            domain,
            uri,
            chain_id: self.config.chain_id,
            issued_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            exp: now.timestamp() + AUTH_CHALLENGE_MAX_AGE_SECONDS,
        };

        debug!(address = %payload.address, domain = %payload.domain, "challenge issued");
        IssuedChallenge {
            token: self.signer.create(&payload),
            message: self.message_for(&payload),
            payload,
        }
    }

    pub fn verify_challenge<C: CookieSource + ?Sized>(
        &self,
        cookies: &C,
    ) -> Option<ChallengePayload> {
        let token = cookies.cookie(AUTH_CHALLENGE_COOKIE)?;
        self.signer.verify(&token, self.now())
    }

    // ---------- verification ---------- //

    /// Runs the `ChallengeIssued -> Verified` checks in order; the first failure wins.
    pub fn verify_login<C: CookieSource + ?Sized>(
        &self,
        address: &str,
        signature: &str,
        cookies: &C,
    ) -> Result<VerifiedLogin, AuthError> {
        let address = normalize_wallet_address(address);
        let signature = signature.trim();
        if address.is_empty() || signature.is_empty() || !is_address(&address) {
            return Err(AuthError::InvalidPayload);
        }

        let Some(challenge) = self.verify_challenge(cookies) else {
            warn!(%address, "verify rejected: challenge missing or expired");
            return Err(AuthError::ChallengeMissing);
        };

        if challenge.address != address {
            warn!(%address, bound = %challenge.address, "verify rejected: address mismatch");
            return Err(AuthError::AddressMismatch);
        }

        let message = self.message_for(&challenge);
        if !self.verifier.verify(&address, &message, signature) {
            warn!(%address, "verify rejected: bad signature");
            return Err(AuthError::SignatureInvalid);
        }

        info!(%address, "wallet session issued");
        Ok(VerifiedLogin {
            session_token: self.create_session(&address),
            address,
        })
    }

    // ---------- session ---------- //

    pub fn create_session(&self, address: &str) -> String {
        self.signer.create(&SessionPayload {
            kind: TokenKind::Session,
            address: normalize_wallet_address(address),
            exp: self.now() + AUTH_SESSION_MAX_AGE_SECONDS,
        })
    }

    pub fn read_session_address<C: CookieSource + ?Sized>(&self, cookies: &C) -> Option<String> {
        let token = cookies.cookie(AUTH_SESSION_COOKIE)?;
        self.signer
            .verify::<SessionPayload>(&token, self.now())
            .map(|p| p.address)
    }

    /// Verified session address first; otherwise the raw `hot_wallet` cookie.
    ///
    /// The fallback is unauthenticated. Never use this result to move funds.
    pub fn read_wallet_address<C: CookieSource + ?Sized>(&self, cookies: &C) -> Option<String> {
        if let Some(address) = self.read_session_address(cookies) {
            return Some(address);
        }
        let wallet = normalize_wallet_address(&cookies.cookie(WALLET_COOKIE)?);
        (!wallet.is_empty()).then_some(wallet)
    }
}

fn gen_nonce() -> String {
    let mut b = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut b);
    hex::encode(b)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// `(origin, host)` as the browser saw it, honoring reverse-proxy headers.
/// Plain http is assumed only for loopback hosts.
pub fn request_origin(headers: &HeaderMap) -> (String, String) {
    let host = header_str(headers, "x-forwarded-host")
        .or_else(|| header_str(headers, "host"))
        .unwrap_or(DEFAULT_HOST)
        .to_ascii_lowercase();

    let proto = header_str(headers, "x-forwarded-proto")
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| {
            if host.starts_with("localhost") || host.starts_with("127.0.0.1") {
                "http".into()
            } else {
                "https".into()
            }
        });

    let default_port = match proto.as_str() {
        "http" => Some(":80"),
        "https" => Some(":443"),
        _ => None,
    };
    let domain = match default_port {
        Some(port) => host.strip_suffix(port).unwrap_or(&host).to_string(),
        None => host.clone(),
    };

    (format!("{proto}://{host}"), domain)
}
