//! Signed bearer tokens: `base64url(json(payload)) "." base64url(hmac_sha256(secret, encoded))`.
//!
//! Every inbound token goes through [`TokenSigner::verify`]; nothing reads a payload
//! without checking its MAC first. Corrupt input always comes back as `None`.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::{de::DeserializeOwned, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::config::AuthConfig;
use crate::types::SignedPayload;

type HmacSha256 = Hmac<Sha256>;

pub fn encode<T: Serialize>(payload: &T) -> String {
    // Plain data structs only; serde_json cannot fail on them.
    let json = serde_json::to_vec(payload).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

pub fn decode<T: DeserializeOwned>(encoded: &str) -> Option<T> {
    let bytes = URL_SAFE_NO_PAD.decode(encoded.trim_end_matches('=')).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Length may short-circuit; content may not.
pub fn signatures_match(provided: &str, expected: &str) -> bool {
    let (a, b) = (provided.as_bytes(), expected.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
}

impl TokenSigner {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            secret: config.secret().to_vec(),
        }
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length.
        HmacSha256::new_from_slice(&self.secret).expect("hmac key of any size")
    }

    pub fn sign(&self, encoded: &str) -> String {
        let mut mac = self.mac();
        mac.update(encoded.as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }

    pub fn create<T: SignedPayload>(&self, payload: &T) -> String {
        let encoded = encode(payload);
        let signature = self.sign(&encoded);
        format!("{encoded}.{signature}")
    }

    /// Checks MAC, kind and expiry (`exp` must be strictly after `now`).
    pub fn verify<T: SignedPayload>(&self, token: &str, now: i64) -> Option<T> {
        let (encoded, signature) = token.split_once('.')?;
        if encoded.is_empty() || signature.is_empty() || signature.contains('.') {
            return None;
        }
        if !signatures_match(signature, &self.sign(encoded)) {
            return None;
        }
        let payload: T = decode(encoded)?;
        if payload.kind() != T::KIND || payload.exp() <= now {
            return None;
        }
        Some(payload)
    }
}
