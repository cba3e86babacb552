// src/types.rs
use serde::{de::DeserializeOwned, Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Challenge,
    Session,
}

/// Anything that travels inside a signed token.
pub trait SignedPayload: Serialize + DeserializeOwned {
    const KIND: TokenKind;

    fn kind(&self) -> TokenKind;

    /// Unix seconds after which the payload is dead.
    fn exp(&self) -> i64;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengePayload {
    pub kind: TokenKind,
    pub address: String,
    pub nonce: String,
    pub domain: String,
    pub uri: String,
    pub chain_id: u64,
    pub issued_at: String,
    pub exp: i64,
}

impl SignedPayload for ChallengePayload {
    const KIND: TokenKind = TokenKind::Challenge;

    fn kind(&self) -> TokenKind {
        self.kind
    }

    fn exp(&self) -> i64 {
        self.exp
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPayload {
    pub kind: TokenKind,
    pub address: String,
    pub exp: i64,
}

impl SignedPayload for SessionPayload {
    const KIND: TokenKind = TokenKind::Session;

    fn kind(&self) -> TokenKind {
        self.kind
    }

    fn exp(&self) -> i64 {
        self.exp
    }
}

// ---------- wire bodies ---------- //

#[derive(Debug, Default, Deserialize)]
pub struct NonceReq { #[serde(default)] pub address: Option<serde_json::Value> }

#[derive(Debug, Serialize, Deserialize)]
pub struct NonceRes { pub message: String }

#[derive(Debug, Default, Deserialize)]
pub struct VerifyReq {
    #[serde(default)]
    pub address: Option<serde_json::Value>,
    #[serde(default)]
    pub signature: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionRes { pub authenticated: bool, pub address: Option<String> }

#[derive(Debug, Serialize, Deserialize)]
pub struct OkRes { pub ok: bool }

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorRes { pub error: String }

/// Pulls a string field out of a loosely-typed body; non-strings read as empty.
pub fn string_field(v: &Option<serde_json::Value>) -> &str {
    v.as_ref().and_then(|v| v.as_str()).unwrap_or_default()
}
