//! Who is calling. Two channels with very different strength:
//!
//! - [`SessionWallet`]: the address bound into a signed session cookie. Proof that the
//!   caller once signed a challenge with that wallet.
//! - [`HeaderWallet`]: whatever the `x-wallet` header says. No proof of anything; only
//!   meaningful behind something that already authenticated the caller.
//!
//! Task endpoints that move funds currently accept the header channel. Whether that is
//! meant for server-to-server calls or is an authorization gap is unresolved; it is
//! kept as-is and left visible here rather than papered over.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap},
};

use crate::address::normalize_wallet_address;
use crate::auth::WalletAuth;
use crate::error::AuthError;

pub const WALLET_HEADER: &str = "x-wallet";

/// The `x-wallet` header, lowercased, taken on faith.
pub fn read_wallet_header(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(WALLET_HEADER)?.to_str().ok()?;
    let wallet = normalize_wallet_address(raw);
    (!wallet.is_empty()).then_some(wallet)
}

/// Verified session address; rejects with 401 when there is none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionWallet(pub String);

/// Verified session address if present. Never rejects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaybeSessionWallet(pub Option<String>);

/// Unverified `x-wallet` header identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderWallet(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeSessionWallet
where
    WalletAuth: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = WalletAuth::from_ref(state);
        Ok(MaybeSessionWallet(auth.read_session_address(&parts.headers)))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionWallet
where
    WalletAuth: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let MaybeSessionWallet(address) =
            MaybeSessionWallet::from_request_parts(parts, state).await?;
        address.map(SessionWallet).ok_or(AuthError::SessionRequired)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for HeaderWallet
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        read_wallet_header(&parts.headers)
            .map(HeaderWallet)
            .ok_or(AuthError::WalletRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn header_is_lowercased() {
        let mut h = HeaderMap::new();
        h.insert(WALLET_HEADER, HeaderValue::from_static(" 0xABC "));
        assert_eq!(read_wallet_header(&h).as_deref(), Some("0xabc"));
    }

    #[test]
    fn blank_header_is_absent() {
        let mut h = HeaderMap::new();
        assert_eq!(read_wallet_header(&h), None);
        h.insert(WALLET_HEADER, HeaderValue::from_static("   "));
        assert_eq!(read_wallet_header(&h), None);
    }
}
