use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::config::ConfigError;
use crate::types::ErrorRes;

/// Every way a login step can be turned away. Each variant is terminal for the
/// request; the client starts over with a fresh challenge.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Valid wallet address required.")]
    InvalidAddress,

    #[error("Invalid authentication payload.")]
    InvalidPayload,

    #[error("Challenge missing or expired.")]
    ChallengeMissing,

    #[error("Challenge address mismatch.")]
    AddressMismatch,

    #[error("Signature verification failed.")]
    SignatureInvalid,

    #[error("Wallet session required.")]
    SessionRequired,

    #[error("Wallet required")]
    WalletRequired,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::InvalidAddress | AuthError::InvalidPayload => StatusCode::BAD_REQUEST,
            AuthError::ChallengeMissing
            | AuthError::AddressMismatch
            | AuthError::SignatureInvalid
            | AuthError::SessionRequired
            | AuthError::WalletRequired => StatusCode::UNAUTHORIZED,
            AuthError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AuthError::Config(e) => {
                error!("{e}");
                "internal".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorRes { error: message })).into_response()
    }
}
