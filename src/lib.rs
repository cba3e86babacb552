//! Wallet sign-in for the HOTTasks marketplace.
//!
//! A stateless challenge/response login: the server hands out an HMAC-signed
//! challenge, the wallet signs a canonical message derived from it, and a valid
//! signature is exchanged for an HMAC-signed session cookie.

pub mod address;
pub mod api;
pub mod auth;
pub mod canon;
pub mod clock;
pub mod config;
pub mod cookies;
pub mod eip191;
pub mod error;
pub mod identity;
pub mod token;
pub mod types;

pub use api::{router, AppState};
pub use auth::WalletAuth;
pub use config::{AuthConfig, ConfigError, ServerConfig};
pub use error::AuthError;
