//! Process configuration, read once at startup and passed down explicitly.

use std::net::SocketAddr;

use thiserror::Error;

pub const DEFAULT_CHAIN_ID: u64 = 11_155_111;
pub const DEFAULT_APP_NAME: &str = "HOTTasks";
pub const DEFAULT_BIND: &str = "0.0.0.0:8080";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing AUTH_SECRET (or NEXTAUTH_SECRET) for wallet authentication.")]
    MissingSecret,

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Settings the auth core needs. The secret never has a default.
#[derive(Clone)]
pub struct AuthConfig {
    secret: Vec<u8>,
    pub chain_id: u64,
    pub app_name: String,
    pub secure_cookies: bool,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .field("chain_id", &self.chain_id)
            .field("app_name", &self.app_name)
            .field("secure_cookies", &self.secure_cookies)
            .finish()
    }
}

impl AuthConfig {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, ConfigError> {
        let secret = secret.as_ref();
        if secret.iter().all(u8::is_ascii_whitespace) {
            return Err(ConfigError::MissingSecret);
        }
        Ok(Self {
            secret: secret.to_vec(),
            chain_id: DEFAULT_CHAIN_ID,
            app_name: DEFAULT_APP_NAME.to_string(),
            secure_cookies: false,
        })
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    pub fn secret(&self) -> &[u8] {
        &self.secret
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = ["AUTH_SECRET", "NEXTAUTH_SECRET"]
            .into_iter()
            .filter_map(|k| lookup(k))
            .find(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingSecret)?;

        let chain_id = match lookup("AUTH_CHAIN_ID") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                var: "AUTH_CHAIN_ID".into(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_CHAIN_ID,
        };

        let app_name = lookup("AUTH_APP_NAME")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_APP_NAME.to_string());

        let production = lookup("APP_ENV")
            .or_else(|| lookup("NODE_ENV"))
            .is_some_and(|v| v.eq_ignore_ascii_case("production"));

        Ok(Self::new(secret)?
            .with_chain_id(chain_id)
            .with_app_name(app_name)
            .with_secure_cookies(production))
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub auth: AuthConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND.to_string());
        let bind = raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
            var: "BIND_ADDR".into(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            bind,
            auth: AuthConfig::from_env()?,
        })
    }
}
