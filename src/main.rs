// src/main.rs
use hottasks_auth::{router, AppState, ServerConfig, WalletAuth};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env().inspect_err(|e| error!("{e}"))?;
    info!(
        chain_id = config.auth.chain_id,
        secure_cookies = config.auth.secure_cookies,
        "wallet auth configured"
    );

    let app = router(AppState::new(WalletAuth::new(config.auth)));

    info!("auth service listening on {}", config.bind);
    let listener = TcpListener::bind(config.bind).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
