use anyhow::Result;
use slotlink_core::config::SlotlinkConfig;
use slotlink_server::{AppState, app};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = SlotlinkConfig::load()?;
    let mailer = config.mail_transport()?;
    let store = config.open_store()?;
    let addr = config.server_addr();

    tracing::info!(
        storage = ?config.storage.mode,
        mailer = ?mailer,
        base_url = %config.base_url,
        "Starting slotlink-server"
    );

    let state = AppState::new(config, mailer, store)?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("slotlink-server listening on http://{}", addr);
    axum::serve(listener, app(state)).await?;

    Ok(())
}
