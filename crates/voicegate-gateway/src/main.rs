use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use voicegate_core::config::VoiceGateConfig;
use voicegate_storage::SqliteStorage;

mod app;
mod collaborators;
mod http;
mod ws;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = VoiceGateConfig::load().unwrap_or_else(|e| {
        eprintln!("config load failed ({e}), using defaults");
        VoiceGateConfig::default()
    });

    voicegate_core::logging::init(config.log_json);

    let db_path = config
        .database_url
        .strip_prefix("sqlite://")
        .unwrap_or(&config.database_url)
        .to_string();
    let storage = Arc::new(SqliteStorage::open(&db_path)?);

    let bind = config.gateway_bind.clone();
    let port = config.gateway_port;
    let state = Arc::new(app::AppState::new(config, storage));
    let router = app::build_router(state);

    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    info!(%addr, "voicegate gateway listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
