mod config;
mod game;
mod health;
mod lobby;
mod net;
mod util;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{error, info, Level};

use crate::config::ServerConfig;
use crate::health::{start_health_server, ServerStats};
use crate::lobby::manager::LobbyManager;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    info!("Claimline Server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = ServerConfig::load_or_default();
    if let Err(e) = config.validate() {
        anyhow::bail!("invalid configuration: {}", e);
    }
    info!(
        "Configuration loaded: {}:{}, max_rooms={}",
        config.bind_address, config.port, config.max_rooms
    );

    // Process-wide stats registry, served by the health endpoint
    let stats = Arc::new(ServerStats::new());
    let stats_clone = stats.clone();
    let bind_address = config.bind_address;
    let port = config.port;
    tokio::spawn(async move {
        if let Err(e) = start_health_server(stats_clone, bind_address, port).await {
            error!("Health server error: {}", e);
        }
    });

    // Room registry; the transport layer joins players through it
    let lobby_manager = Arc::new(RwLock::new(LobbyManager::new(
        config.max_rooms,
        config.max_humans_per_room,
        stats.clone(),
    )));

    // A default room so the arena is live as soon as the server is up
    lobby_manager
        .write()
        .await
        .create_room("Main Arena".to_string())
        .map_err(|e| anyhow::anyhow!("failed to create initial room: {}", e))?;

    // Periodic gauge refresh for the stats endpoint
    let sampler_manager = lobby_manager.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(5));
        loop {
            ticker.tick().await;
            sampler_manager.read().await.refresh_stats().await;
        }
    });

    info!("Server ready on http://{}:{}", config.bind_address, config.port);

    // Run until shutdown is requested
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    lobby_manager.write().await.shutdown_all_rooms().await;
    info!("Server stopped");

    Ok(())
}
