use tokio::sync::oneshot;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use arena_shooter_server::config::ServerConfig;
use arena_shooter_server::game::game_loop::GameLoop;
use arena_shooter_server::net::game_session::GameSession;
use arena_shooter_server::net::transport::TcpServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("Arena Shooter Server v{}", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig::load_or_default();
    config.validate()?;
    info!(
        "Configuration loaded: {}:{}, max_connections={}",
        config.bind_address, config.port, config.max_connections
    );

    let (session, handle) = GameSession::new(GameLoop::default(), config.broadcast_buffer);
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let session_task = tokio::spawn(session.run(async {
        let _ = stop_rx.await;
    }));

    let server = TcpServer::bind(config.clone(), handle).await?;
    info!("Server ready on {}", server.local_addr()?);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    };

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
        }
        _ = shutdown => {
            info!("Shutting down...");
        }
    }

    let _ = stop_tx.send(());
    if let Err(e) = session_task.await {
        error!("Game session task failed: {}", e);
    }
    info!("Server stopped");

    Ok(())
}
