use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use tokio::signal;
use tracing::info;

use game_core::word_pool::WordPool;
use game_server::{
    config::Config, create_routes, session_registry::SessionRegistry, websocket::ConnectionManager,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting game session coordinator...");

    // Initialize application state
    let config = Config::new();
    let connection_manager = Arc::new(ConnectionManager::new());

    // Word pool: custom lists from disk when configured, built-in corpus otherwise
    let word_pool = match &config.words_directory {
        Some(dir) => {
            info!("Loading word lists from directory: {}", dir);
            match WordPool::load_from_dir(dir) {
                Ok(pool) => Arc::new(pool),
                Err(e) => {
                    tracing::error!("Failed to load word lists from '{}': {}", dir, e);
                    tracing::error!(
                        "WORDS_DIRECTORY must contain easy.txt, normal.txt, hard.txt and insane.txt."
                    );
                    std::process::exit(1);
                }
            }
        }
        None => {
            info!("Using built-in word lists");
            Arc::new(WordPool::builtin())
        }
    };

    let registry = Arc::new(SessionRegistry::new(connection_manager.clone(), word_pool));

    let routes = create_routes(connection_manager.clone(), registry.clone());

    // Start cleanup task: stale connections and expired sessions
    let cleanup_connection_manager = connection_manager.clone();
    let cleanup_registry = registry.clone();
    let connection_timeout = Duration::from_secs(config.connection_timeout_seconds);
    let cleanup_interval = config.cleanup_interval_seconds;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(cleanup_interval));
        loop {
            interval.tick().await;
            cleanup_connection_manager
                .cleanup_inactive_connections(connection_timeout)
                .await;
            cleanup_registry.cleanup_sweep(Utc::now()).await;
        }
    });

    // Start presence task: host/describer failover for silent players
    let presence_registry = registry.clone();
    let presence_interval = config.presence_interval_seconds;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(presence_interval));
        loop {
            interval.tick().await;
            presence_registry.failover_sweep(Utc::now()).await;
        }
    });

    info!("Server starting on {}:{}", config.host, config.port);

    let addr = (
        config.host.parse::<std::net::IpAddr>().unwrap(),
        config.port,
    );

    let (addr, server) = warp::serve(routes).bind_with_graceful_shutdown(addr, async {
        // Wait for SIGINT (Ctrl+C) or SIGTERM
        #[cfg(unix)]
        {
            let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt()).unwrap();
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate()).unwrap();

            tokio::select! {
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully...");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            signal::ctrl_c().await.expect("Failed to listen for ctrl+c");
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    });

    info!(
        "Server started successfully on {}. Press Ctrl+C to stop.",
        addr
    );
    server.await;
    info!("Server shutdown complete.");
}
