use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};

use game_core::WordSource;
use game_server::{
    auth::AuthService, config::Config, create_routes, game_manager::GameManager,
    websocket::ConnectionManager,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    info!("Starting Sketch Arena server...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    if config.uses_default_secret() {
        warn!("JWT_SECRET is not set, tokens are signed with the development secret");
    }

    info!("Loading words from {}", config.words_file.display());
    let words = match WordSource::load(&config.words_file) {
        Ok(words) => words,
        Err(e) => {
            error!("Failed to load words: {:#}", e);
            error!("Set WORDS_FILE to a JSON array of words or a plain word list.");
            std::process::exit(1);
        }
    };

    let connection_manager = Arc::new(ConnectionManager::new());
    let game_manager = match GameManager::new(connection_manager.clone(), config.game.clone(), words)
    {
        Ok(gm) => Arc::new(gm),
        Err(e) => {
            error!("Failed to start game session: {:#}", e);
            std::process::exit(1);
        }
    };
    let auth_service = Arc::new(AuthService::new(&config.jwt_secret, config.token_ttl));

    if let Some(dir) = &config.static_dir {
        info!("Serving static files from {}", dir.display());
    }

    let routes = create_routes(
        connection_manager.clone(),
        game_manager.clone(),
        auth_service,
        config.static_dir.clone(),
    );

    // Idle sockets lose their seat; a heartbeat keeps them alive.
    let cleanup_connection_manager = connection_manager.clone();
    let cleanup_game_manager = game_manager.clone();
    let connection_timeout = config.connection_timeout;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30));
        loop {
            interval.tick().await;
            let removed = cleanup_connection_manager
                .cleanup_inactive_connections(connection_timeout)
                .await;
            for connection in removed.into_iter().filter(|c| c.is_authenticated()) {
                cleanup_game_manager.leave(connection.id);
            }
        }
    });

    info!("Server starting on {}:{}", config.host, config.port);

    let (addr, server) =
        warp::serve(routes).bind_with_graceful_shutdown((config.host, config.port), async {
            shutdown_signal().await;
        });

    info!(
        "Server started successfully on {}. Press Ctrl+C to stop.",
        addr
    );
    server.await;
    info!("Server shutdown complete.");
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use signal::unix::{SignalKind, signal as unix_signal};

        match (
            unix_signal(SignalKind::interrupt()),
            unix_signal(SignalKind::terminate()),
        ) {
            (Ok(mut sigint), Ok(mut sigterm)) => {
                tokio::select! {
                    _ = sigint.recv() => {
                        info!("Received SIGINT, shutting down gracefully...");
                    }
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down gracefully...");
                    }
                }
                return;
            }
            _ => warn!("Could not install signal handlers, falling back to Ctrl+C"),
        }
    }

    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down gracefully...");
}
