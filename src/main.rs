use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use playlister_server::config::Config;
use playlister_server::services::AuthService;
use playlister_server::{app, db, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "playlister_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Load configuration
    let config = Config::from_env();
    let port = config.port;

    tracing::info!("Starting Playlister Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}, backend: {}", config.app_env, config.db_type);

    // A backend we can't reach is fatal: never serve without storage
    let db = match db::connect_manager(&config).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("DB failed to connect: {}", e);
            return Err(e.into());
        }
    };

    let auth = AuthService::new(config.jwt_secret.clone(), config.token_ttl_hours);
    let state = Arc::new(AppState::new(config, db.clone(), auth));

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Playlister Server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.disconnect().await?;
    tracing::info!("Database disconnected");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
