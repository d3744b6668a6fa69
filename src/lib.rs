//! Playlister server
//!
//! A playlist store with user accounts. Storage goes through the
//! `db::DatabaseManager` contract, implemented by a PostgreSQL backend and a
//! Redis document backend; `DB_TYPE` picks one at startup.

pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::db::DatabaseManager;
use crate::services::AuthService;

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn DatabaseManager>,
    pub auth: AuthService,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: Config, db: Arc<dyn DatabaseManager>, auth: AuthService) -> Self {
        Self {
            config,
            db,
            auth,
            start_time: Instant::now(),
        }
    }
}

/// Browser clients send the session cookie, so the origin must be explicit
fn cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    match config.cors_origin.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            tracing::warn!("Ignoring invalid CORS_ORIGIN '{}': {}", config.cors_origin, e);
            layer
        }
    }
}

/// Build the full router
pub fn app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        // Service endpoints
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        .route("/live", get(routes::health::live))
        // Auth endpoints
        .route("/auth/register", post(routes::auth::register_user))
        .route("/auth/login", post(routes::auth::login_user))
        .route("/auth/logout", get(routes::auth::logout_user))
        .route("/auth/loggedIn", get(routes::auth::get_logged_in))
        // Store endpoints
        .route("/store/playlist", post(routes::store::create_playlist))
        .route(
            "/store/playlist/:id",
            get(routes::store::get_playlist_by_id)
                .put(routes::store::update_playlist)
                .delete(routes::store::delete_playlist),
        )
        .route("/store/playlistpairs", get(routes::store::get_playlist_pairs))
        .route("/store/playlists", get(routes::store::get_playlists))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}
