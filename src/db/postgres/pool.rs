//! Database connection pool management

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{error, info};

/// Tables are created on first connect; there is no versioned migration
/// history.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id SERIAL PRIMARY KEY,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS playlists (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        owner_email TEXT NOT NULL,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_playlists_user_id ON playlists (user_id)",
    r#"
    CREATE TABLE IF NOT EXISTS songs (
        id SERIAL PRIMARY KEY,
        playlist_id INTEGER NOT NULL REFERENCES playlists(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        artist TEXT NOT NULL DEFAULT '',
        year INTEGER,
        youtube_id TEXT NOT NULL DEFAULT '',
        song_index INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_songs_playlist_order ON songs (playlist_id, song_index)",
];

/// Create a PostgreSQL connection pool without touching the network
///
/// The first real connection is made by `ensure_schema`.
pub fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .connect_lazy(database_url)?;

    info!("PostgreSQL pool configured with max {} connections", max_connections);

    Ok(pool)
}

/// Create tables and indexes that don't exist yet
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    info!("Ensuring PostgreSQL schema...");

    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("PostgreSQL schema ready");

    Ok(())
}

/// Health check for the database
pub async fn health_check(pool: &PgPool) -> bool {
    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => true,
        Err(e) => {
            error!("Database health check failed: {}", e);
            false
        }
    }
}
