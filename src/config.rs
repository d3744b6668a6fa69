use std::env;

use crate::db::BackendKind;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,
    pub app_env: String,
    pub cors_origin: String,

    // Storage
    pub db_type: BackendKind,

    // PostgreSQL
    pub database_url: String,
    pub db_max_connections: u32,

    // Document store
    pub document_url: String,

    // Auth
    pub jwt_secret: String,
    pub token_ttl_hours: u64,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            // Server
            port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .unwrap_or(4000),
            app_env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            cors_origin: env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),

            // Storage - anything unrecognized falls back to the document store
            db_type: env::var("DB_TYPE")
                .ok()
                .and_then(|v| match v.parse() {
                    Ok(kind) => Some(kind),
                    Err(e) => {
                        tracing::warn!("{}, using document store", e);
                        None
                    }
                })
                .unwrap_or(BackendKind::Document),

            // PostgreSQL
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| postgres_url_from_parts()),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),

            // Document store
            document_url: env::var("DB_CONNECT")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),

            // Auth
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "playlister-dev-secret".to_string()),
            token_ttl_hours: env::var("TOKEN_TTL_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .unwrap_or(24),
        }
    }

    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Assemble a connection string from the discrete PG_* variables
fn postgres_url_from_parts() -> String {
    let host = env::var("PG_HOST").unwrap_or_else(|_| "localhost".to_string());
    let user = env::var("PG_USER").unwrap_or_else(|_| "postgres".to_string());
    let pass = env::var("PG_PASS").unwrap_or_default();
    let db = env::var("PG_DB").unwrap_or_else(|_| "playlister".to_string());

    build_postgres_url(&host, &user, &pass, &db)
}

fn build_postgres_url(host: &str, user: &str, pass: &str, db: &str) -> String {
    if pass.is_empty() {
        format!("postgres://{}@{}/{}", user, host, db)
    } else {
        format!(
            "postgres://{}:{}@{}/{}",
            user,
            urlencoding::encode(pass),
            host,
            db
        )
    }
}
