//! Data-access layer
//!
//! `DatabaseManager` is the contract every storage backend satisfies:
//! - `postgres`: normalized users/playlists/songs tables via sqlx
//! - `document`: JSON documents in Redis with embedded songs
//!
//! The backend is picked once at startup from `Config::db_type` and handed
//! to the router as an `Arc<dyn DatabaseManager>`.

pub mod document;
pub mod postgres;

use async_trait::async_trait;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::Config;
use crate::error::StoreResult;
use crate::models::{
    Denial, DeleteResult, NewPlaylist, NewUser, Playlist, PlaylistId, PlaylistPair,
    PlaylistUpdate, UpdateResult, User, UserId,
};

pub use document::DocumentDatabaseManager;
pub use postgres::PostgresDatabaseManager;

/// Which storage engine backs the process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Relational,
    Document,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Relational => write!(f, "postgresql"),
            BackendKind::Document => write!(f, "document"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgresql" | "postgres" | "pg" => Ok(BackendKind::Relational),
            "mongo" | "mongodb" | "document" | "redis" => Ok(BackendKind::Document),
            other => Err(format!("unknown DB_TYPE '{}'", other)),
        }
    }
}

/// Storage contract shared by all backends
///
/// Every operation that targets a single playlist takes the requesting user
/// and checks ownership before doing anything. A refusal is reported as a
/// `Denial` (or `None` for reads), never as an `Err`; `Err` is reserved for
/// invalid input and backend failures.
#[async_trait]
pub trait DatabaseManager: Send + Sync {
    /// Backend identifier for logs and health output
    fn backend(&self) -> BackendKind;

    /// Open the session and make sure the schema exists
    async fn connect(&self) -> StoreResult<()>;

    /// Close the session
    async fn disconnect(&self) -> StoreResult<()>;

    /// Cheap liveness probe
    async fn ping(&self) -> bool;

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn get_user_by_id(&self, user_id: &UserId) -> StoreResult<Option<User>>;

    /// Register a user; fails with `EmailTaken` when the email is in use
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    /// Create a playlist owned by `user_id`; fails with `OwnerNotFound` when
    /// the user does not exist
    async fn create_user_playlist(
        &self,
        user_id: &UserId,
        playlist: NewPlaylist,
    ) -> StoreResult<Playlist>;

    async fn delete_playlist(
        &self,
        user_id: &UserId,
        playlist_id: &PlaylistId,
    ) -> StoreResult<DeleteResult>;

    /// Read a playlist; `None` when it is absent or owned by someone else
    async fn get_playlist_by_id(
        &self,
        user_id: &UserId,
        playlist_id: &PlaylistId,
    ) -> StoreResult<Option<Playlist>>;

    async fn get_user_playlist_pairs(&self, user_id: &UserId) -> StoreResult<Vec<PlaylistPair>>;

    async fn get_all_playlists(&self) -> StoreResult<Vec<Playlist>>;

    /// Rename a playlist and replace its whole song list
    async fn update_user_playlist(
        &self,
        user_id: &UserId,
        playlist_id: &PlaylistId,
        update: PlaylistUpdate,
    ) -> StoreResult<UpdateResult>;
}

/// Ownership check applied by every backend
///
/// `owner` is the resolved owner of the playlist, or `None` when the owner
/// record no longer exists. Only an exact id match is allowed through.
pub fn authorize(owner: Option<&UserId>, requester: &UserId) -> Result<(), Denial> {
    match owner {
        Some(owner) if owner == requester => Ok(()),
        _ => Err(Denial::Unauthorized),
    }
}

/// Build the configured backend and connect it
pub async fn connect_manager(config: &Config) -> StoreResult<Arc<dyn DatabaseManager>> {
    let manager: Arc<dyn DatabaseManager> = match config.db_type {
        BackendKind::Relational => Arc::new(PostgresDatabaseManager::new(config)?),
        BackendKind::Document => Arc::new(DocumentDatabaseManager::new(&config.document_url)?),
    };

    manager.connect().await?;
    tracing::info!("DB initialized ({})", manager.backend());

    Ok(manager)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_parsing() {
        assert_eq!("postgresql".parse::<BackendKind>(), Ok(BackendKind::Relational));
        assert_eq!("Postgres".parse::<BackendKind>(), Ok(BackendKind::Relational));
        assert_eq!("mongo".parse::<BackendKind>(), Ok(BackendKind::Document));
        assert_eq!(" redis ".parse::<BackendKind>(), Ok(BackendKind::Document));
        assert!("oracle".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_authorize_owner_only() {
        let alice = UserId::new("alice");
        let bob = UserId::new("bob");

        assert_eq!(authorize(Some(&alice), &alice), Ok(()));
        assert_eq!(authorize(Some(&alice), &bob), Err(Denial::Unauthorized));
    }

    #[test]
    fn test_authorize_missing_owner_is_unauthorized() {
        let alice = UserId::new("alice");
        assert_eq!(authorize(None, &alice), Err(Denial::Unauthorized));
    }
}
