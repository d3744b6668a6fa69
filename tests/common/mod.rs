//! Common test utilities and fixtures
//!
//! `MemoryDatabaseManager` implements the storage contract in memory so
//! the HTTP layer can be exercised without PostgreSQL or Redis running.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use playlister_server::config::Config;
use playlister_server::db::{authorize, BackendKind, DatabaseManager};
use playlister_server::error::{StoreError, StoreResult};
use playlister_server::models::{
    Denial, DeleteResult, NewPlaylist, NewUser, Playlist, PlaylistId, PlaylistPair,
    PlaylistUpdate, UpdateResult, User, UserId,
};
use playlister_server::services::AuthService;
use playlister_server::{app, AppState};

#[derive(Default)]
struct Tables {
    next_id: u64,
    users: Vec<User>,
    playlists: Vec<Playlist>,
}

impl Tables {
    fn next_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }

    fn user_by_email(&self, email: &str) -> Option<&User> {
        self.users.iter().find(|u| u.email == email)
    }

    fn user_by_id(&self, id: &UserId) -> Option<&User> {
        self.users.iter().find(|u| &u.id == id)
    }

    /// Resolve ownership the way the document store does: via owner email
    fn check_owner(&self, playlist: &Playlist, requester: &UserId) -> Result<(), Denial> {
        let owner = self.user_by_email(&playlist.owner_email).map(|u| &u.id);
        authorize(owner, requester)
    }
}

#[derive(Default)]
pub struct MemoryDatabaseManager {
    tables: RwLock<Tables>,
}

impl MemoryDatabaseManager {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DatabaseManager for MemoryDatabaseManager {
    fn backend(&self) -> BackendKind {
        BackendKind::Document
    }

    async fn connect(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn disconnect(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn ping(&self) -> bool {
        true
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.user_by_email(email).cloned())
    }

    async fn get_user_by_id(&self, user_id: &UserId) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.user_by_id(user_id).cloned())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.user_by_email(&user.email).is_some() {
            return Err(StoreError::EmailTaken(user.email));
        }

        let created = User {
            id: UserId::new(tables.next_id()),
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            password_hash: user.password_hash,
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn create_user_playlist(
        &self,
        user_id: &UserId,
        playlist: NewPlaylist,
    ) -> StoreResult<Playlist> {
        playlist.validate()?;

        let mut tables = self.tables.write().await;
        let owner_email = tables
            .user_by_id(user_id)
            .map(|u| u.email.clone())
            .ok_or_else(|| StoreError::OwnerNotFound(user_id.to_string()))?;

        let created = Playlist {
            id: PlaylistId::new(tables.next_id()),
            name: playlist.name,
            owner_email,
            songs: playlist.songs,
        };
        tables.playlists.push(created.clone());
        Ok(created)
    }

    async fn delete_playlist(
        &self,
        user_id: &UserId,
        playlist_id: &PlaylistId,
    ) -> StoreResult<DeleteResult> {
        let mut tables = self.tables.write().await;
        let pos = match tables.playlists.iter().position(|p| &p.id == playlist_id) {
            Some(pos) => pos,
            None => return Ok(Denial::NotFound.into()),
        };

        if let Err(denial) = tables.check_owner(&tables.playlists[pos], user_id) {
            return Ok(denial.into());
        }

        tables.playlists.remove(pos);
        Ok(DeleteResult::deleted())
    }

    async fn get_playlist_by_id(
        &self,
        user_id: &UserId,
        playlist_id: &PlaylistId,
    ) -> StoreResult<Option<Playlist>> {
        let tables = self.tables.read().await;
        Ok(tables
            .playlists
            .iter()
            .find(|p| &p.id == playlist_id)
            .filter(|p| tables.check_owner(p, user_id).is_ok())
            .cloned())
    }

    async fn get_user_playlist_pairs(&self, user_id: &UserId) -> StoreResult<Vec<PlaylistPair>> {
        let tables = self.tables.read().await;
        let email = match tables.user_by_id(user_id) {
            Some(user) => user.email.clone(),
            None => return Ok(Vec::new()),
        };

        Ok(tables
            .playlists
            .iter()
            .filter(|p| p.owner_email == email)
            .map(|p| PlaylistPair {
                id: p.id.clone(),
                name: p.name.clone(),
            })
            .collect())
    }

    async fn get_all_playlists(&self) -> StoreResult<Vec<Playlist>> {
        Ok(self.tables.read().await.playlists.clone())
    }

    async fn update_user_playlist(
        &self,
        user_id: &UserId,
        playlist_id: &PlaylistId,
        update: PlaylistUpdate,
    ) -> StoreResult<UpdateResult> {
        update.validate()?;

        let mut tables = self.tables.write().await;
        let pos = match tables.playlists.iter().position(|p| &p.id == playlist_id) {
            Some(pos) => pos,
            None => return Ok(Denial::NotFound.into()),
        };

        if let Err(denial) = tables.check_owner(&tables.playlists[pos], user_id) {
            return Ok(denial.into());
        }

        let playlist = &mut tables.playlists[pos];
        playlist.name = update.name;
        playlist.songs = update.songs;
        Ok(UpdateResult::updated(playlist.clone()))
    }
}

/// Config that never touches the environment
pub fn test_config() -> Config {
    Config {
        port: 0,
        app_env: "test".to_string(),
        cors_origin: "http://localhost:3000".to_string(),
        db_type: BackendKind::Document,
        database_url: "postgres://localhost/playlister_test".to_string(),
        db_max_connections: 1,
        document_url: "redis://localhost:6379".to_string(),
        jwt_secret: "test-secret-key".to_string(),
        token_ttl_hours: 1,
    }
}

/// Shared state over an in-memory store
pub fn create_test_state() -> Arc<AppState> {
    let db: Arc<dyn DatabaseManager> = Arc::new(MemoryDatabaseManager::new());
    let auth = AuthService::new("test-secret-key", 1).with_bcrypt_cost(4);
    Arc::new(AppState::new(test_config(), db, auth))
}

pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let state = create_test_state();
    (app(state.clone()), state)
}

/// Test user credentials
pub mod fixtures {
    use playlister_server::models::Song;

    pub const ALICE_EMAIL: &str = "alice@bob.com";
    pub const BOB_EMAIL: &str = "bob@alice.com";
    pub const TEST_PASSWORD: &str = "aaaaaaaa";

    pub fn song(title: &str, artist: &str, year: i32, you_tube_id: &str) -> Song {
        Song {
            title: title.to_string(),
            artist: artist.to_string(),
            year: Some(year),
            you_tube_id: you_tube_id.to_string(),
        }
    }

    pub fn two_songs() -> Vec<Song> {
        vec![
            song("Fast Train", "Solomon Burke", 1985, "CFAAk5yFw9Q"),
            song("Hey Ya", "OutKast", 2003, "PWgvGjAhvIw"),
        ]
    }
}
