//! Relational backend
//!
//! Users, playlists and songs live in three tables. Ownership is the
//! `playlists.user_id` foreign key; song order is `songs.song_index`.
//! Every multi-statement write runs in a single transaction, so a failure
//! part-way leaves nothing behind.

pub mod models;
pub mod pool;
pub mod repository;

use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::{debug, info};

use self::models::{parse_key, PlaylistRow, SongRow};
use self::repository::{playlists, songs, users};
use crate::config::Config;
use crate::db::{authorize, BackendKind, DatabaseManager};
use crate::error::{StoreError, StoreResult};
use crate::models::{
    Denial, DeleteResult, NewPlaylist, NewUser, Playlist, PlaylistId, PlaylistPair,
    PlaylistUpdate, UpdateResult, User, UserId,
};

/// `DatabaseManager` over PostgreSQL
pub struct PostgresDatabaseManager {
    pool: PgPool,
}

impl PostgresDatabaseManager {
    /// Configure the pool from application config (no I/O until `connect`)
    pub fn new(config: &Config) -> StoreResult<Self> {
        Self::with_url(&config.database_url, config.db_max_connections)
    }

    pub fn with_url(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = pool::create_pool(database_url, max_connections)
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self { pool })
    }
}

fn check_owner(row: &PlaylistRow, user_id: &UserId) -> Result<(), Denial> {
    authorize(Some(&row.owner_id()), user_id)
}

#[async_trait]
impl DatabaseManager for PostgresDatabaseManager {
    fn backend(&self) -> BackendKind {
        BackendKind::Relational
    }

    async fn connect(&self) -> StoreResult<()> {
        pool::ensure_schema(&self.pool)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        info!("PostgreSQL connected");
        Ok(())
    }

    async fn disconnect(&self) -> StoreResult<()> {
        self.pool.close().await;
        info!("PostgreSQL pool closed");
        Ok(())
    }

    async fn ping(&self) -> bool {
        pool::health_check(&self.pool).await
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = users::find_by_email(&self.pool, email).await?;
        Ok(row.map(Into::into))
    }

    async fn get_user_by_id(&self, user_id: &UserId) -> StoreResult<Option<User>> {
        let key = match parse_key(user_id.as_str()) {
            Some(key) => key,
            None => return Ok(None),
        };

        let row = users::find_by_id(&self.pool, key).await?;
        Ok(row.map(Into::into))
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        match users::insert(&self.pool, &user).await {
            Ok(row) => {
                debug!("Created user {} ({})", row.id, row.email);
                Ok(row.into())
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::EmailTaken(user.email))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn create_user_playlist(
        &self,
        user_id: &UserId,
        playlist: NewPlaylist,
    ) -> StoreResult<Playlist> {
        playlist.validate()?;

        let owner_key = parse_key(user_id.as_str())
            .ok_or_else(|| StoreError::OwnerNotFound(user_id.to_string()))?;

        let mut tx = self.pool.begin().await?;

        let owner = users::find_by_id(&mut *tx, owner_key)
            .await?
            .ok_or_else(|| StoreError::OwnerNotFound(user_id.to_string()))?;

        let row = playlists::insert(&mut *tx, &playlist.name, &owner.email, owner.id).await?;
        songs::insert_all(&mut *tx, row.id, &playlist.songs).await?;

        tx.commit().await?;

        debug!(
            "Created playlist {} for user {} with {} songs",
            row.id,
            owner.id,
            playlist.songs.len()
        );

        let mut created = row.into_playlist(Vec::new());
        created.songs = playlist.songs;
        Ok(created)
    }

    async fn delete_playlist(
        &self,
        user_id: &UserId,
        playlist_id: &PlaylistId,
    ) -> StoreResult<DeleteResult> {
        let key = match parse_key(playlist_id.as_str()) {
            Some(key) => key,
            None => return Ok(Denial::NotFound.into()),
        };

        let mut tx = self.pool.begin().await?;

        let row = match playlists::find_by_id_for_update(&mut *tx, key).await? {
            Some(row) => row,
            None => return Ok(Denial::NotFound.into()),
        };

        if let Err(denial) = check_owner(&row, user_id) {
            return Ok(denial.into());
        }

        let removed_songs = songs::delete_by_playlist(&mut *tx, key).await?;
        playlists::delete(&mut *tx, key).await?;

        tx.commit().await?;

        debug!("Deleted playlist {} ({} songs)", key, removed_songs);
        Ok(DeleteResult::deleted())
    }

    async fn get_playlist_by_id(
        &self,
        user_id: &UserId,
        playlist_id: &PlaylistId,
    ) -> StoreResult<Option<Playlist>> {
        let key = match parse_key(playlist_id.as_str()) {
            Some(key) => key,
            None => return Ok(None),
        };

        let row = match playlists::find_by_id(&self.pool, key).await? {
            Some(row) => row,
            None => return Ok(None),
        };

        if check_owner(&row, user_id).is_err() {
            return Ok(None);
        }

        let song_rows = songs::list_by_playlist(&self.pool, key).await?;
        Ok(Some(row.into_playlist(song_rows)))
    }

    async fn get_user_playlist_pairs(&self, user_id: &UserId) -> StoreResult<Vec<PlaylistPair>> {
        let key = match parse_key(user_id.as_str()) {
            Some(key) => key,
            None => return Ok(Vec::new()),
        };

        let rows = playlists::list_pairs_by_user(&self.pool, key).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_all_playlists(&self) -> StoreResult<Vec<Playlist>> {
        let rows = playlists::list_all(&self.pool).await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let mut songs_by_playlist: HashMap<i32, Vec<SongRow>> = HashMap::new();
        for song in songs::list_by_playlists(&self.pool, &ids).await? {
            songs_by_playlist.entry(song.playlist_id).or_default().push(song);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let song_rows = songs_by_playlist.remove(&row.id).unwrap_or_default();
                row.into_playlist(song_rows)
            })
            .collect())
    }

    async fn update_user_playlist(
        &self,
        user_id: &UserId,
        playlist_id: &PlaylistId,
        update: PlaylistUpdate,
    ) -> StoreResult<UpdateResult> {
        update.validate()?;

        let key = match parse_key(playlist_id.as_str()) {
            Some(key) => key,
            None => return Ok(Denial::NotFound.into()),
        };

        let mut tx = self.pool.begin().await?;

        let row = match playlists::find_by_id_for_update(&mut *tx, key).await? {
            Some(row) => row,
            None => return Ok(Denial::NotFound.into()),
        };

        if let Err(denial) = check_owner(&row, user_id) {
            return Ok(denial.into());
        }

        // Full replacement: the new list is the whole truth, no diffing
        let renamed = playlists::update_name(&mut *tx, key, &update.name).await?;
        songs::delete_by_playlist(&mut *tx, key).await?;
        songs::insert_all(&mut *tx, key, &update.songs).await?;

        tx.commit().await?;

        debug!("Updated playlist {} ({} songs)", key, update.songs.len());

        let mut playlist = renamed.into_playlist(Vec::new());
        playlist.songs = update.songs;
        Ok(UpdateResult::updated(playlist))
    }
}
