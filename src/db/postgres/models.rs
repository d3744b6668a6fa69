//! Database row types for PostgreSQL
//!
//! These types map directly to database rows and can be converted
//! to the contract types in models/

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::models::{Playlist, PlaylistId, PlaylistPair, Song, User, UserId};

// ============================================================================
// Database Row Types
// ============================================================================

/// User row from database
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::new(row.id.to_string()),
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            password_hash: row.password_hash,
        }
    }
}

/// Playlist row from database (songs live in their own table)
#[derive(Debug, Clone, FromRow)]
pub struct PlaylistRow {
    pub id: i32,
    pub name: String,
    pub owner_email: String,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlaylistRow {
    /// Owner as a contract id, for the shared ownership check
    pub fn owner_id(&self) -> UserId {
        UserId::new(self.user_id.to_string())
    }

    /// Attach songs (already sorted by `song_index`)
    pub fn into_playlist(self, songs: Vec<SongRow>) -> Playlist {
        Playlist {
            id: PlaylistId::new(self.id.to_string()),
            name: self.name,
            owner_email: self.owner_email,
            songs: songs.into_iter().map(Into::into).collect(),
        }
    }
}

/// `(id, name)` projection for pair listings
#[derive(Debug, Clone, FromRow)]
pub struct PlaylistPairRow {
    pub id: i32,
    pub name: String,
}

impl From<PlaylistPairRow> for PlaylistPair {
    fn from(row: PlaylistPairRow) -> Self {
        PlaylistPair {
            id: PlaylistId::new(row.id.to_string()),
            name: row.name,
        }
    }
}

/// Song row from database
#[derive(Debug, Clone, FromRow)]
pub struct SongRow {
    pub id: i32,
    pub playlist_id: i32,
    pub title: String,
    pub artist: String,
    pub year: Option<i32>,
    pub youtube_id: String,
    pub song_index: i32,
}

impl From<SongRow> for Song {
    fn from(row: SongRow) -> Self {
        Song {
            title: row.title,
            artist: row.artist,
            year: row.year,
            you_tube_id: row.youtube_id,
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Parse a contract id into a table key
///
/// Ids minted by the document backend (UUIDs) or garbage from a URL simply
/// don't exist here, so callers treat `None` as "absent".
pub fn parse_key(id: &str) -> Option<i32> {
    id.trim().parse::<i32>().ok().filter(|key| *key > 0)
}
