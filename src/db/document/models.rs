//! Document shapes stored in Redis
//!
//! Playlists carry a denormalized owner email and embed their songs in
//! order. Which playlists a user owns lives in a separate Redis set that is
//! only changed with SADD/SREM.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{NewUser, Playlist, PlaylistId, PlaylistPair, Song, User, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserDocument {
    pub fn new(id: String, user: NewUser) -> Self {
        let now = Utc::now();
        Self {
            id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn user_id(&self) -> UserId {
        UserId::new(self.id.clone())
    }
}

impl From<UserDocument> for User {
    fn from(doc: UserDocument) -> Self {
        User {
            id: UserId::new(doc.id),
            first_name: doc.first_name,
            last_name: doc.last_name,
            email: doc.email,
            password_hash: doc.password_hash,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub owner_email: String,
    #[serde(default)]
    pub songs: Vec<Song>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlaylistDocument {
    pub fn new(id: String, name: String, owner_email: String, songs: Vec<Song>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name,
            owner_email,
            songs,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace name and songs wholesale
    pub fn replace_contents(&mut self, name: String, songs: Vec<Song>) {
        self.name = name;
        self.songs = songs;
        self.updated_at = Utc::now();
    }

    pub fn to_pair(&self) -> PlaylistPair {
        PlaylistPair {
            id: PlaylistId::new(self.id.clone()),
            name: self.name.clone(),
        }
    }
}

impl From<PlaylistDocument> for Playlist {
    fn from(doc: PlaylistDocument) -> Self {
        Playlist {
            id: PlaylistId::new(doc.id),
            name: doc.name,
            owner_email: doc.owner_email,
            songs: doc.songs,
        }
    }
}
