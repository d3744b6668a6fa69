use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Opaque playlist identifier (see `UserId` for the format caveat)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaylistId(String);

impl PlaylistId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PlaylistId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for PlaylistId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A song inside a playlist. Songs have no identity of their own; their
/// position in `Playlist::songs` is their order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Song {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(rename = "youTubeId", alias = "youtubeId", default)]
    pub you_tube_id: String,
}

/// Full playlist with ordered songs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    #[serde(rename = "_id")]
    pub id: PlaylistId,
    pub name: String,
    pub owner_email: String,
    pub songs: Vec<Song>,
}

/// `{_id, name}` pair used by playlist pickers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistPair {
    #[serde(rename = "_id")]
    pub id: PlaylistId,
    pub name: String,
}

/// Playlist submitted for creation
///
/// `owner_email` is accepted for compatibility with existing clients but the
/// stored value always comes from the owning user record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlaylist {
    pub name: String,
    #[serde(default)]
    pub songs: Vec<Song>,
    #[serde(default)]
    pub owner_email: Option<String>,
}

impl NewPlaylist {
    pub fn validate(&self) -> Result<(), StoreError> {
        validate_contents(&self.name, &self.songs)
    }
}

/// Replacement name and song list for an existing playlist
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaylistUpdate {
    pub name: String,
    #[serde(default)]
    pub songs: Vec<Song>,
}

impl PlaylistUpdate {
    pub fn validate(&self) -> Result<(), StoreError> {
        validate_contents(&self.name, &self.songs)
    }
}

fn validate_contents(name: &str, songs: &[Song]) -> Result<(), StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::Validation("playlist name must not be empty".to_string()));
    }
    if let Some(pos) = songs.iter().position(|s| s.title.trim().is_empty()) {
        return Err(StoreError::Validation(format!(
            "song at position {} has no title",
            pos
        )));
    }
    Ok(())
}

/// Why a playlist operation was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Denial {
    /// No playlist with that id
    #[serde(rename = "not found")]
    NotFound,
    /// The playlist exists but belongs to someone else
    #[serde(rename = "unauthorized")]
    Unauthorized,
}

impl Denial {
    pub fn as_str(&self) -> &'static str {
        match self {
            Denial::NotFound => "not found",
            Denial::Unauthorized => "unauthorized",
        }
    }
}

impl std::fmt::Display for Denial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of `delete_playlist`: `{ok: true}` or `{ok: false, reason}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteResult {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<Denial>,
}

impl DeleteResult {
    pub fn deleted() -> Self {
        Self { ok: true, reason: None }
    }

    pub fn denied(reason: Denial) -> Self {
        Self {
            ok: false,
            reason: Some(reason),
        }
    }
}

impl From<Denial> for DeleteResult {
    fn from(reason: Denial) -> Self {
        Self::denied(reason)
    }
}

/// Result of `update_user_playlist`: `{ok: true, playlist}` or `{ok: false, reason}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateResult {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<Denial>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playlist: Option<Playlist>,
}

impl UpdateResult {
    pub fn updated(playlist: Playlist) -> Self {
        Self {
            ok: true,
            reason: None,
            playlist: Some(playlist),
        }
    }

    pub fn denied(reason: Denial) -> Self {
        Self {
            ok: false,
            reason: Some(reason),
            playlist: None,
        }
    }
}

impl From<Denial> for UpdateResult {
    fn from(reason: Denial) -> Self {
        Self::denied(reason)
    }
}
