//! Backend-neutral data model
//!
//! These types form the data-access contract: every `DatabaseManager`
//! implementation produces exactly these shapes, so handlers and clients
//! never see which backend is in use.

pub mod playlist;
pub mod user;

pub use playlist::{
    Denial, DeleteResult, NewPlaylist, Playlist, PlaylistId, PlaylistPair, PlaylistUpdate, Song,
    UpdateResult,
};
pub use user::{NewUser, PublicUser, User, UserId};
