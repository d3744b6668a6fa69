//! Database repositories
//!
//! Repository pattern for database access, separating SQL from the
//! ownership logic in `PostgresDatabaseManager`. Functions are generic over
//! the executor so the same query runs on the pool or inside a transaction.

pub mod playlists;
pub mod songs;
pub mod users;
