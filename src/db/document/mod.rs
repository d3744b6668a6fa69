//! Document backend
//!
//! JSON documents in Redis. Key layout under a namespace prefix:
//! - `{ns}:user:{id}`: `UserDocument`
//! - `{ns}:user:{id}:playlists`: set of the playlist ids the user owns
//! - `{ns}:user-email:{email}`: user id, the unique email index
//! - `{ns}:playlist:{id}`: `PlaylistDocument` with embedded songs
//! - `{ns}:playlists`: set of every playlist id
//!
//! Ownership is resolved through the playlist's owner email: email -> user
//! id, then compared with the requester. Writes touching both a user and a
//! playlist go out in one MULTI/EXEC block, and membership sets are only
//! changed with SADD/SREM, so overlapping writes never drop each other's ids.
//! Updates use `SET ... XX` and cannot bring back a deleted playlist.

pub mod models;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use self::models::{PlaylistDocument, UserDocument};
use crate::db::{authorize, BackendKind, DatabaseManager};
use crate::error::{StoreError, StoreResult};
use crate::models::{
    Denial, DeleteResult, NewPlaylist, NewUser, Playlist, PlaylistId, PlaylistPair,
    PlaylistUpdate, UpdateResult, User, UserId,
};
use crate::services::redis::RedisService;

const DEFAULT_NAMESPACE: &str = "playlister";

/// Key builder for one namespace
#[derive(Debug, Clone)]
struct Keys {
    namespace: String,
}

impl Keys {
    fn user(&self, id: &str) -> String {
        format!("{}:user:{}", self.namespace, id)
    }

    fn user_playlists(&self, id: &str) -> String {
        format!("{}:user:{}:playlists", self.namespace, id)
    }

    fn user_email(&self, email: &str) -> String {
        format!("{}:user-email:{}", self.namespace, email)
    }

    fn playlist(&self, id: &str) -> String {
        format!("{}:playlist:{}", self.namespace, id)
    }

    fn all_playlists(&self) -> String {
        format!("{}:playlists", self.namespace)
    }
}

/// `DatabaseManager` over a Redis document store
pub struct DocumentDatabaseManager {
    client: redis::Client,
    keys: Keys,
    store: RwLock<Option<RedisService>>,
}

impl DocumentDatabaseManager {
    /// Validate the connection string (no I/O until `connect`)
    pub fn new(url: &str) -> StoreResult<Self> {
        Self::with_namespace(url, DEFAULT_NAMESPACE)
    }

    /// Same as `new`, keeping all keys under `namespace`
    pub fn with_namespace(url: &str, namespace: &str) -> StoreResult<Self> {
        let client =
            redis::Client::open(url).map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            keys: Keys {
                namespace: namespace.to_string(),
            },
            store: RwLock::new(None),
        })
    }

    async fn store(&self) -> StoreResult<RedisService> {
        self.store.read().await.clone().ok_or(StoreError::NotConnected)
    }

    async fn load_user(&self, store: &RedisService, id: &str) -> StoreResult<Option<UserDocument>> {
        store.get(&self.keys.user(id)).await
    }

    async fn load_user_by_email(
        &self,
        store: &RedisService,
        email: &str,
    ) -> StoreResult<Option<UserDocument>> {
        match store.get_string(&self.keys.user_email(email)).await? {
            Some(id) => self.load_user(store, &id).await,
            None => Ok(None),
        }
    }

    async fn load_playlist(
        &self,
        store: &RedisService,
        id: &str,
    ) -> StoreResult<Option<PlaylistDocument>> {
        store.get(&self.keys.playlist(id)).await
    }

    /// Fetch a playlist and check it belongs to `user_id`
    ///
    /// Returns the playlist together with its resolved owner so callers can
    /// update the owner's membership list without a second lookup.
    async fn load_owned_playlist(
        &self,
        store: &RedisService,
        user_id: &UserId,
        playlist_id: &PlaylistId,
    ) -> StoreResult<Result<(PlaylistDocument, UserDocument), Denial>> {
        let playlist = match self.load_playlist(store, playlist_id.as_str()).await? {
            Some(playlist) => playlist,
            None => return Ok(Err(Denial::NotFound)),
        };

        let owner = self.load_user_by_email(store, &playlist.owner_email).await?;
        if let Err(denial) = authorize(owner.as_ref().map(|o| o.user_id()).as_ref(), user_id) {
            return Ok(Err(denial));
        }

        match owner {
            Some(owner) => Ok(Ok((playlist, owner))),
            None => Ok(Err(Denial::Unauthorized)),
        }
    }
}

#[async_trait]
impl DatabaseManager for DocumentDatabaseManager {
    fn backend(&self) -> BackendKind {
        BackendKind::Document
    }

    async fn connect(&self) -> StoreResult<()> {
        let store = RedisService::new(self.client.clone())
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        if !store.ping().await.map_err(|e| StoreError::Connection(e.to_string()))? {
            return Err(StoreError::Connection("unexpected PING reply".to_string()));
        }

        *self.store.write().await = Some(store);
        info!("Document store connected (namespace '{}')", self.keys.namespace);
        Ok(())
    }

    async fn disconnect(&self) -> StoreResult<()> {
        self.store.write().await.take();
        info!("Document store disconnected");
        Ok(())
    }

    async fn ping(&self) -> bool {
        match self.store().await {
            Ok(store) => store.ping().await.unwrap_or(false),
            Err(_) => false,
        }
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let store = self.store().await?;
        let doc = self.load_user_by_email(&store, email).await?;
        Ok(doc.map(Into::into))
    }

    async fn get_user_by_id(&self, user_id: &UserId) -> StoreResult<Option<User>> {
        let store = self.store().await?;
        let doc = self.load_user(&store, user_id.as_str()).await?;
        Ok(doc.map(Into::into))
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let store = self.store().await?;
        let id = Uuid::new_v4().to_string();

        // Claim the email first; the claim is the uniqueness guarantee
        let email_key = self.keys.user_email(&user.email);
        if !store.set_nx(&email_key, &id).await? {
            return Err(StoreError::EmailTaken(user.email));
        }

        let doc = UserDocument::new(id, user);
        if let Err(e) = store.set(&self.keys.user(&doc.id), &doc).await {
            // Release the claim so the email can be registered again
            if let Err(cleanup) = store.del(&email_key).await {
                warn!("Failed to release email claim {}: {}", email_key, cleanup);
            }
            return Err(e);
        }

        debug!("Created user {} ({})", doc.id, doc.email);
        Ok(doc.into())
    }

    async fn create_user_playlist(
        &self,
        user_id: &UserId,
        playlist: NewPlaylist,
    ) -> StoreResult<Playlist> {
        playlist.validate()?;

        let store = self.store().await?;
        let owner = self
            .load_user(&store, user_id.as_str())
            .await?
            .ok_or_else(|| StoreError::OwnerNotFound(user_id.to_string()))?;

        let doc = PlaylistDocument::new(
            Uuid::new_v4().to_string(),
            playlist.name,
            owner.email.clone(),
            playlist.songs,
        );

        let mut pipe = redis::pipe();
        pipe.set(self.keys.playlist(&doc.id), serde_json::to_string(&doc)?)
            .ignore()
            .sadd(self.keys.user_playlists(&owner.id), &doc.id)
            .ignore()
            .sadd(self.keys.all_playlists(), &doc.id)
            .ignore();
        store.exec_atomic(&mut pipe).await?;

        debug!(
            "Created playlist {} for user {} with {} songs",
            doc.id,
            owner.id,
            doc.songs.len()
        );
        Ok(doc.into())
    }

    async fn delete_playlist(
        &self,
        user_id: &UserId,
        playlist_id: &PlaylistId,
    ) -> StoreResult<DeleteResult> {
        let store = self.store().await?;

        let (playlist, owner) =
            match self.load_owned_playlist(&store, user_id, playlist_id).await? {
                Ok(found) => found,
                Err(denial) => return Ok(denial.into()),
            };

        let mut pipe = redis::pipe();
        pipe.del(self.keys.playlist(&playlist.id))
            .ignore()
            .srem(self.keys.user_playlists(&owner.id), &playlist.id)
            .ignore()
            .srem(self.keys.all_playlists(), &playlist.id)
            .ignore();
        store.exec_atomic(&mut pipe).await?;

        debug!("Deleted playlist {} ({} songs)", playlist.id, playlist.songs.len());
        Ok(DeleteResult::deleted())
    }

    async fn get_playlist_by_id(
        &self,
        user_id: &UserId,
        playlist_id: &PlaylistId,
    ) -> StoreResult<Option<Playlist>> {
        let store = self.store().await?;

        match self.load_owned_playlist(&store, user_id, playlist_id).await? {
            Ok((playlist, _)) => Ok(Some(playlist.into())),
            Err(_) => Ok(None),
        }
    }

    async fn get_user_playlist_pairs(&self, user_id: &UserId) -> StoreResult<Vec<PlaylistPair>> {
        let store = self.store().await?;

        let user = match self.load_user(&store, user_id.as_str()).await? {
            Some(user) => user,
            None => return Ok(Vec::new()),
        };

        let ids = store.members(&self.keys.user_playlists(&user.id)).await?;
        let keys: Vec<String> = ids.iter().map(|id| self.keys.playlist(id)).collect();
        let mut docs: Vec<PlaylistDocument> = store
            .get_many(&keys)
            .await?
            .into_iter()
            .flatten()
            .filter(|doc: &PlaylistDocument| doc.owner_email == user.email)
            .collect();
        sort_by_creation(&mut docs);

        Ok(docs.iter().map(PlaylistDocument::to_pair).collect())
    }

    async fn get_all_playlists(&self) -> StoreResult<Vec<Playlist>> {
        let store = self.store().await?;

        let ids = store.members(&self.keys.all_playlists()).await?;
        let keys: Vec<String> = ids.iter().map(|id| self.keys.playlist(id)).collect();
        let mut docs: Vec<PlaylistDocument> =
            store.get_many(&keys).await?.into_iter().flatten().collect();

        sort_by_creation(&mut docs);

        Ok(docs.into_iter().map(Into::into).collect())
    }

    async fn update_user_playlist(
        &self,
        user_id: &UserId,
        playlist_id: &PlaylistId,
        update: PlaylistUpdate,
    ) -> StoreResult<UpdateResult> {
        update.validate()?;

        let store = self.store().await?;

        let (mut playlist, _) = match self.load_owned_playlist(&store, user_id, playlist_id).await? {
            Ok(found) => found,
            Err(denial) => return Ok(denial.into()),
        };

        playlist.replace_contents(update.name, update.songs);

        // A delete may have committed since the load
        if !store
            .set_existing(&self.keys.playlist(&playlist.id), &playlist)
            .await?
        {
            debug!("Playlist {} deleted before update", playlist.id);
            return Ok(Denial::NotFound.into());
        }

        debug!("Updated playlist {} ({} songs)", playlist.id, playlist.songs.len());
        Ok(UpdateResult::updated(playlist.into()))
    }
}

/// Set members are unordered; creation order keeps listings stable
fn sort_by_creation(docs: &mut [PlaylistDocument]) {
    docs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}
