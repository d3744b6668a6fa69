use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::StoreResult;

/// Redis connection wrapper holding JSON documents
#[derive(Clone)]
pub struct RedisService {
    conn: ConnectionManager,
}

impl RedisService {
    /// Open a managed (auto-reconnecting) connection
    pub async fn new(client: redis::Client) -> StoreResult<Self> {
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    /// Get a key and deserialize
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        match value {
            Some(v) => {
                let parsed = serde_json::from_str(&v)?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    /// Get many keys in one round trip; missing keys come back as `None`
    pub async fn get_many<T: DeserializeOwned>(&self, keys: &[String]) -> StoreResult<Vec<Option<T>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.conn.clone();
        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(keys)
            .query_async(&mut conn)
            .await?;

        values
            .into_iter()
            .map(|v| match v {
                Some(v) => Ok(Some(serde_json::from_str(&v)?)),
                None => Ok(None),
            })
            .collect()
    }

    /// Get a raw string value
    pub async fn get_string(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    /// Serialize and store a value
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let serialized = serde_json::to_string(value)?;
        let _: () = conn.set(key, serialized).await?;
        Ok(())
    }

    /// Set a key only if it doesn't exist (unique claims)
    /// Returns true if set successfully, false if key already exists
    pub async fn set_nx(&self, key: &str, value: &str) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let set: bool = conn.set_nx(key, value).await?;
        Ok(set)
    }

    /// Overwrite a key only if it still exists (`SET ... XX`)
    /// Returns false if the key is gone and nothing was written
    pub async fn set_existing<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let serialized = serde_json::to_string(value)?;
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(serialized)
            .arg("XX")
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    /// Delete a key
    pub async fn del(&self, key: &str) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    /// Members of a set
    pub async fn members(&self, key: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.conn.clone();
        let members: Vec<String> = conn.smembers(key).await?;
        Ok(members)
    }

    /// Run a pipeline as one MULTI/EXEC block: all commands apply or none do
    pub async fn exec_atomic(&self, pipe: &mut redis::Pipeline) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: () = pipe.atomic().query_async(&mut conn).await?;
        Ok(())
    }

    /// Ping Redis to check connection
    pub async fn ping(&self) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }
}
