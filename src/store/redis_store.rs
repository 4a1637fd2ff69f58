use super::{Document, DocumentStore};
use crate::error::StoreError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

/// Redis-backed document store
///
/// Each document is a hash. Field values are JSON encoded so that booleans,
/// integers and nulls read back with their original type, and `HSET` only
/// touches the fields it names, which gives merge-on-write for free.
#[derive(Clone)]
pub struct RedisStore {
    manager: ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis
    ///
    /// Supports both plain (redis://) and encrypted (rediss://) URLs. A URL
    /// without a password is accepted but logged, since production instances
    /// should always require auth.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        if !redis_url.contains("://") {
            return Err(anyhow::anyhow!(
                "Invalid Redis URL format. Expected: redis://:password@host:port or rediss://:password@host:port"
            ));
        }

        if !redis_url.contains('@') {
            warn!("Redis URL does not include a password; use redis://:password@host:port in production");
        }

        let client = redis::Client::open(redis_url)
            .context("Failed to create Redis client from URL")?;

        let manager = ConnectionManager::new(client)
            .await
            .context("Failed to create Redis connection manager - check REDIS_URL and password")?;

        Ok(Self { manager })
    }
}

/// Decode hash fields, keeping anything that is not valid JSON as a plain string
fn decode_fields(raw: HashMap<String, String>) -> Document {
    raw.into_iter()
        .map(|(field, value)| {
            let decoded = serde_json::from_str(&value).unwrap_or(Value::String(value));
            (field, decoded)
        })
        .collect()
}

fn encode_fields(fields: &Document) -> Result<Vec<(String, String)>, StoreError> {
    fields
        .iter()
        .map(|(field, value)| {
            serde_json::to_string(value)
                .map(|encoded| (field.clone(), encoded))
                .map_err(|source| StoreError::Encode {
                    field: field.clone(),
                    source,
                })
        })
        .collect()
}

#[async_trait]
impl DocumentStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Document>, StoreError> {
        let mut conn = self.manager.clone();
        let raw: HashMap<String, String> = conn
            .hgetall(key)
            .await
            .map_err(StoreError::from_redis)?;

        // HGETALL on a missing key is an empty hash
        if raw.is_empty() {
            return Ok(None);
        }
        Ok(Some(decode_fields(raw)))
    }

    async fn set_merge(&self, key: &str, fields: Document) -> Result<(), StoreError> {
        let items = encode_fields(&fields)?;
        if items.is_empty() {
            return Ok(());
        }

        let mut conn = self.manager.clone();
        conn.hset_multiple::<_, _, _, ()>(key, &items)
            .await
            .map_err(StoreError::from_redis)?;
        Ok(())
    }

    async fn ping(&self) -> Result<bool, StoreError> {
        let mut conn = self.manager.clone();
        let resp: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(StoreError::from_redis)?;
        Ok(resp == "PONG")
    }
}
