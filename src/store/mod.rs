//! Document store used for ownership records, cached decisions and cooldowns.
//!
//! Documents are flat maps of field name to JSON value, addressed by
//! composite string keys. Writes merge into the existing document: fields not
//! named in the write keep their previous value.

pub mod memory;
pub mod redis_store;

use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

pub use self::memory::MemoryStore;
pub use self::redis_store::RedisStore;

pub type Document = Map<String, Value>;

pub type SharedStore = Arc<dyn DocumentStore>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document, `None` when nothing is stored under `key`
    async fn get(&self, key: &str) -> Result<Option<Document>, StoreError>;

    /// Upsert `fields` into the document at `key`, leaving other fields untouched
    async fn set_merge(&self, key: &str, fields: Document) -> Result<(), StoreError>;

    async fn ping(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}

/// Key of the ownership record for a normalized name
pub fn username_key(normalized: &str) -> String {
    format!("usernames:{}", normalized)
}

/// Key of a decision cache entry; the pair is kept literal so entries stay inspectable
pub fn decision_key(identity: &str, normalized: &str) -> String {
    format!("moderationCache:name_check:{}:{}", identity, normalized)
}

pub fn cooldown_key(identity: &str) -> String {
    format!("moderationCooldown:{}", identity)
}
