use super::{Document, DocumentStore};
use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Process-local document store for development and tests
#[derive(Clone, Default)]
pub struct MemoryStore {
    docs: Arc<RwLock<HashMap<String, Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)]
    /// Replace the whole document at `key` (seeding records written elsewhere)
    pub async fn insert(&self, key: &str, doc: Document) {
        self.docs.write().await.insert(key.to_string(), doc);
    }

    #[allow(dead_code)]
    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.docs.read().await.get(key).cloned())
    }

    async fn set_merge(&self, key: &str, fields: Document) -> Result<(), StoreError> {
        let mut docs = self.docs.write().await;
        docs.entry(key.to_string()).or_default().extend(fields);
        Ok(())
    }
}
