//! Test doubles shared by the unit tests.

use crate::error::{ModerationError, StoreError};
use crate::moderation::{ModerationTransport, RawResponse};
use crate::store::{Document, DocumentStore, MemoryStore};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn doc(value: Value) -> Document {
    value.as_object().cloned().expect("document literal must be an object")
}

/// Every operation fails, as if the backend were down
pub struct FailingStore;

#[async_trait]
impl DocumentStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<Document>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn set_merge(&self, _key: &str, _fields: Document) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn ping(&self) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

/// In-memory store that fails reads and writes for keys under the given prefixes
#[derive(Clone)]
pub struct PartiallyFailingStore {
    pub inner: MemoryStore,
    failing_prefixes: Vec<&'static str>,
}

impl PartiallyFailingStore {
    pub fn new(inner: MemoryStore, failing_prefixes: Vec<&'static str>) -> Self {
        Self {
            inner,
            failing_prefixes,
        }
    }

    fn check(&self, key: &str) -> Result<(), StoreError> {
        if self.failing_prefixes.iter().any(|p| key.starts_with(p)) {
            return Err(StoreError::Unavailable(format!("simulated outage for {}", key)));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PartiallyFailingStore {
    async fn get(&self, key: &str) -> Result<Option<Document>, StoreError> {
        self.check(key)?;
        self.inner.get(key).await
    }

    async fn set_merge(&self, key: &str, fields: Document) -> Result<(), StoreError> {
        self.check(key)?;
        self.inner.set_merge(key, fields).await
    }
}

/// Plays back canned moderation responses and counts calls
///
/// Once the script runs out every further call answers 500.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<RawResponse, ModerationError>>>,
    inputs: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Result<RawResponse, ModerationError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            inputs: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Answers every call with the same status and body
    pub fn always(status: u16, body: &str) -> Self {
        let script = (0..32)
            .map(|_| {
                Ok(RawResponse {
                    status,
                    body: body.to_string(),
                })
            })
            .collect();
        Self::new(script)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModerationTransport for ScriptedTransport {
    async fn send(&self, input: &str) -> Result<RawResponse, ModerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().unwrap().push(input.to_string());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(RawResponse {
                    status: 500,
                    body: "script exhausted".to_string(),
                })
            })
    }
}
