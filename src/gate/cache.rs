use super::verdict::{DenialReason, Identity, Verdict};
use crate::store::{decision_key, Document, SharedStore};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Persistent record of earlier verdicts, keyed by (identity, normalized name)
///
/// Reads and writes both fail open: an unreachable store reads as a miss and
/// drops writes, so a cache outage never reaches the caller.
#[derive(Clone)]
pub struct DecisionCache {
    store: SharedStore,
}

impl DecisionCache {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn get(&self, identity: &Identity, normalized: &str) -> Option<Verdict> {
        let key = decision_key(identity.key_component(), normalized);
        match self.store.get(&key).await {
            Ok(Some(doc)) => cached_verdict(&doc),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, key = %key, "Moderation cache read failed");
                None
            }
        }
    }

    /// Merge `allowed`, `reason` and `updatedAt` into the entry; other fields are left alone
    pub async fn put(
        &self,
        identity: &Identity,
        normalized: &str,
        allowed: bool,
        reason: Option<DenialReason>,
    ) {
        let key = decision_key(identity.key_component(), normalized);
        let mut fields = Document::new();
        fields.insert("allowed".into(), Value::Bool(allowed));
        fields.insert(
            "reason".into(),
            reason.map_or(Value::Null, |r| json!(r.as_str())),
        );
        fields.insert("updatedAt".into(), json!(Utc::now().to_rfc3339()));

        if let Err(e) = self.store.set_merge(&key, fields).await {
            warn!(error = %e, key = %key, "Moderation cache write failed");
        }
    }
}

/// Only a strictly boolean `allowed` counts as a hit
fn cached_verdict(doc: &Document) -> Option<Verdict> {
    let allowed = doc.get("allowed")?.as_bool()?;
    let reason = match doc.get("reason").and_then(Value::as_str) {
        Some(raw) => match raw.parse::<DenialReason>() {
            Ok(reason) => Some(reason),
            Err(_) => {
                debug!(reason = raw, "Ignoring unknown cached denial reason");
                None
            }
        },
        None => None,
    };
    Some(Verdict { allowed, reason })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DocumentStore, MemoryStore};
    use crate::testing::{doc, FailingStore};
    use std::sync::Arc;

    fn user() -> Identity {
        Identity::User("u1".into())
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let store = MemoryStore::new();
        let cache = DecisionCache::new(Arc::new(store.clone()));

        assert_eq!(cache.get(&user(), "alice").await, None);
        cache.put(&user(), "alice", true, None).await;
        assert_eq!(cache.get(&user(), "alice").await, Some(Verdict::allowed()));

        let stored = store
            .get("moderationCache:name_check:u1:alice")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored["reason"], Value::Null);
        assert!(stored["updatedAt"].is_string());
    }

    #[tokio::test]
    async fn test_entries_are_per_identity() {
        let cache = DecisionCache::new(Arc::new(MemoryStore::new()));
        cache
            .put(&Identity::Anonymous, "alice", false, Some(DenialReason::Flagged))
            .await;

        assert_eq!(
            cache.get(&Identity::Anonymous, "alice").await,
            Some(Verdict::denied(DenialReason::Flagged))
        );
        assert_eq!(cache.get(&user(), "alice").await, None);
    }

    #[tokio::test]
    async fn test_non_boolean_allowed_is_a_miss() {
        let store = MemoryStore::new();
        let key = decision_key("u1", "alice");
        store.insert(&key, doc(json!({"allowed": "true"}))).await;
        let cache = DecisionCache::new(Arc::new(store.clone()));
        assert_eq!(cache.get(&user(), "alice").await, None);

        store.insert(&key, doc(json!({"reason": "flagged"}))).await;
        assert_eq!(cache.get(&user(), "alice").await, None);
    }

    #[tokio::test]
    async fn test_put_merges_into_existing_entry() {
        let store = MemoryStore::new();
        let key = decision_key("u1", "alice");
        store
            .insert(&key, doc(json!({"allowed": true, "reviewedBy": "ops"})))
            .await;
        let cache = DecisionCache::new(Arc::new(store.clone()));

        cache
            .put(&user(), "alice", false, Some(DenialReason::Flagged))
            .await;

        let stored = store.get(&key).await.unwrap().unwrap();
        assert_eq!(stored["allowed"], json!(false));
        assert_eq!(stored["reason"], json!("flagged"));
        assert_eq!(stored["reviewedBy"], json!("ops"));
    }

    #[tokio::test]
    async fn test_unknown_reason_keeps_allowed_flag() {
        let store = MemoryStore::new();
        store
            .insert(
                &decision_key("u1", "alice"),
                doc(json!({"allowed": false, "reason": "manual_review"})),
            )
            .await;
        let cache = DecisionCache::new(Arc::new(store));

        assert_eq!(
            cache.get(&user(), "alice").await,
            Some(Verdict {
                allowed: false,
                reason: None
            })
        );
    }

    #[tokio::test]
    async fn test_store_failure_fails_open() {
        let cache = DecisionCache::new(Arc::new(FailingStore));
        assert_eq!(cache.get(&user(), "alice").await, None);
        // must not panic or surface the error
        cache.put(&user(), "alice", true, None).await;
    }
}
