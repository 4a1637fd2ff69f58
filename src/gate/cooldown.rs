use super::verdict::Identity;
use crate::store::{cooldown_key, Document, SharedStore};
use chrono::Utc;
use serde_json::json;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(10);

const LAST_ATTEMPT_FIELD: &str = "lastAttemptMs";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownResult {
    pub allowed: bool,
    /// Milliseconds until the identity may try again, when throttled
    pub retry_after_ms: Option<u64>,
}

impl CooldownResult {
    fn allowed() -> Self {
        Self {
            allowed: true,
            retry_after_ms: None,
        }
    }
}

/// Per-identity minimum interval between real moderation calls
///
/// Best effort only: two concurrent requests can both read the old record
/// before either writes, so the window is a soft limit.
#[derive(Clone)]
pub struct CooldownLimiter {
    store: SharedStore,
    window: Duration,
}

impl CooldownLimiter {
    pub fn new(store: SharedStore, window: Duration) -> Self {
        Self { store, window }
    }

    pub async fn check_and_record(&self, identity: &Identity) -> CooldownResult {
        self.check_and_record_at(identity, Utc::now().timestamp_millis())
            .await
    }

    /// Throttled attempts do not move the window forward; accepted ones record `now_ms`
    pub async fn check_and_record_at(&self, identity: &Identity, now_ms: i64) -> CooldownResult {
        // Anonymous callers have no stable key to limit on
        let Some(uid) = identity.user_id() else {
            return CooldownResult::allowed();
        };
        let key = cooldown_key(uid);

        let record = match self.store.get(&key).await {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Moderation cooldown check failed");
                return CooldownResult::allowed();
            }
        };

        let window_ms = i64::try_from(self.window.as_millis()).unwrap_or(i64::MAX);
        let last_ms = record
            .as_ref()
            .and_then(|doc| doc.get(LAST_ATTEMPT_FIELD))
            .and_then(|value| value.as_i64())
            .filter(|last| *last > 0);

        if let Some(last_ms) = last_ms {
            let elapsed = now_ms.saturating_sub(last_ms);
            if elapsed < window_ms {
                return CooldownResult {
                    allowed: false,
                    retry_after_ms: Some(window_ms.saturating_sub(elapsed).max(0) as u64),
                };
            }
        }

        let mut fields = Document::new();
        fields.insert(LAST_ATTEMPT_FIELD.into(), json!(now_ms));
        if let Err(e) = self.store.set_merge(&key, fields).await {
            warn!(error = %e, "Moderation cooldown update failed");
        }

        CooldownResult::allowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DocumentStore, MemoryStore};
    use crate::testing::{doc, FailingStore};
    use std::sync::Arc;

    const T0: i64 = 1_700_000_000_000;

    fn user() -> Identity {
        Identity::User("u1".into())
    }

    fn limiter(store: &MemoryStore) -> CooldownLimiter {
        CooldownLimiter::new(Arc::new(store.clone()), DEFAULT_COOLDOWN)
    }

    #[tokio::test]
    async fn test_first_attempt_is_recorded() {
        let store = MemoryStore::new();
        let result = limiter(&store).check_and_record_at(&user(), T0).await;

        assert!(result.allowed);
        let stored = store.get(&cooldown_key("u1")).await.unwrap().unwrap();
        assert_eq!(stored["lastAttemptMs"], json!(T0));
    }

    #[tokio::test]
    async fn test_second_attempt_inside_window_is_throttled() {
        let store = MemoryStore::new();
        let limiter = limiter(&store);

        assert!(limiter.check_and_record_at(&user(), T0).await.allowed);
        let result = limiter.check_and_record_at(&user(), T0 + 4_000).await;

        assert!(!result.allowed);
        assert_eq!(result.retry_after_ms, Some(6_000));
    }

    #[tokio::test]
    async fn test_oversized_window_saturates() {
        let store = MemoryStore::new();
        let limiter = CooldownLimiter::new(Arc::new(store.clone()), Duration::from_secs(u64::MAX));

        assert!(limiter.check_and_record_at(&user(), T0).await.allowed);
        let result = limiter.check_and_record_at(&user(), T0 + 1_000_000_000).await;

        assert!(!result.allowed);
        assert_eq!(result.retry_after_ms, Some((i64::MAX - 1_000_000_000) as u64));
    }

    #[tokio::test]
    async fn test_throttled_attempt_does_not_reset_window() {
        let store = MemoryStore::new();
        let limiter = limiter(&store);

        limiter.check_and_record_at(&user(), T0).await;
        limiter.check_and_record_at(&user(), T0 + 9_999).await;

        let stored = store.get(&cooldown_key("u1")).await.unwrap().unwrap();
        assert_eq!(stored["lastAttemptMs"], json!(T0));
        assert!(limiter.check_and_record_at(&user(), T0 + 10_000).await.allowed);
    }

    #[tokio::test]
    async fn test_other_fields_survive_update() {
        let store = MemoryStore::new();
        store
            .insert(&cooldown_key("u1"), doc(json!({"lastAttemptMs": T0, "strikes": 2})))
            .await;

        limiter(&store)
            .check_and_record_at(&user(), T0 + 60_000)
            .await;

        let stored = store.get(&cooldown_key("u1")).await.unwrap().unwrap();
        assert_eq!(stored["lastAttemptMs"], json!(T0 + 60_000));
        assert_eq!(stored["strikes"], json!(2));
    }

    #[tokio::test]
    async fn test_anonymous_is_never_limited_or_recorded() {
        let store = MemoryStore::new();
        let limiter = limiter(&store);

        assert!(limiter.check_and_record_at(&Identity::Anonymous, T0).await.allowed);
        assert!(limiter.check_and_record_at(&Identity::Anonymous, T0 + 1).await.allowed);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_malformed_record_is_ignored() {
        let store = MemoryStore::new();
        store
            .insert(&cooldown_key("u1"), doc(json!({"lastAttemptMs": "soon"})))
            .await;

        assert!(limiter(&store).check_and_record_at(&user(), T0).await.allowed);
    }

    #[tokio::test]
    async fn test_store_failure_fails_open() {
        let limiter = CooldownLimiter::new(Arc::new(FailingStore), DEFAULT_COOLDOWN);
        assert!(limiter.check_and_record_at(&user(), T0).await.allowed);
        assert!(limiter.check_and_record_at(&user(), T0 + 1).await.allowed);
    }
}
