use super::verdict::Identity;
use crate::store::{username_key, SharedStore};
use serde_json::Value;
use tracing::warn;

/// Field on a username record naming its owner
const OWNER_FIELD: &str = "uid";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ownership {
    /// No record, or a record without an owner
    Unclaimed,
    OwnedByRequester,
    Taken { owner: String },
    /// Lookup failed; treated as no conflict
    Unverified,
}

impl Ownership {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Ownership::Taken { .. })
    }
}

/// Looks up who owns a normalized name
///
/// Records are written by the registration flow; this checker only reads.
#[derive(Clone)]
pub struct OwnershipChecker {
    store: SharedStore,
}

impl OwnershipChecker {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn check(&self, normalized: &str, identity: &Identity) -> Ownership {
        let record = match self.store.get(&username_key(normalized)).await {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, name = normalized, "Username check failed");
                return Ownership::Unverified;
            }
        };

        let owner = record
            .as_ref()
            .and_then(|doc| doc.get(OWNER_FIELD))
            .and_then(owner_text)
            .filter(|owner| !owner.is_empty());

        match (owner, identity.user_id()) {
            (None, _) => Ownership::Unclaimed,
            (Some(owner), Some(uid)) if owner == uid => Ownership::OwnedByRequester,
            (Some(owner), _) => Ownership::Taken { owner },
        }
    }
}

/// Owner ids written as bare digits read back from the store as numbers
fn owner_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
