//! State journal seam
//!
//! The engine writes every successful mutation through to a [`StateJournal`]
//! and reloads the full document set at startup. Documents are opaque
//! key-value pairs: the journal stores whatever JSON body it is handed and
//! never interprets it. Key construction is centralized here so the engine
//! and the sweeper always agree on which document belongs to which record.

use crate::error::Result;
use crate::record::EntityId;
use serde_json::Value;

/// One persisted record: a string key and an opaque JSON body
#[derive(Debug, Clone, PartialEq)]
pub struct JournalDoc {
    pub key: String,
    pub body: Value,
}

impl JournalDoc {
    pub fn new(key: impl Into<String>, body: Value) -> Self {
        Self {
            key: key.into(),
            body,
        }
    }
}

/// Persistence collaborator for restriction records
///
/// Implementations must be safe to call from any thread. Callers never hold
/// a store lock across these calls.
pub trait StateJournal: Send + Sync {
    /// Load every stored document
    fn load_all(&self) -> Result<Vec<JournalDoc>>;

    /// Insert or replace one document
    fn save(&self, doc: &JournalDoc) -> Result<()>;

    /// Remove one document; removing an absent key is a no-op
    fn delete(&self, key: &str) -> Result<()>;
}

/// Journal key for an entity's mute record
pub fn mute_key(entity: EntityId) -> String {
    format!("mute:{}", entity)
}

/// Journal key for an entity's freeze record
pub fn freeze_key(entity: EntityId) -> String {
    format!("freeze:{}", entity)
}

/// Journal key for an entity's warning ledger
pub fn warnings_key(entity: EntityId) -> String {
    format!("warnings:{}", entity)
}

/// Journal key for an entity's confinement record
pub fn confinement_key(entity: EntityId) -> String {
    format!("confinement:{}", entity)
}

/// Journal key for a jail site (name is matched case-insensitively)
pub fn jail_site_key(name: &str) -> String {
    format!("jail-site:{}", name.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_keys_are_namespaced_and_distinct() {
        let entity = Uuid::new_v4();
        let keys = [
            mute_key(entity),
            freeze_key(entity),
            warnings_key(entity),
            confinement_key(entity),
        ];

        for (i, a) in keys.iter().enumerate() {
            assert!(a.contains(&entity.to_string()));
            for b in keys.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_jail_site_key_is_case_insensitive() {
        assert_eq!(jail_site_key("Cell-A"), jail_site_key("cell-a"));
    }
}
