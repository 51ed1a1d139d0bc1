//! The self-contained `{persons, relationships}` value exchanged with the
//! hosting application, the layout engine, and storage.

use serde::{Deserialize, Serialize};

use crate::model::{Person, PersonId, Relationship};

/// Complete graph state at one point in time.
///
/// Owned data only: nothing in a snapshot aliases engine-internal state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub persons: Vec<Person>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl Snapshot {
    #[must_use]
    pub const fn new(persons: Vec<Person>, relationships: Vec<Relationship>) -> Self {
        Self {
            persons,
            relationships,
        }
    }

    #[must_use]
    pub fn person(&self, id: &PersonId) -> Option<&Person> {
        self.persons.iter().find(|p| &p.id == id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.persons.is_empty() && self.relationships.is_empty()
    }

    /// BLAKE3 hash of the canonical JSON encoding, as `blake3:<hex>`.
    ///
    /// Field order is fixed by the struct definitions, so equal snapshots
    /// always hash equally.
    ///
    /// # Errors
    ///
    /// Propagates a `serde_json` encoding failure.
    pub fn content_hash(&self) -> Result<String, serde_json::Error> {
        let bytes = serde_json::to_vec(self)?;
        Ok(format!("blake3:{}", blake3::hash(&bytes).to_hex()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::initial_family;

    #[test]
    fn json_round_trip_is_lossless() {
        let snap = initial_family();
        let json = serde_json::to_string(&snap).expect("serialize");
        let back: Snapshot = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, snap);
    }

    #[test]
    fn content_hash_is_stable_and_sensitive() {
        let snap = initial_family();
        let hash = snap.content_hash().expect("hash");
        assert_eq!(hash, snap.clone().content_hash().expect("hash"));
        assert!(hash.starts_with("blake3:"));

        let mut moved = snap.clone();
        moved.persons[0].position.x += 1.0;
        assert_ne!(moved.content_hash().expect("hash"), hash);
    }

    #[test]
    fn missing_collections_default_to_empty() {
        let snap: Snapshot = serde_json::from_str("{}").expect("parse");
        assert!(snap.is_empty());
    }

    #[test]
    fn person_lookup_by_id() {
        let snap = initial_family();
        let mike = snap.person(&PersonId::new("3")).expect("seed has person 3");
        assert_eq!(mike.display_name(), "Mike");
        assert!(snap.person(&PersonId::new("404")).is_none());
    }
}
