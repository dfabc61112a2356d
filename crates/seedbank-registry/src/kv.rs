//! The persistence seam: an abstract durable key-value store.
//!
//! The registry does not know how bytes reach disk. Hosts implement
//! [`KeyValueStore`] for their backend; [`MemoryStore`] is the in-process
//! implementation used by tests and ephemeral hosts. [`save_registry`] and
//! [`load_registry`] move a whole registry through a store as one JSON
//! snapshot under [`SNAPSHOT_KEY`].

use std::collections::BTreeMap;

use crate::registry::Registry;
use crate::snapshot::{RegistrySnapshot, SnapshotError};

/// Key under which the registry snapshot is stored.
pub const SNAPSHOT_KEY: &str = "registry/snapshot";

/// Errors raised by a [`KeyValueStore`] backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An I/O operation failed.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The key cannot be represented by the backend.
    #[error("invalid store key: {0}")]
    InvalidKey(String),

    /// Any other backend failure.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Errors from saving or loading a registry through a store.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// The backend failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The snapshot could not be encoded or decoded.
    #[error("snapshot encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The decoded snapshot violates a registry invariant.
    #[error("invalid snapshot: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// A durable byte store keyed by string.
pub trait KeyValueStore {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Store `value` under `key`, replacing any previous value. The write
    /// is durable once this returns.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    fn put(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Remove `key`. Returns whether a value was present.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    fn delete(&mut self, key: &str) -> Result<bool, StoreError>;
}

/// In-process [`KeyValueStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.entries.insert(key.to_owned(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<bool, StoreError> {
        Ok(self.entries.remove(key).is_some())
    }
}

/// Write the registry's snapshot to `store`.
///
/// # Errors
///
/// Returns [`PersistError`] if encoding or the backend write fails.
pub fn save_registry<S: KeyValueStore + ?Sized>(
    store: &mut S,
    registry: &Registry,
) -> Result<(), PersistError> {
    let bytes = serde_json::to_vec(&registry.snapshot())?;
    store.put(SNAPSHOT_KEY, &bytes)?;
    tracing::debug!(bytes = bytes.len(), "Saved registry snapshot");
    Ok(())
}

/// Read and restore the registry stored in `store`.
///
/// Returns `Ok(None)` when the store holds no snapshot.
///
/// # Errors
///
/// Returns [`PersistError`] if the backend read, decoding or the invariant
/// check fails.
pub fn load_registry<S: KeyValueStore + ?Sized>(
    store: &S,
) -> Result<Option<Registry>, PersistError> {
    let Some(bytes) = store.get(SNAPSHOT_KEY)? else {
        return Ok(None);
    };
    let snapshot: RegistrySnapshot = serde_json::from_slice(&bytes)?;
    Ok(Some(Registry::restore(snapshot)?))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use seedbank_types::{NewSpecies, Principal, SampleParams, SpeciesId};

    use super::*;
    use crate::diversity::diversity_index;

    #[test]
    fn memory_store_put_get_delete() {
        let mut store = MemoryStore::new();
        assert!(store.put("a", b"1").is_ok());
        assert_eq!(store.get("a").ok().flatten(), Some(b"1".to_vec()));
        assert_eq!(store.delete("a").ok(), Some(true));
        assert_eq!(store.delete("a").ok(), Some(false));
        assert!(store.is_empty());
    }

    #[test]
    fn empty_store_loads_nothing() {
        let store = MemoryStore::new();
        assert!(matches!(load_registry(&store), Ok(None)));
    }

    #[test]
    fn diversity_index_survives_save_and_load_bit_for_bit() {
        let who = Principal::new("curator");
        let mut registry = Registry::new();
        let _ = registry.register_species(
            NewSpecies {
                scientific_name: "Wollemia nobilis".to_owned(),
                common_name: String::new(),
                conservation_status: "Critically Endangered".to_owned(),
            },
            who.clone(),
            Utc::now(),
        );
        // Counts that are not powers of two give indices whose shortest
        // decimal form needs every digit to round-trip.
        for _ in 0..92 {
            let _ = registry.register_genetic_sample(
                SampleParams {
                    species_id: SpeciesId::new(1),
                    source_location: "Blue Mountains".to_owned(),
                    genetic_markers: "matK".to_owned(),
                    storage_location: "Vault C".to_owned(),
                    viability_status: "Viable".to_owned(),
                },
                who.clone(),
                Utc::now(),
            );
        }
        let before = registry
            .species_diversity(SpeciesId::new(1))
            .map(|m| m.diversity_index.to_bits())
            .ok();
        assert_eq!(before, Some(diversity_index(92).to_bits()));

        let mut store = MemoryStore::new();
        assert!(save_registry(&mut store, &registry).is_ok());
        let loaded = load_registry(&store).ok().flatten();
        let after = loaded
            .as_ref()
            .and_then(|r| r.species_diversity(SpeciesId::new(1)).ok())
            .map(|m| m.diversity_index.to_bits());
        assert_eq!(after, before);
        assert_eq!(loaded.map(|r| r.snapshot()), Some(registry.snapshot()));
    }

    #[test]
    fn registry_roundtrips_through_store() {
        let mut registry = Registry::new();
        let _ = registry.register_species(
            NewSpecies {
                scientific_name: "Amorphophallus titanum".to_owned(),
                common_name: "Corpse Flower".to_owned(),
                conservation_status: "Endangered".to_owned(),
            },
            Principal::new("curator"),
            Utc::now(),
        );

        let mut store = MemoryStore::new();
        assert!(save_registry(&mut store, &registry).is_ok());
        assert_eq!(store.len(), 1);

        let loaded = load_registry(&store).ok().flatten();
        assert_eq!(
            loaded.as_ref().and_then(|r| r.species(SpeciesId::new(1)).ok()).map(|s| s.common_name.as_str()),
            Some("Corpse Flower")
        );
        assert_eq!(loaded, Some(registry));
    }

    #[test]
    fn corrupt_snapshot_is_an_encoding_error() {
        let mut store = MemoryStore::new();
        let _ = store.put(SNAPSHOT_KEY, b"{not json");
        assert!(matches!(load_registry(&store), Err(PersistError::Encoding(_))));
    }
}
