//! The species store: canonical species records keyed by [`SpeciesId`].
//!
//! Species are the root entity. They are registered once, mutated only on
//! their conservation status and never deleted.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use seedbank_types::{NewSpecies, Principal, Species, SpeciesId};

use crate::allocator::IdAllocator;
use crate::error::{RecordKind, RegistryError};

/// Species records keyed by identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeciesStore {
    records: BTreeMap<SpeciesId, Species>,
}

impl SpeciesStore {
    /// Create an empty store.
    pub const fn new() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }

    /// Register a new species and return its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::IdentifierExhausted`] only if the species
    /// counter cannot advance.
    pub fn register(
        &mut self,
        ids: &mut IdAllocator,
        params: NewSpecies,
        caller: Principal,
        now: DateTime<Utc>,
    ) -> Result<SpeciesId, RegistryError> {
        let id = ids.next_species()?;
        self.records.insert(
            id,
            Species {
                id,
                scientific_name: params.scientific_name,
                common_name: params.common_name,
                conservation_status: params.conservation_status,
                registered_at: now,
                registered_by: caller,
            },
        );
        tracing::debug!(species_id = %id, "Registered species");
        Ok(id)
    }

    /// Look up a species.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if no species has this id.
    pub fn get(&self, id: SpeciesId) -> Result<&Species, RegistryError> {
        self.records
            .get(&id)
            .ok_or_else(|| RegistryError::not_found(RecordKind::Species, id))
    }

    /// Overwrite the conservation status of a species. No other field
    /// changes.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if no species has this id.
    pub fn update_conservation_status(
        &mut self,
        id: SpeciesId,
        status: String,
    ) -> Result<(), RegistryError> {
        let record = self
            .records
            .get_mut(&id)
            .ok_or_else(|| RegistryError::not_found(RecordKind::Species, id))?;
        tracing::debug!(
            species_id = %id,
            from = record.conservation_status,
            to = status,
            "Updated conservation status"
        );
        record.conservation_status = status;
        Ok(())
    }

    /// Check that a dependent record may reference `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::SpeciesNotFound`] if the species is not
    /// registered.
    pub fn ensure_registered(&self, id: SpeciesId) -> Result<(), RegistryError> {
        if self.records.contains_key(&id) {
            Ok(())
        } else {
            Err(RegistryError::SpeciesNotFound(id))
        }
    }

    /// Whether a species with this id exists.
    pub fn contains(&self, id: SpeciesId) -> bool {
        self.records.contains_key(&id)
    }

    /// Insert a record verbatim (snapshot restore). Returns `false` if the
    /// id was already present.
    pub(crate) fn restore(&mut self, record: Species) -> bool {
        self.records.insert(record.id, record).is_none()
    }

    /// All species in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Species> {
        self.records.values()
    }

    /// Number of registered species.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no species is registered.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
