//! Growing conditions: at most one cultivation record per species.
//!
//! The key is the species identifier itself, so there is nothing to
//! allocate. Add and update share one path: the record is written as a
//! whole, replacing any previous one.

use std::collections::BTreeMap;

use seedbank_types::{GrowingConditions, SpeciesId};

use crate::error::{RecordKind, RegistryError};
use crate::species::SpeciesStore;

/// Whether [`GrowingConditionsStore::set`] created or replaced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// No record existed for the species.
    Created,
    /// An existing record was overwritten.
    Replaced,
}

/// Growing conditions keyed by species.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrowingConditionsStore {
    records: BTreeMap<SpeciesId, GrowingConditions>,
}

impl GrowingConditionsStore {
    /// Create an empty store.
    pub const fn new() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }

    /// Create or wholly replace the conditions for `conditions.species_id`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::SpeciesNotFound`] if the species is not
    /// registered; nothing is written in that case.
    pub fn set(
        &mut self,
        species: &SpeciesStore,
        conditions: GrowingConditions,
    ) -> Result<Upsert, RegistryError> {
        let species_id = conditions.species_id;
        species.ensure_registered(species_id)?;

        let outcome = match self.records.insert(species_id, conditions) {
            None => Upsert::Created,
            Some(_) => Upsert::Replaced,
        };
        tracing::debug!(species_id = %species_id, ?outcome, "Stored growing conditions");
        Ok(outcome)
    }

    /// Look up the conditions for a species.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if no conditions were recorded,
    /// whether or not the species itself exists.
    pub fn get(&self, species_id: SpeciesId) -> Result<&GrowingConditions, RegistryError> {
        self.records
            .get(&species_id)
            .ok_or_else(|| RegistryError::not_found(RecordKind::GrowingConditions, species_id))
    }

    /// Insert a record verbatim (snapshot restore). Returns `false` if the
    /// species already had conditions.
    pub(crate) fn restore(&mut self, record: GrowingConditions) -> bool {
        self.records.insert(record.species_id, record).is_none()
    }

    /// All records in species order.
    pub fn iter(&self) -> impl Iterator<Item = &GrowingConditions> {
        self.records.values()
    }

    /// Number of species with recorded conditions.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no conditions are recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
