//! The genetic sample store.
//!
//! Samples are immutable after registration except for their viability
//! status. Sample identifiers are global across species. Diversity
//! recomputation is driven by the registry, which owns both this store and
//! the [`DiversityIndex`](crate::diversity::DiversityIndex).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use seedbank_types::{GeneticSample, Principal, SampleId, SampleParams, SpeciesId};

use crate::allocator::IdAllocator;
use crate::error::{RecordKind, RegistryError};
use crate::species::SpeciesStore;

/// Genetic samples keyed by identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneticSampleStore {
    samples: BTreeMap<SampleId, GeneticSample>,
}

impl GeneticSampleStore {
    /// Create an empty store.
    pub const fn new() -> Self {
        Self {
            samples: BTreeMap::new(),
        }
    }

    /// Store a sample for a registered species and return its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::SpeciesNotFound`] if the species is not
    /// registered. No identifier is consumed in that case.
    pub fn register(
        &mut self,
        ids: &mut IdAllocator,
        species: &SpeciesStore,
        params: SampleParams,
        caller: Principal,
        now: DateTime<Utc>,
    ) -> Result<SampleId, RegistryError> {
        species.ensure_registered(params.species_id)?;

        let id = ids.next_sample()?;
        self.samples.insert(
            id,
            GeneticSample {
                id,
                species_id: params.species_id,
                source_location: params.source_location,
                collected_at: now,
                genetic_markers: params.genetic_markers,
                stored_by: caller,
                storage_location: params.storage_location,
                viability_status: params.viability_status,
            },
        );
        tracing::debug!(sample_id = %id, species_id = %params.species_id, "Registered genetic sample");
        Ok(id)
    }

    /// Look up a sample.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if no sample has this id.
    pub fn get(&self, id: SampleId) -> Result<&GeneticSample, RegistryError> {
        self.samples
            .get(&id)
            .ok_or_else(|| RegistryError::not_found(RecordKind::GeneticSample, id))
    }

    /// Overwrite the viability status of a sample. No other field changes.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if no sample has this id.
    pub fn update_viability(&mut self, id: SampleId, status: String) -> Result<(), RegistryError> {
        let sample = self
            .samples
            .get_mut(&id)
            .ok_or_else(|| RegistryError::not_found(RecordKind::GeneticSample, id))?;
        tracing::debug!(
            sample_id = %id,
            from = sample.viability_status,
            to = status,
            "Updated viability status"
        );
        sample.viability_status = status;
        Ok(())
    }

    /// Samples of one species, in id order.
    pub fn samples_for_species(&self, species_id: SpeciesId) -> impl Iterator<Item = &GeneticSample> {
        self.samples
            .values()
            .filter(move |sample| sample.species_id == species_id)
    }

    /// Insert a sample verbatim (snapshot restore). Returns `false` if the
    /// id was already present.
    pub(crate) fn restore(&mut self, sample: GeneticSample) -> bool {
        self.samples.insert(sample.id, sample).is_none()
    }

    /// All samples in id order.
    pub fn iter(&self) -> impl Iterator<Item = &GeneticSample> {
        self.samples.values()
    }

    /// Number of stored samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no sample is stored.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
