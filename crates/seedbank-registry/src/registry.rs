//! The registry state machine.
//!
//! [`Registry`] owns the identifier counters and all five sub-stores. It is
//! an explicit container: create one per logical registry, pass it by
//! reference, and drop or [`reset`](Registry::reset) it to start over.
//!
//! Every method runs to completion before returning. Mutating methods check
//! existence first, allocate second and write last, so a returned error
//! always means nothing changed. Hosts that serve concurrent callers must
//! serialize access to a `Registry` behind one lock.

use chrono::{DateTime, Utc};

use seedbank_types::{
    DiversityMetrics, GeneticSample, GrowingConditions, MutatingOperation, NewSpecies,
    OperationValue, Principal, PropagationEvent, PropagationEventId, PropagationParams,
    ReadOperation, SampleId, SampleParams, Species, SpeciesId,
};

use crate::allocator::IdAllocator;
use crate::conditions::{GrowingConditionsStore, Upsert};
use crate::diversity::DiversityIndex;
use crate::error::RegistryError;
use crate::propagation::PropagationLog;
use crate::samples::GeneticSampleStore;
use crate::species::SpeciesStore;

/// The complete registry state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    pub(crate) ids: IdAllocator,
    pub(crate) species: SpeciesStore,
    pub(crate) conditions: GrowingConditionsStore,
    pub(crate) propagation: PropagationLog,
    pub(crate) samples: GeneticSampleStore,
    pub(crate) diversity: DiversityIndex,
}

impl Registry {
    /// Create an empty registry with all counters at 1.
    pub const fn new() -> Self {
        Self {
            ids: IdAllocator::new(),
            species: SpeciesStore::new(),
            conditions: GrowingConditionsStore::new(),
            propagation: PropagationLog::new(),
            samples: GeneticSampleStore::new(),
            diversity: DiversityIndex::new(),
        }
    }

    /// Discard all records and restart every counter at 1.
    pub fn reset(&mut self) {
        *self = Self::new();
        tracing::info!("Registry reset");
    }

    // =========================================================================
    // Mutating operations
    // =========================================================================

    /// Register a species.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::IdentifierExhausted`] only if the species
    /// counter cannot advance.
    pub fn register_species(
        &mut self,
        params: NewSpecies,
        caller: Principal,
        now: DateTime<Utc>,
    ) -> Result<SpeciesId, RegistryError> {
        self.species.register(&mut self.ids, params, caller, now)
    }

    /// Overwrite the conservation status of a species.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if the species does not exist.
    pub fn update_conservation_status(
        &mut self,
        species_id: SpeciesId,
        status: String,
    ) -> Result<(), RegistryError> {
        self.species.update_conservation_status(species_id, status)
    }

    /// Create or replace the growing conditions of a species.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::SpeciesNotFound`] if the species does not
    /// exist.
    pub fn set_growing_conditions(
        &mut self,
        conditions: GrowingConditions,
    ) -> Result<Upsert, RegistryError> {
        self.conditions.set(&self.species, conditions)
    }

    /// Append a propagation event.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::SpeciesNotFound`] if the species does not
    /// exist.
    pub fn record_propagation(
        &mut self,
        params: PropagationParams,
        caller: Principal,
        now: DateTime<Utc>,
    ) -> Result<PropagationEventId, RegistryError> {
        self.propagation
            .record(&mut self.ids, &self.species, params, caller, now)
    }

    /// Register a genetic sample and recompute its species' diversity.
    ///
    /// The new metrics are computed before the sample is written, so the
    /// sample insert and the metrics update either both happen or neither
    /// does.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::SpeciesNotFound`] if the species does not
    /// exist.
    pub fn register_genetic_sample(
        &mut self,
        params: SampleParams,
        caller: Principal,
        now: DateTime<Utc>,
    ) -> Result<SampleId, RegistryError> {
        let pending = self.diversity.recompute(params.species_id, now)?;
        let id = self
            .samples
            .register(&mut self.ids, &self.species, params, caller, now)?;
        self.diversity.commit(pending);
        Ok(id)
    }

    /// Overwrite the viability status of a sample.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if the sample does not exist.
    pub fn update_viability_status(
        &mut self,
        sample_id: SampleId,
        status: String,
    ) -> Result<(), RegistryError> {
        self.samples.update_viability(sample_id, status)
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Look up a species.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if absent.
    pub fn species(&self, id: SpeciesId) -> Result<&Species, RegistryError> {
        self.species.get(id)
    }

    /// Look up a species' growing conditions.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if none were recorded.
    pub fn growing_conditions(&self, id: SpeciesId) -> Result<&GrowingConditions, RegistryError> {
        self.conditions.get(id)
    }

    /// Look up a propagation event.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if absent.
    pub fn propagation_event(
        &self,
        id: PropagationEventId,
    ) -> Result<&PropagationEvent, RegistryError> {
        self.propagation.get(id)
    }

    /// Look up a genetic sample.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if absent.
    pub fn genetic_sample(&self, id: SampleId) -> Result<&GeneticSample, RegistryError> {
        self.samples.get(id)
    }

    /// Look up a species' diversity metrics.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if no sample was ever registered
    /// for the species.
    pub fn species_diversity(&self, id: SpeciesId) -> Result<&DiversityMetrics, RegistryError> {
        self.diversity.get(id)
    }

    /// Propagation events of one species, in id order.
    pub fn propagation_events_for(
        &self,
        species_id: SpeciesId,
    ) -> impl Iterator<Item = &PropagationEvent> {
        self.propagation.events_for_species(species_id)
    }

    /// Genetic samples of one species, in id order.
    pub fn samples_for(&self, species_id: SpeciesId) -> impl Iterator<Item = &GeneticSample> {
        self.samples.samples_for_species(species_id)
    }

    /// The identifier counters.
    pub const fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    /// Number of registered species.
    pub fn species_count(&self) -> usize {
        self.species.len()
    }

    /// Whether the registry holds no records at all.
    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
            && self.conditions.is_empty()
            && self.propagation.is_empty()
            && self.samples.is_empty()
            && self.diversity.is_empty()
    }

    // =========================================================================
    // Typed dispatch
    // =========================================================================

    /// Run a decoded mutating operation on behalf of `caller` at `now`.
    ///
    /// # Errors
    ///
    /// Returns the [`RegistryError`] of the underlying operation.
    pub fn execute(
        &mut self,
        operation: MutatingOperation,
        caller: Principal,
        now: DateTime<Utc>,
    ) -> Result<OperationValue, RegistryError> {
        match operation {
            MutatingOperation::RegisterSpecies(params) => self
                .register_species(params, caller, now)
                .map(OperationValue::SpeciesId),
            MutatingOperation::UpdateConservationStatus { species_id, status } => self
                .update_conservation_status(species_id, status)
                .map(|()| OperationValue::Updated),
            MutatingOperation::AddGrowingConditions(conditions)
            | MutatingOperation::UpdateGrowingConditions(conditions) => self
                .set_growing_conditions(conditions)
                .map(|_| OperationValue::Updated),
            MutatingOperation::RecordPropagation(params) => self
                .record_propagation(params, caller, now)
                .map(OperationValue::PropagationEventId),
            MutatingOperation::RegisterGeneticSample(params) => self
                .register_genetic_sample(params, caller, now)
                .map(OperationValue::SampleId),
            MutatingOperation::UpdateViabilityStatus { sample_id, status } => self
                .update_viability_status(sample_id, status)
                .map(|()| OperationValue::Updated),
        }
    }

    /// Run a decoded read operation.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if the target does not exist.
    pub fn query(&self, operation: ReadOperation) -> Result<OperationValue, RegistryError> {
        match operation {
            ReadOperation::GetSpecies(id) => self
                .species(id)
                .map(|record| OperationValue::Species(record.clone())),
            ReadOperation::GetGrowingConditions(id) => self
                .growing_conditions(id)
                .map(|record| OperationValue::GrowingConditions(record.clone())),
            ReadOperation::GetPropagationEvent(id) => self
                .propagation_event(id)
                .map(|record| OperationValue::PropagationEvent(record.clone())),
            ReadOperation::GetGeneticSample(id) => self
                .genetic_sample(id)
                .map(|record| OperationValue::GeneticSample(record.clone())),
            ReadOperation::GetSpeciesDiversity(id) => self
                .species_diversity(id)
                .map(|record| OperationValue::Diversity(record.clone())),
        }
    }
}
