//! Sequential identifier allocation.
//!
//! Three independent counters, one per allocated entity type. Each starts at
//! 1 and hands out its current value before advancing. Callers allocate only
//! after validation has passed, so a rejected request never consumes an
//! identifier and never leaves a gap.

use serde::{Deserialize, Serialize};

use seedbank_types::{PropagationEventId, SampleId, SpeciesId};

use crate::error::RegistryError;

/// First identifier handed out in every namespace.
pub const FIRST_ID: u64 = 1;

/// An identifier namespace with its own counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IdNamespace {
    /// Species identifiers.
    Species,
    /// Propagation event identifiers.
    PropagationEvent,
    /// Genetic sample identifiers.
    GeneticSample,
}

impl core::fmt::Display for IdNamespace {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Species => "species",
            Self::PropagationEvent => "propagation events",
            Self::GeneticSample => "genetic samples",
        })
    }
}

/// The three identifier counters of a registry.
///
/// Each field holds the value the next allocation in that namespace will
/// return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocator {
    /// Next species identifier.
    species: u64,
    /// Next propagation event identifier.
    propagation_event: u64,
    /// Next genetic sample identifier.
    genetic_sample: u64,
}

impl IdAllocator {
    /// Fresh counters, all at [`FIRST_ID`].
    pub const fn new() -> Self {
        Self {
            species: FIRST_ID,
            propagation_event: FIRST_ID,
            genetic_sample: FIRST_ID,
        }
    }

    /// Counters resumed from persisted values.
    pub const fn from_parts(species: u64, propagation_event: u64, genetic_sample: u64) -> Self {
        Self {
            species,
            propagation_event,
            genetic_sample,
        }
    }

    /// The value the next call to [`next`](Self::next) will return for
    /// `namespace`, without consuming it.
    pub const fn peek(&self, namespace: IdNamespace) -> u64 {
        match namespace {
            IdNamespace::Species => self.species,
            IdNamespace::PropagationEvent => self.propagation_event,
            IdNamespace::GeneticSample => self.genetic_sample,
        }
    }

    /// Return the current counter value for `namespace` and advance it.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::IdentifierExhausted`] if the counter cannot
    /// advance. The counter is left untouched in that case.
    pub fn next(&mut self, namespace: IdNamespace) -> Result<u64, RegistryError> {
        let slot = match namespace {
            IdNamespace::Species => &mut self.species,
            IdNamespace::PropagationEvent => &mut self.propagation_event,
            IdNamespace::GeneticSample => &mut self.genetic_sample,
        };
        let id = *slot;
        *slot = id
            .checked_add(1)
            .ok_or(RegistryError::IdentifierExhausted(namespace))?;
        Ok(id)
    }

    /// Allocate a species identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::IdentifierExhausted`] on counter overflow.
    pub fn next_species(&mut self) -> Result<SpeciesId, RegistryError> {
        self.next(IdNamespace::Species).map(SpeciesId::new)
    }

    /// Allocate a propagation event identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::IdentifierExhausted`] on counter overflow.
    pub fn next_propagation_event(&mut self) -> Result<PropagationEventId, RegistryError> {
        self.next(IdNamespace::PropagationEvent)
            .map(PropagationEventId::new)
    }

    /// Allocate a genetic sample identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::IdentifierExhausted`] on counter overflow.
    pub fn next_sample(&mut self) -> Result<SampleId, RegistryError> {
        self.next(IdNamespace::GeneticSample).map(SampleId::new)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
