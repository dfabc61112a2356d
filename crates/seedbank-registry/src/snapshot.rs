//! Serializable snapshots of a [`Registry`] and invariant-checked restore.
//!
//! A snapshot lists every record of every store plus the three counters.
//! [`Registry::restore`] rebuilds a registry from one and refuses snapshots
//! that would break a registry invariant:
//!
//! - every allocated id is unique, at least 1 and below its counter
//! - every dependent record references a registered species
//! - a species has diversity metrics iff it has samples, and the metrics'
//!   sample count equals the number of samples
//!
//! The stored diversity index is checked against the formula and then
//! replaced by the recomputed value, so a restored registry answers
//! diversity lookups bit-for-bit as the live one did.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use seedbank_types::{
    DiversityMetrics, GeneticSample, GrowingConditions, PropagationEvent, Species, SpeciesId,
};

use crate::allocator::{FIRST_ID, IdAllocator, IdNamespace};
use crate::diversity::diversity_index;
use crate::error::RecordKind;
use crate::registry::Registry;

/// Largest accepted difference between a stored diversity index and the
/// recomputed one.
pub const INDEX_TOLERANCE: f64 = 1e-6;

/// Errors that reject a snapshot during restore.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SnapshotError {
    /// Two records share one key.
    #[error("duplicate {kind} key: {id}")]
    DuplicateKey {
        /// Record type.
        kind: RecordKind,
        /// The repeated key.
        id: u64,
    },

    /// An allocated id lies outside `FIRST_ID..next`.
    #[error("{namespace} id {id} outside allocated range (next id is {next})")]
    IdOutOfRange {
        /// The identifier namespace.
        namespace: IdNamespace,
        /// The offending id.
        id: u64,
        /// The counter value in the snapshot.
        next: u64,
    },

    /// A dependent record references an unregistered species.
    #[error("{kind} {id} references unregistered species {species}")]
    DanglingSpecies {
        /// Record type.
        kind: RecordKind,
        /// Key of the dependent record.
        id: u64,
        /// The missing species.
        species: SpeciesId,
    },

    /// Diversity metrics disagree with the stored samples.
    #[error("diversity for species {species}: metrics count {recorded}, samples {actual}")]
    DiversityMismatch {
        /// The species.
        species: SpeciesId,
        /// `sample_count` in the metrics record (0 if absent).
        recorded: u64,
        /// Number of samples stored for the species.
        actual: u64,
    },

    /// A stored diversity index disagrees with the formula for its count.
    #[error("diversity for species {species}: index {recorded}, expected {expected}")]
    IndexMismatch {
        /// The species.
        species: SpeciesId,
        /// `diversity_index` in the metrics record.
        recorded: f64,
        /// The index recomputed from `sample_count`.
        expected: f64,
    },
}

/// A complete, serializable copy of a registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// Counter values at snapshot time.
    pub next_ids: IdAllocator,
    /// Species in id order.
    pub species: Vec<Species>,
    /// Growing conditions in species order.
    pub growing_conditions: Vec<GrowingConditions>,
    /// Propagation events in id order.
    pub propagation_events: Vec<PropagationEvent>,
    /// Genetic samples in id order.
    pub genetic_samples: Vec<GeneticSample>,
    /// Diversity metrics in species order.
    pub diversity: Vec<DiversityMetrics>,
}

impl Registry {
    /// Copy the full state into a snapshot.
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            next_ids: self.ids,
            species: self.species.iter().cloned().collect(),
            growing_conditions: self.conditions.iter().cloned().collect(),
            propagation_events: self.propagation.iter().cloned().collect(),
            genetic_samples: self.samples.iter().cloned().collect(),
            diversity: self.diversity.iter().cloned().collect(),
        }
    }

    /// Rebuild a registry from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns the first [`SnapshotError`] found; no registry is produced.
    pub fn restore(snapshot: RegistrySnapshot) -> Result<Self, SnapshotError> {
        let mut registry = Self::new();
        registry.ids = snapshot.next_ids;
        let ids = snapshot.next_ids;

        for record in snapshot.species {
            let id = record.id.into_inner();
            check_range(&ids, IdNamespace::Species, id)?;
            if !registry.species.restore(record) {
                return Err(SnapshotError::DuplicateKey {
                    kind: RecordKind::Species,
                    id,
                });
            }
        }

        for record in snapshot.growing_conditions {
            let id = record.species_id.into_inner();
            check_species(&registry, RecordKind::GrowingConditions, id, record.species_id)?;
            if !registry.conditions.restore(record) {
                return Err(SnapshotError::DuplicateKey {
                    kind: RecordKind::GrowingConditions,
                    id,
                });
            }
        }

        for event in snapshot.propagation_events {
            let id = event.id.into_inner();
            check_range(&ids, IdNamespace::PropagationEvent, id)?;
            check_species(&registry, RecordKind::PropagationEvent, id, event.species_id)?;
            if !registry.propagation.restore(event) {
                return Err(SnapshotError::DuplicateKey {
                    kind: RecordKind::PropagationEvent,
                    id,
                });
            }
        }

        let mut sample_counts: BTreeMap<SpeciesId, u64> = BTreeMap::new();
        for sample in snapshot.genetic_samples {
            let id = sample.id.into_inner();
            check_range(&ids, IdNamespace::GeneticSample, id)?;
            check_species(&registry, RecordKind::GeneticSample, id, sample.species_id)?;
            let count = sample_counts.entry(sample.species_id).or_insert(0);
            *count = count.saturating_add(1);
            if !registry.samples.restore(sample) {
                return Err(SnapshotError::DuplicateKey {
                    kind: RecordKind::GeneticSample,
                    id,
                });
            }
        }

        for metrics in snapshot.diversity {
            let species = metrics.species_id;
            check_species(
                &registry,
                RecordKind::DiversityMetrics,
                species.into_inner(),
                species,
            )?;
            let actual = sample_counts.remove(&species).unwrap_or(0);
            // A zero count can only come from metrics with no samples.
            if metrics.sample_count != actual || actual == 0 {
                return Err(SnapshotError::DiversityMismatch {
                    species,
                    recorded: metrics.sample_count,
                    actual,
                });
            }
            let expected = diversity_index(actual);
            let drift = (metrics.diversity_index - expected).abs();
            if drift.is_nan() || drift > INDEX_TOLERANCE {
                return Err(SnapshotError::IndexMismatch {
                    species,
                    recorded: metrics.diversity_index,
                    expected,
                });
            }
            let metrics = DiversityMetrics {
                diversity_index: expected,
                ..metrics
            };
            if !registry.diversity.restore(metrics) {
                return Err(SnapshotError::DuplicateKey {
                    kind: RecordKind::DiversityMetrics,
                    id: species.into_inner(),
                });
            }
        }

        // Species with samples but no metrics record.
        if let Some((&species, &actual)) = sample_counts.iter().next() {
            return Err(SnapshotError::DiversityMismatch {
                species,
                recorded: 0,
                actual,
            });
        }

        tracing::info!(
            species = registry.species.len(),
            propagation_events = registry.propagation.len(),
            genetic_samples = registry.samples.len(),
            "Registry restored from snapshot"
        );
        Ok(registry)
    }
}

fn check_range(ids: &IdAllocator, namespace: IdNamespace, id: u64) -> Result<(), SnapshotError> {
    let next = ids.peek(namespace);
    if id < FIRST_ID || id >= next {
        return Err(SnapshotError::IdOutOfRange { namespace, id, next });
    }
    Ok(())
}

fn check_species(
    registry: &Registry,
    kind: RecordKind,
    id: u64,
    species: SpeciesId,
) -> Result<(), SnapshotError> {
    if registry.species.contains(species) {
        Ok(())
    } else {
        Err(SnapshotError::DanglingSpecies { kind, id, species })
    }
}
