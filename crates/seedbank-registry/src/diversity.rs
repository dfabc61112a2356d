//! Derived genetic diversity metrics, one record per sampled species.
//!
//! Metrics are never written by callers. Registering a genetic sample
//! recomputes the metrics of its species; the first sample creates them.
//! Recomputation is split into a pure [`DiversityIndex::recompute`] and a
//! [`DiversityIndex::commit`] so the registry can finish every fallible step
//! before it writes anything.
//!
//! # Index formula
//!
//! ```text
//! n <  2  =>  0
//! n >= 2  =>  2^(log2(n))
//! ```
//!
//! For `n >= 2` this is numerically `n` (up to rounding). The shape of the
//! computation is kept as-is because downstream consumers compare against
//! values produced by this exact floating-point path.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use seedbank_types::{DiversityMetrics, SpeciesId};

use crate::error::{RecordKind, RegistryError};

/// Minimum sample count for a non-zero diversity index.
pub const MIN_SAMPLES_FOR_INDEX: u64 = 2;

/// Diversity index for a species with `sample_count` samples.
pub fn diversity_index(sample_count: u64) -> f64 {
    if sample_count < MIN_SAMPLES_FOR_INDEX {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = sample_count as f64;
    2.0_f64.powf(n.log2())
}

/// Diversity metrics keyed by species.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiversityIndex {
    metrics: BTreeMap<SpeciesId, DiversityMetrics>,
}

impl DiversityIndex {
    /// Create an empty index.
    pub const fn new() -> Self {
        Self {
            metrics: BTreeMap::new(),
        }
    }

    /// Compute the metrics `species_id` will have once one more sample is
    /// registered. Does not modify the index.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ArithmeticOverflow`] if the sample count
    /// cannot be incremented.
    pub fn recompute(
        &self,
        species_id: SpeciesId,
        now: DateTime<Utc>,
    ) -> Result<DiversityMetrics, RegistryError> {
        let previous = self.metrics.get(&species_id).map_or(0, |m| m.sample_count);
        let sample_count = previous
            .checked_add(1)
            .ok_or(RegistryError::ArithmeticOverflow {
                context: "diversity sample count",
            })?;

        Ok(DiversityMetrics {
            species_id,
            sample_count,
            diversity_index: diversity_index(sample_count),
            last_updated: now,
        })
    }

    /// Store metrics produced by [`recompute`](Self::recompute), replacing
    /// any previous record for the species.
    pub fn commit(&mut self, metrics: DiversityMetrics) {
        tracing::debug!(
            species_id = %metrics.species_id,
            sample_count = metrics.sample_count,
            diversity_index = metrics.diversity_index,
            "Recomputed diversity"
        );
        self.metrics.insert(metrics.species_id, metrics);
    }

    /// Look up the metrics of a species.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if no sample was ever registered
    /// for the species.
    pub fn get(&self, species_id: SpeciesId) -> Result<&DiversityMetrics, RegistryError> {
        self.metrics
            .get(&species_id)
            .ok_or_else(|| RegistryError::not_found(RecordKind::DiversityMetrics, species_id))
    }

    /// Insert metrics verbatim (snapshot restore). Returns `false` if the
    /// species already had metrics.
    pub(crate) fn restore(&mut self, metrics: DiversityMetrics) -> bool {
        self.metrics.insert(metrics.species_id, metrics).is_none()
    }

    /// All metrics in species order.
    pub fn iter(&self) -> impl Iterator<Item = &DiversityMetrics> {
        self.metrics.values()
    }

    /// Number of species with metrics.
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Whether no species has metrics.
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}
