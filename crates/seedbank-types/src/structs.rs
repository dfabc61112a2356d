//! Entity records held by the registry and the parameter structs used to
//! create them.
//!
//! Records are immutable once written except where a field is documented as
//! mutable. Parameter structs carry exactly the caller-supplied fields; the
//! registry adds identifiers, timestamps and caller identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{Principal, PropagationEventId, SampleId, SpeciesId};

// ---------------------------------------------------------------------------
// Species
// ---------------------------------------------------------------------------

/// Canonical record of a registered species. Root of every other entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Species {
    /// Allocated identifier.
    pub id: SpeciesId,
    /// Binomial name, e.g. "Amorphophallus titanum".
    pub scientific_name: String,
    /// Vernacular name, e.g. "Corpse Flower".
    pub common_name: String,
    /// Current conservation status. The only mutable field.
    pub conservation_status: String,
    /// When the species was registered.
    pub registered_at: DateTime<Utc>,
    /// Who registered the species.
    pub registered_by: Principal,
}

/// Caller-supplied fields of a species registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NewSpecies {
    /// Binomial name.
    pub scientific_name: String,
    /// Vernacular name.
    pub common_name: String,
    /// Initial conservation status.
    pub conservation_status: String,
}

// ---------------------------------------------------------------------------
// Growing conditions
// ---------------------------------------------------------------------------

/// Cultivation requirements for one species.
///
/// Keyed by the species identifier and always written as a whole; there is
/// no partial-field update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GrowingConditions {
    /// The species these conditions describe.
    pub species_id: SpeciesId,
    /// Light exposure, e.g. "Partial shade".
    pub light_requirements: String,
    /// Tolerated temperature band, e.g. "24-32C".
    pub temperature_range: String,
    /// Relative humidity, e.g. "High".
    pub humidity_level: String,
    /// Substrate description.
    pub soil_type: String,
    /// Watering schedule.
    pub watering_frequency: String,
    /// Free-form additional notes.
    pub notes: String,
}

// ---------------------------------------------------------------------------
// Propagation
// ---------------------------------------------------------------------------

/// One entry of the append-only propagation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PropagationEvent {
    /// Allocated identifier, global across species.
    pub id: PropagationEventId,
    /// The propagated species.
    pub species_id: SpeciesId,
    /// Method, e.g. "seed", "cutting", "tissue culture".
    pub propagation_type: String,
    /// Number of propagules, accepted as given.
    pub quantity: u64,
    /// Where the propagation took place.
    pub location: String,
    /// When the event was recorded.
    pub conducted_at: DateTime<Utc>,
    /// Who conducted the propagation.
    pub conducted_by: Principal,
    /// Success rate in percent, accepted as given.
    pub success_rate: u32,
    /// Free-form notes.
    pub notes: String,
}

/// Caller-supplied fields of a propagation event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PropagationParams {
    /// The propagated species. Must already be registered.
    pub species_id: SpeciesId,
    /// Propagation method.
    pub propagation_type: String,
    /// Number of propagules.
    pub quantity: u64,
    /// Where the propagation took place.
    pub location: String,
    /// Success rate in percent.
    pub success_rate: u32,
    /// Free-form notes.
    pub notes: String,
}

// ---------------------------------------------------------------------------
// Genetic samples
// ---------------------------------------------------------------------------

/// A banked genetic sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GeneticSample {
    /// Allocated identifier, global across species.
    pub id: SampleId,
    /// The sampled species.
    pub species_id: SpeciesId,
    /// Where the material was collected.
    pub source_location: String,
    /// When the sample was registered.
    pub collected_at: DateTime<Utc>,
    /// Marker panel or sequence summary.
    pub genetic_markers: String,
    /// Custodian responsible for the sample.
    pub stored_by: Principal,
    /// Freezer, vault or herbarium location.
    pub storage_location: String,
    /// Current viability, e.g. "Viable". The only mutable field.
    pub viability_status: String,
}

/// Caller-supplied fields of a genetic sample registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SampleParams {
    /// The sampled species. Must already be registered.
    pub species_id: SpeciesId,
    /// Where the material was collected.
    pub source_location: String,
    /// Marker panel or sequence summary.
    pub genetic_markers: String,
    /// Storage location.
    pub storage_location: String,
    /// Initial viability.
    pub viability_status: String,
}

// ---------------------------------------------------------------------------
// Diversity
// ---------------------------------------------------------------------------

/// Derived genetic diversity metrics for one species.
///
/// Never authored directly: created by the first sample registered for the
/// species and recomputed on every subsequent one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DiversityMetrics {
    /// The species these metrics describe.
    pub species_id: SpeciesId,
    /// Number of samples registered for the species.
    pub sample_count: u64,
    /// Derived diversity index.
    pub diversity_index: f64,
    /// When the metrics were last recomputed.
    pub last_updated: DateTime<Utc>,
}
