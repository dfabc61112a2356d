//! Operation and response types for the registry's dispatch boundary.
//!
//! Callers name operations with the kebab-case wire names below. The wire
//! name is resolved once into [`OperationName`]; arguments are then decoded
//! into a [`MutatingOperation`] or [`ReadOperation`] variant carrying its
//! strongly-typed payload. Only names outside this closed set are reported
//! as unknown.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{PropagationEventId, SampleId, SpeciesId};
use crate::structs::{
    DiversityMetrics, GeneticSample, GrowingConditions, NewSpecies, PropagationEvent,
    PropagationParams, SampleParams, Species,
};

// ---------------------------------------------------------------------------
// Operation names
// ---------------------------------------------------------------------------

/// Every operation the registry recognizes, by wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export, export_to = "bindings/")]
pub enum OperationName {
    /// `register-species`
    RegisterSpecies,
    /// `update-conservation-status`
    UpdateConservationStatus,
    /// `add-growing-conditions`
    AddGrowingConditions,
    /// `update-growing-conditions`
    UpdateGrowingConditions,
    /// `record-propagation`
    RecordPropagation,
    /// `register-genetic-sample`
    RegisterGeneticSample,
    /// `update-viability-status`
    UpdateViabilityStatus,
    /// `get-species`
    GetSpecies,
    /// `get-growing-conditions`
    GetGrowingConditions,
    /// `get-propagation-event`
    GetPropagationEvent,
    /// `get-genetic-sample`
    GetGeneticSample,
    /// `get-species-diversity`
    GetSpeciesDiversity,
}

impl OperationName {
    /// All operation names, mutating ones first.
    pub const ALL: [Self; 12] = [
        Self::RegisterSpecies,
        Self::UpdateConservationStatus,
        Self::AddGrowingConditions,
        Self::UpdateGrowingConditions,
        Self::RecordPropagation,
        Self::RegisterGeneticSample,
        Self::UpdateViabilityStatus,
        Self::GetSpecies,
        Self::GetGrowingConditions,
        Self::GetPropagationEvent,
        Self::GetGeneticSample,
        Self::GetSpeciesDiversity,
    ];

    /// The kebab-case wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RegisterSpecies => "register-species",
            Self::UpdateConservationStatus => "update-conservation-status",
            Self::AddGrowingConditions => "add-growing-conditions",
            Self::UpdateGrowingConditions => "update-growing-conditions",
            Self::RecordPropagation => "record-propagation",
            Self::RegisterGeneticSample => "register-genetic-sample",
            Self::UpdateViabilityStatus => "update-viability-status",
            Self::GetSpecies => "get-species",
            Self::GetGrowingConditions => "get-growing-conditions",
            Self::GetPropagationEvent => "get-propagation-event",
            Self::GetGeneticSample => "get-genetic-sample",
            Self::GetSpeciesDiversity => "get-species-diversity",
        }
    }

    /// Whether the operation writes state (and therefore needs a caller
    /// identity and a timestamp).
    pub const fn is_mutating(self) -> bool {
        matches!(
            self,
            Self::RegisterSpecies
                | Self::UpdateConservationStatus
                | Self::AddGrowingConditions
                | Self::UpdateGrowingConditions
                | Self::RecordPropagation
                | Self::RegisterGeneticSample
                | Self::UpdateViabilityStatus
        )
    }
}

impl core::fmt::Display for OperationName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a wire name is not one of [`OperationName::ALL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOperationName(pub String);

impl core::fmt::Display for UnknownOperationName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "unknown operation: {}", self.0)
    }
}

impl std::error::Error for UnknownOperationName {}

impl core::str::FromStr for OperationName {
    type Err = UnknownOperationName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| UnknownOperationName(s.to_owned()))
    }
}

// ---------------------------------------------------------------------------
// Typed operations
// ---------------------------------------------------------------------------

/// A state-changing call with its decoded arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum MutatingOperation {
    /// Register a new species.
    RegisterSpecies(NewSpecies),
    /// Overwrite a species' conservation status.
    UpdateConservationStatus {
        /// The species to update.
        species_id: SpeciesId,
        /// The new status.
        status: String,
    },
    /// Create or replace growing conditions (add path).
    AddGrowingConditions(GrowingConditions),
    /// Create or replace growing conditions (update path).
    UpdateGrowingConditions(GrowingConditions),
    /// Append a propagation event.
    RecordPropagation(PropagationParams),
    /// Register a genetic sample and recompute diversity.
    RegisterGeneticSample(SampleParams),
    /// Overwrite a sample's viability status.
    UpdateViabilityStatus {
        /// The sample to update.
        sample_id: SampleId,
        /// The new status.
        status: String,
    },
}

impl MutatingOperation {
    /// The wire name of this operation.
    pub const fn name(&self) -> OperationName {
        match self {
            Self::RegisterSpecies(_) => OperationName::RegisterSpecies,
            Self::UpdateConservationStatus { .. } => OperationName::UpdateConservationStatus,
            Self::AddGrowingConditions(_) => OperationName::AddGrowingConditions,
            Self::UpdateGrowingConditions(_) => OperationName::UpdateGrowingConditions,
            Self::RecordPropagation(_) => OperationName::RecordPropagation,
            Self::RegisterGeneticSample(_) => OperationName::RegisterGeneticSample,
            Self::UpdateViabilityStatus { .. } => OperationName::UpdateViabilityStatus,
        }
    }
}

/// A pure lookup with its decoded argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ReadOperation {
    /// Look up a species.
    GetSpecies(SpeciesId),
    /// Look up a species' growing conditions.
    GetGrowingConditions(SpeciesId),
    /// Look up a propagation event.
    GetPropagationEvent(PropagationEventId),
    /// Look up a genetic sample.
    GetGeneticSample(SampleId),
    /// Look up a species' diversity metrics.
    GetSpeciesDiversity(SpeciesId),
}

impl ReadOperation {
    /// The wire name of this operation.
    pub const fn name(self) -> OperationName {
        match self {
            Self::GetSpecies(_) => OperationName::GetSpecies,
            Self::GetGrowingConditions(_) => OperationName::GetGrowingConditions,
            Self::GetPropagationEvent(_) => OperationName::GetPropagationEvent,
            Self::GetGeneticSample(_) => OperationName::GetGeneticSample,
            Self::GetSpeciesDiversity(_) => OperationName::GetSpeciesDiversity,
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// The typed success value of an operation.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationValue {
    /// A newly allocated species identifier.
    SpeciesId(SpeciesId),
    /// A newly allocated propagation event identifier.
    PropagationEventId(PropagationEventId),
    /// A newly allocated sample identifier.
    SampleId(SampleId),
    /// An update or upsert completed.
    Updated,
    /// A species record.
    Species(Species),
    /// A growing conditions record.
    GrowingConditions(GrowingConditions),
    /// A propagation event record.
    PropagationEvent(PropagationEvent),
    /// A genetic sample record.
    GeneticSample(GeneticSample),
    /// Diversity metrics.
    Diversity(DiversityMetrics),
}

impl OperationValue {
    /// Encode as the `value` field of a [`CallResponse`].
    ///
    /// Identifiers become bare numbers, updates become `true` and records
    /// become JSON objects.
    pub fn into_json(self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::SpeciesId(id) => Ok(id.into_inner().into()),
            Self::PropagationEventId(id) => Ok(id.into_inner().into()),
            Self::SampleId(id) => Ok(id.into_inner().into()),
            Self::Updated => Ok(serde_json::Value::Bool(true)),
            Self::Species(record) => serde_json::to_value(record),
            Self::GrowingConditions(record) => serde_json::to_value(record),
            Self::PropagationEvent(record) => serde_json::to_value(record),
            Self::GeneticSample(record) => serde_json::to_value(record),
            Self::Diversity(record) => serde_json::to_value(record),
        }
    }
}

/// Classification of a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ErrorKind {
    /// The lookup target does not exist.
    NotFound,
    /// The species referenced by a dependent record does not exist.
    SpeciesNotFound,
    /// The operation name is not recognized for this call shape.
    UnknownOperation,
    /// Arguments were missing or had the wrong type.
    InvalidArguments,
    /// An identifier or counter reached its numeric limit.
    Exhausted,
    /// The host failed outside the state machine (e.g. persistence).
    Internal,
}

/// Error payload of a failed call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CallError {
    /// Error classification.
    pub kind: ErrorKind,
    /// Legacy numeric code, assigned per operation.
    pub code: u32,
    /// Human-readable description.
    pub message: String,
}

/// The `{ success, value | error }` envelope returned for every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CallResponse {
    /// Whether the call succeeded.
    pub success: bool,
    /// The success value, present when `success` is true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    /// The error, present when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<CallError>,
}

impl CallResponse {
    /// A successful response carrying `value`.
    pub const fn ok(value: serde_json::Value) -> Self {
        Self {
            success: true,
            value: Some(value),
            error: None,
        }
    }

    /// A failed response carrying `error`.
    pub const fn err(error: CallError) -> Self {
        Self {
            success: false,
            value: None,
            error: Some(error),
        }
    }
}
