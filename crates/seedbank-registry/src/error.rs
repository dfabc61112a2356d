//! Error types for the registry state machine.
//!
//! Every failure is returned as a value. Existence checks run before any
//! write, so an operation that returns an error has not changed state.

use seedbank_types::SpeciesId;

use crate::allocator::IdNamespace;

/// The kind of record a lookup was aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordKind {
    /// A species record.
    Species,
    /// A growing conditions record.
    GrowingConditions,
    /// A propagation log entry.
    PropagationEvent,
    /// A genetic sample.
    GeneticSample,
    /// A species' diversity metrics.
    DiversityMetrics,
}

impl core::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Species => "species",
            Self::GrowingConditions => "growing conditions",
            Self::PropagationEvent => "propagation event",
            Self::GeneticSample => "genetic sample",
            Self::DiversityMetrics => "diversity metrics",
        })
    }
}

/// Errors returned by registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The lookup target does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// What was looked up.
        kind: RecordKind,
        /// The key that was looked up.
        id: u64,
    },

    /// A dependent record referenced a species that is not registered.
    #[error("referenced species not found: {0}")]
    SpeciesNotFound(SpeciesId),

    /// An identifier counter cannot advance any further.
    #[error("identifier space exhausted for {0}")]
    IdentifierExhausted(IdNamespace),

    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow in {context}")]
    ArithmeticOverflow {
        /// What was being computed.
        context: &'static str,
    },
}

impl RegistryError {
    /// Shorthand for a [`RegistryError::NotFound`].
    pub fn not_found(kind: RecordKind, id: impl Into<u64>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Whether this is a not-found-class error (either the target itself or
    /// the species it references is missing).
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::SpeciesNotFound(_))
    }
}
