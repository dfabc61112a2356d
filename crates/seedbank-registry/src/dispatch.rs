//! Wire-level dispatch: operation name plus positional arguments in, the
//! `{ success, value | error }` envelope out.
//!
//! The name is resolved to an [`OperationName`] and the arguments decoded
//! into a typed [`MutatingOperation`] or [`ReadOperation`] before the
//! registry is touched. A name outside the closed set, or a name used
//! through the wrong call shape, is an unknown operation.
//!
//! # Legacy error codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 1 | Update path target not found (status, conditions, viability) |
//! | 2 | Referenced species not registered (add/record/register paths) |
//! | 3 | Read target not found |
//! | 4 | Missing or mistyped arguments |
//! | 5 | Unknown operation |
//! | 6 | Identifier space or counter exhausted |
//! | 7 | Internal failure (result encoding, persistence in a host) |

use chrono::{DateTime, Utc};
use serde_json::Value;

use seedbank_types::{
    CallError, CallResponse, ErrorKind, GrowingConditions, MutatingOperation, NewSpecies,
    OperationName, Principal, PropagationEventId, PropagationParams, ReadOperation, SampleId,
    SampleParams, SpeciesId,
};

use crate::error::RegistryError;
use crate::registry::Registry;

/// Code for a not-found target on an update path.
pub const CODE_UPDATE_NOT_FOUND: u32 = 1;
/// Code for an unregistered species referenced by a new dependent record.
pub const CODE_SPECIES_NOT_FOUND: u32 = 2;
/// Code for a not-found read target.
pub const CODE_READ_NOT_FOUND: u32 = 3;
/// Code for missing or mistyped arguments.
pub const CODE_INVALID_ARGUMENTS: u32 = 4;
/// Code for an unrecognized operation name.
pub const CODE_UNKNOWN_OPERATION: u32 = 5;
/// Code for identifier or counter exhaustion.
pub const CODE_EXHAUSTED: u32 = 6;
/// Code for a failure that is not the caller's fault.
pub const CODE_INTERNAL: u32 = 7;

/// Errors produced at the dispatch boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The name is not an operation of the requested call shape.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// The arguments did not decode.
    #[error("invalid arguments for {operation}: {reason}")]
    InvalidArguments {
        /// The operation being decoded.
        operation: OperationName,
        /// What was wrong.
        reason: String,
    },

    /// The registry rejected the decoded operation.
    #[error("{operation} failed: {source}")]
    Registry {
        /// The operation that failed.
        operation: OperationName,
        /// The registry error.
        source: RegistryError,
    },

    /// The operation ran but its result could not be encoded.
    #[error("{operation} result could not be encoded: {reason}")]
    Encoding {
        /// The operation whose result failed to encode.
        operation: OperationName,
        /// The serializer's message.
        reason: String,
    },
}

impl DispatchError {
    /// Convert into the envelope's error payload, assigning the legacy code
    /// of the failing operation.
    pub fn to_call_error(&self) -> CallError {
        let (kind, code) = match self {
            Self::UnknownOperation(_) => (ErrorKind::UnknownOperation, CODE_UNKNOWN_OPERATION),
            Self::InvalidArguments { .. } => (ErrorKind::InvalidArguments, CODE_INVALID_ARGUMENTS),
            Self::Registry { operation, source } => registry_error_code(*operation, source),
            Self::Encoding { .. } => (ErrorKind::Internal, CODE_INTERNAL),
        };
        CallError {
            kind,
            code,
            message: self.to_string(),
        }
    }
}

/// Classify a registry error raised by `operation` and assign its legacy
/// numeric code.
pub const fn registry_error_code(
    operation: OperationName,
    error: &RegistryError,
) -> (ErrorKind, u32) {
    let kind = match error {
        RegistryError::NotFound { .. } => ErrorKind::NotFound,
        RegistryError::SpeciesNotFound(_) => ErrorKind::SpeciesNotFound,
        RegistryError::IdentifierExhausted(_) | RegistryError::ArithmeticOverflow { .. } => {
            return (ErrorKind::Exhausted, CODE_EXHAUSTED);
        }
    };
    let code = match operation {
        OperationName::UpdateConservationStatus
        | OperationName::UpdateGrowingConditions
        | OperationName::UpdateViabilityStatus => CODE_UPDATE_NOT_FOUND,
        OperationName::RegisterSpecies
        | OperationName::AddGrowingConditions
        | OperationName::RecordPropagation
        | OperationName::RegisterGeneticSample => CODE_SPECIES_NOT_FOUND,
        OperationName::GetSpecies
        | OperationName::GetGrowingConditions
        | OperationName::GetPropagationEvent
        | OperationName::GetGeneticSample
        | OperationName::GetSpeciesDiversity => CODE_READ_NOT_FOUND,
    };
    (kind, code)
}

// ---------------------------------------------------------------------------
// Argument decoding
// ---------------------------------------------------------------------------

/// Positional argument cursor for one operation.
struct Args<'a> {
    operation: OperationName,
    values: &'a [Value],
    position: usize,
}

impl<'a> Args<'a> {
    const fn new(operation: OperationName, values: &'a [Value]) -> Self {
        Self {
            operation,
            values,
            position: 0,
        }
    }

    fn invalid(&self, reason: String) -> DispatchError {
        DispatchError::InvalidArguments {
            operation: self.operation,
            reason,
        }
    }

    fn next(&mut self, what: &str) -> Result<&'a Value, DispatchError> {
        let index = self.position;
        let value = self
            .values
            .get(index)
            .ok_or_else(|| self.invalid(format!("missing argument {index} ({what})")))?;
        self.position = index.saturating_add(1);
        Ok(value)
    }

    fn string(&mut self, what: &str) -> Result<String, DispatchError> {
        let index = self.position;
        let value = self.next(what)?;
        value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| self.invalid(format!("argument {index} ({what}) must be a string")))
    }

    fn uint(&mut self, what: &str) -> Result<u64, DispatchError> {
        let index = self.position;
        let value = self.next(what)?;
        value.as_u64().ok_or_else(|| {
            self.invalid(format!(
                "argument {index} ({what}) must be a non-negative integer"
            ))
        })
    }

    fn uint32(&mut self, what: &str) -> Result<u32, DispatchError> {
        let index = self.position;
        let raw = self.uint(what)?;
        u32::try_from(raw)
            .map_err(|_err| self.invalid(format!("argument {index} ({what}) out of range: {raw}")))
    }

    fn species_id(&mut self) -> Result<SpeciesId, DispatchError> {
        self.uint("species id").map(SpeciesId::new)
    }

    /// Reject trailing arguments.
    fn finish(&self) -> Result<(), DispatchError> {
        if self.values.len() > self.position {
            return Err(self.invalid(format!(
                "expected {} arguments, got {}",
                self.position,
                self.values.len()
            )));
        }
        Ok(())
    }

    fn growing_conditions(&mut self) -> Result<GrowingConditions, DispatchError> {
        Ok(GrowingConditions {
            species_id: self.species_id()?,
            light_requirements: self.string("light requirements")?,
            temperature_range: self.string("temperature range")?,
            humidity_level: self.string("humidity level")?,
            soil_type: self.string("soil type")?,
            watering_frequency: self.string("watering frequency")?,
            notes: self.string("notes")?,
        })
    }
}

fn resolve(name: &str, mutating: bool) -> Result<OperationName, DispatchError> {
    name.parse::<OperationName>()
        .ok()
        .filter(|op| op.is_mutating() == mutating)
        .ok_or_else(|| DispatchError::UnknownOperation(name.to_owned()))
}

/// Decode a mutating call from its wire name and positional arguments.
///
/// # Errors
///
/// Returns [`DispatchError::UnknownOperation`] for a name that is not a
/// mutating operation and [`DispatchError::InvalidArguments`] for bad
/// arguments.
pub fn decode_mutating(name: &str, values: &[Value]) -> Result<MutatingOperation, DispatchError> {
    let operation = resolve(name, true)?;
    let mut args = Args::new(operation, values);

    let decoded = match operation {
        OperationName::RegisterSpecies => MutatingOperation::RegisterSpecies(NewSpecies {
            scientific_name: args.string("scientific name")?,
            common_name: args.string("common name")?,
            conservation_status: args.string("conservation status")?,
        }),
        OperationName::UpdateConservationStatus => MutatingOperation::UpdateConservationStatus {
            species_id: args.species_id()?,
            status: args.string("conservation status")?,
        },
        OperationName::AddGrowingConditions => {
            MutatingOperation::AddGrowingConditions(args.growing_conditions()?)
        }
        OperationName::UpdateGrowingConditions => {
            MutatingOperation::UpdateGrowingConditions(args.growing_conditions()?)
        }
        OperationName::RecordPropagation => MutatingOperation::RecordPropagation(PropagationParams {
            species_id: args.species_id()?,
            propagation_type: args.string("propagation type")?,
            quantity: args.uint("quantity")?,
            location: args.string("location")?,
            success_rate: args.uint32("success rate")?,
            notes: args.string("notes")?,
        }),
        OperationName::RegisterGeneticSample => {
            MutatingOperation::RegisterGeneticSample(SampleParams {
                species_id: args.species_id()?,
                source_location: args.string("source location")?,
                genetic_markers: args.string("genetic markers")?,
                storage_location: args.string("storage location")?,
                viability_status: args.string("viability status")?,
            })
        }
        OperationName::UpdateViabilityStatus => MutatingOperation::UpdateViabilityStatus {
            sample_id: SampleId::new(args.uint("sample id")?),
            status: args.string("viability status")?,
        },
        OperationName::GetSpecies
        | OperationName::GetGrowingConditions
        | OperationName::GetPropagationEvent
        | OperationName::GetGeneticSample
        | OperationName::GetSpeciesDiversity => {
            return Err(DispatchError::UnknownOperation(name.to_owned()));
        }
    };

    args.finish()?;
    Ok(decoded)
}

/// Decode a read call from its wire name and positional arguments.
///
/// # Errors
///
/// Returns [`DispatchError::UnknownOperation`] for a name that is not a read
/// operation and [`DispatchError::InvalidArguments`] for bad arguments.
pub fn decode_read(name: &str, values: &[Value]) -> Result<ReadOperation, DispatchError> {
    let operation = resolve(name, false)?;
    let mut args = Args::new(operation, values);

    let decoded = match operation {
        OperationName::GetSpecies => ReadOperation::GetSpecies(args.species_id()?),
        OperationName::GetGrowingConditions => {
            ReadOperation::GetGrowingConditions(args.species_id()?)
        }
        OperationName::GetPropagationEvent => {
            ReadOperation::GetPropagationEvent(PropagationEventId::new(args.uint("event id")?))
        }
        OperationName::GetGeneticSample => {
            ReadOperation::GetGeneticSample(SampleId::new(args.uint("sample id")?))
        }
        OperationName::GetSpeciesDiversity => {
            ReadOperation::GetSpeciesDiversity(args.species_id()?)
        }
        OperationName::RegisterSpecies
        | OperationName::UpdateConservationStatus
        | OperationName::AddGrowingConditions
        | OperationName::UpdateGrowingConditions
        | OperationName::RecordPropagation
        | OperationName::RegisterGeneticSample
        | OperationName::UpdateViabilityStatus => {
            return Err(DispatchError::UnknownOperation(name.to_owned()));
        }
    };

    args.finish()?;
    Ok(decoded)
}

// ---------------------------------------------------------------------------
// Envelope-producing entry points
// ---------------------------------------------------------------------------

fn respond(result: Result<serde_json::Value, DispatchError>) -> CallResponse {
    match result {
        Ok(value) => CallResponse::ok(value),
        Err(error) => CallResponse::err(error.to_call_error()),
    }
}

fn encode(
    operation: OperationName,
    value: seedbank_types::OperationValue,
) -> Result<serde_json::Value, DispatchError> {
    value.into_json().map_err(|error| DispatchError::Encoding {
        operation,
        reason: error.to_string(),
    })
}

impl Registry {
    /// Decode and run a mutating call, returning the typed outcome.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] for unknown names, bad arguments or a
    /// rejected operation.
    pub fn try_call(
        &mut self,
        name: &str,
        args: &[Value],
        caller: Principal,
        now: DateTime<Utc>,
    ) -> Result<serde_json::Value, DispatchError> {
        let operation = decode_mutating(name, args)?;
        let op_name = operation.name();
        let value = self
            .execute(operation, caller, now)
            .map_err(|source| DispatchError::Registry {
                operation: op_name,
                source,
            })?;
        encode(op_name, value)
    }

    /// Decode and run a read call, returning the typed outcome.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] for unknown names, bad arguments or a
    /// missing target.
    pub fn try_read(&self, name: &str, args: &[Value]) -> Result<serde_json::Value, DispatchError> {
        let operation = decode_read(name, args)?;
        let value = self
            .query(operation)
            .map_err(|source| DispatchError::Registry {
                operation: operation.name(),
                source,
            })?;
        encode(operation.name(), value)
    }

    /// Mutating call shape: name + arguments + caller + time in, envelope
    /// out.
    pub fn call(
        &mut self,
        name: &str,
        args: &[Value],
        caller: Principal,
        now: DateTime<Utc>,
    ) -> CallResponse {
        let result = self.try_call(name, args, caller, now);
        if let Err(error) = &result {
            tracing::debug!(operation = name, %error, "Call rejected");
        }
        respond(result)
    }

    /// Read-only call shape: name + arguments in, envelope out.
    pub fn read(&self, name: &str, args: &[Value]) -> CallResponse {
        respond(self.try_read(name, args))
    }
}
