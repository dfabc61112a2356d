//! Shared type definitions for the Seedbank conservation registry.
//!
//! This crate is the single source of truth for all types exchanged between
//! the registry state machine and its hosts. Types flow downstream to
//! `TypeScript` via `ts-rs` for curator dashboards.
//!
//! # Modules
//!
//! - [`ids`] -- Sequential `u64` identifier wrappers and the caller
//!   [`Principal`]
//! - [`structs`] -- Entity records and creation parameters
//! - [`operations`] -- Operation names, typed operations and the
//!   `{ success, value | error }` response envelope

pub mod ids;
pub mod operations;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use ids::{Principal, PropagationEventId, SampleId, SpeciesId};
pub use operations::{
    CallError, CallResponse, ErrorKind, MutatingOperation, OperationName, OperationValue,
    ReadOperation, UnknownOperationName,
};
pub use structs::{
    DiversityMetrics, GeneticSample, GrowingConditions, NewSpecies, PropagationEvent,
    PropagationParams, SampleParams, Species,
};
