//! Registry state machine for the Seedbank conservation registry.
//!
//! Tracks species, their growing conditions, propagation events and banked
//! genetic samples, and derives a per-species diversity index from the
//! samples. Execution is strictly serial: each call runs to completion, and a
//! call that fails has changed nothing.
//!
//! # Architecture
//!
//! ```text
//!  wire name + args ──► dispatch ──► MutatingOperation / ReadOperation
//!                                           │
//!                                      Registry
//!        ┌──────────────┬──────────────┬────┴─────────┬──────────────┐
//!   SpeciesStore  GrowingConditions  PropagationLog  GeneticSample  DiversityIndex
//!        ▲              Store                          Store            ▲
//!        └── existence checks for every dependent ──┘   └── recompute ─┘
//!
//!                      IdAllocator (species / event / sample)
//! ```
//!
//! # Modules
//!
//! - [`allocator`] -- Sequential identifier counters
//! - [`species`] -- Species records
//! - [`conditions`] -- Growing conditions, one per species
//! - [`propagation`] -- Append-only propagation log
//! - [`samples`] -- Genetic samples
//! - [`diversity`] -- Diversity metrics and the index formula
//! - [`registry`] -- [`Registry`], the state container tying them together
//! - [`dispatch`] -- Wire-name decoding and the response envelope
//! - [`snapshot`] -- Snapshots and invariant-checked restore
//! - [`kv`] -- Key-value persistence seam
//! - [`error`] -- Registry error types
//!
//! # Usage
//!
//! ```
//! use chrono::Utc;
//! use seedbank_registry::Registry;
//! use seedbank_types::{NewSpecies, Principal, SampleParams, SpeciesId};
//!
//! let mut registry = Registry::new();
//! let curator = Principal::new("curator");
//!
//! let species = registry
//!     .register_species(
//!         NewSpecies {
//!             scientific_name: "Amorphophallus titanum".to_owned(),
//!             common_name: "Corpse Flower".to_owned(),
//!             conservation_status: "Endangered".to_owned(),
//!         },
//!         curator.clone(),
//!         Utc::now(),
//!     )
//!     .ok();
//! assert_eq!(species, Some(SpeciesId::new(1)));
//!
//! let sample = SampleParams {
//!     species_id: SpeciesId::new(1),
//!     source_location: "Sumatra".to_owned(),
//!     genetic_markers: "ITS2".to_owned(),
//!     storage_location: "Vault A".to_owned(),
//!     viability_status: "Viable".to_owned(),
//! };
//! registry.register_genetic_sample(sample.clone(), curator.clone(), Utc::now()).ok();
//! registry.register_genetic_sample(sample, curator, Utc::now()).ok();
//!
//! let count = registry.species_diversity(SpeciesId::new(1)).map(|m| m.sample_count);
//! assert_eq!(count, Ok(2));
//! ```

pub mod allocator;
pub mod conditions;
pub mod dispatch;
pub mod diversity;
pub mod error;
pub mod kv;
pub mod propagation;
pub mod registry;
pub mod samples;
pub mod snapshot;
pub mod species;

// Re-export primary types at crate root.
pub use allocator::{IdAllocator, IdNamespace};
pub use conditions::Upsert;
pub use dispatch::{DispatchError, decode_mutating, decode_read};
pub use diversity::diversity_index;
pub use error::{RecordKind, RegistryError};
pub use kv::{
    KeyValueStore, MemoryStore, PersistError, SNAPSHOT_KEY, StoreError, load_registry,
    save_registry,
};
pub use registry::Registry;
pub use snapshot::{RegistrySnapshot, SnapshotError};
