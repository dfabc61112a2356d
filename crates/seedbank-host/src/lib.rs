//! Reference host for the Seedbank conservation registry.
//!
//! Wraps a [`Registry`](seedbank_registry::Registry) in a
//! [`RegistryService`] that serializes concurrent callers, stamps mutations
//! with the current time, optionally deduplicates retried requests and
//! saves a snapshot after every successful mutation. The binary serves the
//! service over newline-delimited JSON on stdin/stdout.
//!
//! # Modules
//!
//! - [`config`] -- YAML configuration and environment overrides
//! - [`clock`] -- Time sources
//! - [`dedup`] -- Mutation response cache keyed by request id and operation
//! - [`file_store`] -- Directory-backed snapshot store
//! - [`request`] -- Wire request format
//! - [`service`] -- The locked, shared registry
//! - [`startup`] -- Config loading, registry restore and service assembly
//! - [`transport`] -- NDJSON request loop
//! - [`error`] -- Host error type

pub mod clock;
pub mod config;
pub mod dedup;
pub mod error;
pub mod file_store;
pub mod request;
pub mod service;
pub mod startup;
pub mod transport;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, HostConfig};
pub use dedup::DedupCache;
pub use error::HostError;
pub use file_store::FileStore;
pub use request::WireRequest;
pub use service::{BoxedStore, RegistryService};
pub use transport::{ServeStats, serve};
