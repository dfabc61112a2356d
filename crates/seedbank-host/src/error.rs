//! Error types for the registry host.
//!
//! [`HostError`] wraps every failure mode of host startup and the transport
//! loop. Failures of individual calls never surface here; they are answered
//! with an error envelope.

/// Top-level error for the registry host.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: crate::config::ConfigError,
    },

    /// The snapshot store could not be opened.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: seedbank_registry::StoreError,
    },

    /// Loading the persisted registry failed.
    #[error("persistence error: {source}")]
    Persist {
        /// The underlying persistence error.
        #[from]
        source: seedbank_registry::PersistError,
    },

    /// Reading requests or writing responses failed.
    #[error("transport I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// A response could not be encoded.
    #[error("response encoding error: {source}")]
    Encoding {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}
