//! Type-safe identifier wrappers around sequential `u64` values.
//!
//! Every allocated entity in the registry has a strongly-typed ID to prevent
//! accidental mixing of identifiers at compile time. Identifiers are handed
//! out by the registry's allocator, start at 1 and are never reused.
//!
//! Growing conditions and diversity metrics are keyed by [`SpeciesId`] and
//! have no identifier of their own.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Generates a newtype wrapper around a `u64` sequence number with standard
/// derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[serde(transparent)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub u64);

        impl $name {
            /// Wrap a raw sequence number.
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Return the inner sequence number.
            pub const fn into_inner(self) -> u64 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Identifier of a registered species. Also keys the species' growing
    /// conditions and diversity metrics.
    SpeciesId
}

define_id! {
    /// Identifier of an entry in the propagation log.
    PropagationEventId
}

define_id! {
    /// Identifier of a genetic sample.
    SampleId
}

/// Opaque authenticated identity of the caller that performed a mutation.
///
/// The registry never interprets the value; authentication happens in the
/// surrounding host.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export, export_to = "bindings/")]
pub struct Principal(pub String);

impl Principal {
    /// Wrap an authenticated caller name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the caller name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Principal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
