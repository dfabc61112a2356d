//! The propagation log: an append-only record of propagation events.
//!
//! Event identifiers are global across species. Entries are never modified
//! or deleted. Quantity and success rate are stored as given; bounds are a
//! policy for the caller to impose.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use seedbank_types::{Principal, PropagationEvent, PropagationEventId, PropagationParams, SpeciesId};

use crate::allocator::IdAllocator;
use crate::error::{RecordKind, RegistryError};
use crate::species::SpeciesStore;

/// Propagation events keyed by identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropagationLog {
    events: BTreeMap<PropagationEventId, PropagationEvent>,
}

impl PropagationLog {
    /// Create an empty log.
    pub const fn new() -> Self {
        Self {
            events: BTreeMap::new(),
        }
    }

    /// Append an event for a registered species and return its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::SpeciesNotFound`] if the species is not
    /// registered. No identifier is consumed in that case.
    pub fn record(
        &mut self,
        ids: &mut IdAllocator,
        species: &SpeciesStore,
        params: PropagationParams,
        caller: Principal,
        now: DateTime<Utc>,
    ) -> Result<PropagationEventId, RegistryError> {
        species.ensure_registered(params.species_id)?;

        let id = ids.next_propagation_event()?;
        self.events.insert(
            id,
            PropagationEvent {
                id,
                species_id: params.species_id,
                propagation_type: params.propagation_type,
                quantity: params.quantity,
                location: params.location,
                conducted_at: now,
                conducted_by: caller,
                success_rate: params.success_rate,
                notes: params.notes,
            },
        );
        tracing::debug!(
            event_id = %id,
            species_id = %params.species_id,
            quantity = params.quantity,
            "Recorded propagation event"
        );
        Ok(id)
    }

    /// Look up an event.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if no event has this id.
    pub fn get(&self, id: PropagationEventId) -> Result<&PropagationEvent, RegistryError> {
        self.events
            .get(&id)
            .ok_or_else(|| RegistryError::not_found(RecordKind::PropagationEvent, id))
    }

    /// Events for one species, in id order.
    pub fn events_for_species(
        &self,
        species_id: SpeciesId,
    ) -> impl Iterator<Item = &PropagationEvent> {
        self.events
            .values()
            .filter(move |event| event.species_id == species_id)
    }

    /// Insert an event verbatim (snapshot restore). Returns `false` if the
    /// id was already present.
    pub(crate) fn restore(&mut self, event: PropagationEvent) -> bool {
        self.events.insert(event.id, event).is_none()
    }

    /// All events in id order.
    pub fn iter(&self) -> impl Iterator<Item = &PropagationEvent> {
        self.events.values()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
