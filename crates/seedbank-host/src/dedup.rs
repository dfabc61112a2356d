//! Bounded cache of mutation responses keyed by request id and operation.
//!
//! Registration calls are not idempotent, so a client retrying after a lost
//! response would register twice. Clients that attach a `request_id` get
//! the first response back on every retry instead. An id reused for a
//! different operation is a different key. The cache forgets the oldest
//! entries once it holds `capacity` responses.

use std::collections::{BTreeMap, VecDeque};

use seedbank_types::CallResponse;
use uuid::Uuid;

/// Cache key: the caller's request id plus the operation name it was
/// sent with.
pub type DedupKey = (Uuid, String);

/// Responses remembered by request key, evicted oldest first.
#[derive(Debug, Clone)]
pub struct DedupCache {
    capacity: usize,
    order: VecDeque<DedupKey>,
    responses: BTreeMap<DedupKey, CallResponse>,
}

impl DedupCache {
    /// Create a cache holding at most `capacity` responses. A capacity of
    /// zero remembers nothing.
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::new(),
            responses: BTreeMap::new(),
        }
    }

    /// The response previously stored for `request_id` sent as
    /// `operation`.
    pub fn get(&self, request_id: Uuid, operation: &str) -> Option<&CallResponse> {
        self.responses.get(&(request_id, operation.to_owned()))
    }

    /// Remember `response` for `request_id` sent as `operation`, evicting
    /// the oldest entries past capacity. A key already present keeps its
    /// first response.
    pub fn insert(&mut self, request_id: Uuid, operation: &str, response: CallResponse) {
        let key = (request_id, operation.to_owned());
        if self.capacity == 0 || self.responses.contains_key(&key) {
            return;
        }
        while self.order.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            tracing::trace!(request_id = %oldest.0, operation = %oldest.1, "Evicted cached response");
            self.responses.remove(&oldest);
        }
        self.order.push_back(key.clone());
        self.responses.insert(key, response);
    }

    /// Number of cached responses.
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    /// Maximum number of cached responses.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
