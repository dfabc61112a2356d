//! The shared registry service.
//!
//! [`RegistryService`] owns the [`Registry`] behind one async mutex. The
//! lock is held for the whole of each call: dedup lookup, dispatch, the
//! snapshot write and the dedup insert. Concurrent callers therefore see
//! calls applied one at a time, in lock order.
//!
//! With a store attached, a mutation runs against a copy of the registry
//! and only replaces the live state once the snapshot is durable. A failed
//! write leaves both memory and disk at the previous state. The write runs
//! on the blocking pool, so a slow disk stalls registry callers but not the
//! runtime's worker threads.
//!
//! Each persisted mutation copies and re-encodes the whole registry, so its
//! cost grows linearly with the number of records. Reads and hosts without
//! a store pay neither.

use std::sync::Arc;

use seedbank_registry::dispatch::CODE_INTERNAL;
use seedbank_registry::{
    KeyValueStore, PersistError, Registry, RegistrySnapshot, StoreError, save_registry,
};
use seedbank_types::{CallError, CallResponse, ErrorKind, Principal};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use crate::clock::{Clock, SystemClock};
use crate::dedup::DedupCache;
use crate::request::WireRequest;

/// Legacy code for calls that succeeded in the registry but could not be
/// made durable.
pub const CODE_PERSISTENCE_FAILED: u32 = CODE_INTERNAL;

/// Store handle accepted by the service.
pub type BoxedStore = Box<dyn KeyValueStore + Send>;

/// Store handle moved onto the blocking pool for each write.
type SharedStore = Arc<std::sync::Mutex<BoxedStore>>;

/// State guarded by the service lock.
struct ServiceState {
    registry: Registry,
    store: Option<SharedStore>,
    dedup: Option<DedupCache>,
}

impl ServiceState {
    async fn execute(
        &mut self,
        operation: &str,
        args: &[Value],
        caller: Principal,
        clock: &dyn Clock,
    ) -> CallResponse {
        let now = clock.now();
        let Some(store) = self.store.as_ref().map(Arc::clone) else {
            return self.registry.call(operation, args, caller, now);
        };

        let mut next = self.registry.clone();
        let response = next.call(operation, args, caller, now);
        if !response.success {
            return response;
        }

        let saved = tokio::task::spawn_blocking(move || {
            let mut guard = store
                .lock()
                .map_err(|poisoned| StoreError::Backend(poisoned.to_string()))?;
            save_registry(&mut **guard, &next)?;
            Ok::<_, PersistError>(next)
        })
        .await;

        match saved {
            Ok(Ok(next)) => {
                self.registry = next;
                response
            }
            Ok(Err(e)) => {
                error!(operation, error = %e, "Failed to persist registry, call rolled back");
                internal_error(format!("persistence failed: {e}"))
            }
            Err(e) => {
                error!(operation, error = %e, "Persistence task aborted, call rolled back");
                internal_error(format!("persistence task failed: {e}"))
            }
        }
    }
}

fn internal_error(message: String) -> CallResponse {
    CallResponse::err(CallError {
        kind: ErrorKind::Internal,
        code: CODE_PERSISTENCE_FAILED,
        message,
    })
}

/// A registry shared between concurrent callers.
pub struct RegistryService {
    name: String,
    clock: Box<dyn Clock>,
    state: Mutex<ServiceState>,
}

impl std::fmt::Debug for RegistryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryService")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl RegistryService {
    /// Wrap `registry` with the system clock, no store and no dedup.
    pub fn new(registry: Registry) -> Self {
        Self {
            name: "seedbank".to_owned(),
            clock: Box::new(SystemClock),
            state: Mutex::new(ServiceState {
                registry,
                store: None,
                dedup: None,
            }),
        }
    }

    /// Set the label used in log lines.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Replace the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Save a snapshot to `store` after every successful mutation.
    #[must_use]
    pub fn with_store(mut self, store: BoxedStore) -> Self {
        self.state.get_mut().store = Some(Arc::new(std::sync::Mutex::new(store)));
        self
    }

    /// Remember up to `capacity` mutation responses by request id.
    #[must_use]
    pub fn with_dedup(mut self, capacity: usize) -> Self {
        self.state.get_mut().dedup = Some(DedupCache::new(capacity));
        self
    }

    /// The service label.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Execute one request.
    ///
    /// A request with a caller is dispatched as a mutation, one without as
    /// a read. A mutation whose request id was already answered for the
    /// same operation returns the cached response without touching the
    /// registry. Reads are never cached.
    pub async fn handle(&self, request: WireRequest) -> CallResponse {
        let WireRequest {
            request_id,
            operation,
            args,
            caller,
        } = request;

        let mut state = self.state.lock().await;

        let Some(caller) = caller else {
            let response = state.registry.read(&operation, &args);
            self.log_rejection(&operation, &response);
            return response;
        };

        let cached = request_id.and_then(|id| state.dedup.as_ref()?.get(id, &operation));
        if let Some(cached) = cached {
            debug!(
                registry = %self.name,
                request_id = ?request_id,
                operation = %operation,
                "Replaying cached response"
            );
            return cached.clone();
        }

        let response = state
            .execute(&operation, &args, caller, self.clock.as_ref())
            .await;
        self.log_rejection(&operation, &response);

        // Persistence failures are transient; a retry must run again.
        let replayable = response
            .error
            .as_ref()
            .is_none_or(|e| e.kind != ErrorKind::Internal);
        if let (Some(id), Some(cache), true) = (request_id, state.dedup.as_mut(), replayable) {
            cache.insert(id, &operation, response.clone());
        }
        response
    }

    fn log_rejection(&self, operation: &str, response: &CallResponse) {
        if let Some(error) = &response.error {
            warn!(
                registry = %self.name,
                operation,
                code = error.code,
                kind = ?error.kind,
                message = %error.message,
                "Call rejected"
            );
        }
    }

    /// A snapshot of the current registry state.
    pub async fn snapshot(&self) -> RegistrySnapshot {
        self.state.lock().await.registry.snapshot()
    }

    /// Run `f` against the current registry while holding the lock.
    pub async fn inspect<R>(&self, f: impl FnOnce(&Registry) -> R) -> R {
        let state = self.state.lock().await;
        f(&state.registry)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use seedbank_registry::MemoryStore;
    use seedbank_types::SpeciesId;
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::clock::FixedClock;

    fn service() -> RegistryService {
        let start = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap_or_default();
        RegistryService::new(Registry::new())
            .with_clock(FixedClock::new(start))
            .with_dedup(8)
    }

    fn register_titan() -> WireRequest {
        WireRequest::mutating(
            "register-species",
            vec![json!("Amorphophallus titanum"), json!("Corpse Flower"), json!("Endangered")],
            Principal::new("curator"),
        )
    }

    #[tokio::test]
    async fn caller_selects_mutating_shape() {
        let service = service();
        assert_eq!(service.handle(register_titan()).await, CallResponse::ok(json!(1)));

        // Same name without a caller goes through the read shape.
        let mut as_read = register_titan();
        as_read.caller = None;
        let response = service.handle(as_read).await;
        assert_eq!(response.error.map(|e| e.kind), Some(ErrorKind::UnknownOperation));
    }

    #[tokio::test]
    async fn repeated_request_id_is_replayed() {
        let service = service();
        let id = Uuid::new_v4();
        let first = service.handle(register_titan().with_request_id(id)).await;
        let second = service.handle(register_titan().with_request_id(id)).await;
        assert_eq!(first, second);
        assert_eq!(service.inspect(Registry::species_count).await, 1);
    }

    #[tokio::test]
    async fn reads_with_a_request_id_are_not_cached() {
        let service = service();
        let id = Uuid::new_v4();
        let get = WireRequest::read("get-species", vec![json!(1)]).with_request_id(id);

        let before = service.handle(get.clone()).await;
        assert_eq!(before.error.map(|e| e.kind), Some(ErrorKind::NotFound));

        service.handle(register_titan()).await;
        let after = service.handle(get).await;
        assert!(after.success);
    }

    #[tokio::test]
    async fn reused_id_for_another_operation_executes() {
        let service = service();
        let id = Uuid::new_v4();
        service.handle(register_titan().with_request_id(id)).await;

        let status = WireRequest::mutating(
            "update-conservation-status",
            vec![json!(1), json!("Critically Endangered")],
            Principal::new("curator"),
        )
        .with_request_id(id);
        assert_eq!(service.handle(status).await, CallResponse::ok(json!(true)));

        let status = service
            .inspect(|r| {
                r.species(SpeciesId::new(1))
                    .map(|s| s.conservation_status.clone())
            })
            .await;
        assert_eq!(status.ok().as_deref(), Some("Critically Endangered"));
    }

    #[tokio::test]
    async fn without_dedup_every_request_executes() {
        let service = RegistryService::new(Registry::new());
        let id = Uuid::new_v4();
        service.handle(register_titan().with_request_id(id)).await;
        let second = service.handle(register_titan().with_request_id(id)).await;
        assert_eq!(second, CallResponse::ok(json!(2)));
    }

    #[tokio::test]
    async fn successful_mutations_are_saved() {
        let service = RegistryService::new(Registry::new()).with_store(Box::new(MemoryStore::new()));
        service.handle(register_titan()).await;
        let snapshot = service.snapshot().await;
        assert_eq!(snapshot.species.len(), 1);
        assert_eq!(service.name(), "seedbank");
    }
}
