//! Integration tests for the registry service.
//!
//! Exercise the service the way the transport drives it: concurrent
//! callers, retried requests, and restart from a persisted snapshot.

#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]

use std::sync::Arc;

use chrono::{TimeDelta, TimeZone, Utc};
use seedbank_host::service::CODE_PERSISTENCE_FAILED;
use seedbank_host::{FileStore, FixedClock, RegistryService, WireRequest};
use seedbank_registry::{
    IdNamespace, KeyValueStore, MemoryStore, Registry, StoreError, load_registry,
};
use seedbank_types::{CallResponse, ErrorKind, Principal, SpeciesId};
use serde_json::{Value, json};
use uuid::Uuid;

fn curator() -> Principal {
    Principal::new("curator")
}

fn register(name: &str) -> WireRequest {
    WireRequest::mutating(
        "register-species",
        vec![json!(name), json!(""), json!("Endangered")],
        curator(),
    )
}

fn sample(species_id: u64) -> WireRequest {
    WireRequest::mutating(
        "register-genetic-sample",
        vec![
            json!(species_id),
            json!("Sumatra"),
            json!("ITS2"),
            json!("Vault A"),
            json!("Viable"),
        ],
        curator(),
    )
}

/// A store shared with the test so it can be inspected after the service
/// writes to it.
#[derive(Clone, Default)]
struct SharedStore(Arc<std::sync::Mutex<MemoryStore>>);

impl KeyValueStore for SharedStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.0.lock().unwrap().get(key)
    }

    fn put(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.0.lock().unwrap().put(key, value)
    }

    fn delete(&mut self, key: &str) -> Result<bool, StoreError> {
        self.0.lock().unwrap().delete(key)
    }
}

/// A store whose writes always fail.
struct BrokenStore;

impl KeyValueStore for BrokenStore {
    fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(None)
    }

    fn put(&mut self, _key: &str, _value: &[u8]) -> Result<(), StoreError> {
        Err(StoreError::Backend("disk full".to_owned()))
    }

    fn delete(&mut self, _key: &str) -> Result<bool, StoreError> {
        Ok(false)
    }
}

/// A store whose writes panic, as a buggy backend might.
struct PanickingStore;

impl KeyValueStore for PanickingStore {
    fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(None)
    }

    fn put(&mut self, _key: &str, _value: &[u8]) -> Result<(), StoreError> {
        panic!("backend bug");
    }

    fn delete(&mut self, _key: &str) -> Result<bool, StoreError> {
        Ok(false)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_get_distinct_sequential_ids() {
    let service = Arc::new(RegistryService::new(Registry::new()));

    let handles: Vec<_> = (0..32)
        .map(|n| {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.handle(register(&format!("Species {n}"))).await })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        let response = handle.await.unwrap();
        ids.push(response.value.unwrap().as_u64().unwrap());
    }
    ids.sort_unstable();
    assert_eq!(ids, (1..=32).collect::<Vec<u64>>());
    assert_eq!(service.inspect(Registry::species_count).await, 32);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_samples_keep_diversity_consistent() {
    let service = Arc::new(RegistryService::new(Registry::new()));
    service.handle(register("Amorphophallus titanum")).await;

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.handle(sample(1)).await })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap().success);
    }

    let count = service
        .inspect(|r| r.species_diversity(SpeciesId::new(1)).map(|m| m.sample_count))
        .await;
    assert_eq!(count, Ok(16));
}

#[tokio::test]
async fn duplicated_request_id_allocates_nothing_new() {
    let service = RegistryService::new(Registry::new()).with_dedup(16);
    let retry = Uuid::new_v4();

    let first = service.handle(register("Wollemia nobilis").with_request_id(retry)).await;
    let again = service.handle(register("Wollemia nobilis").with_request_id(retry)).await;
    assert_eq!(first, CallResponse::ok(json!(1)));
    assert_eq!(again, first);

    let fresh = service.handle(register("Wollemia nobilis").with_request_id(Uuid::new_v4())).await;
    assert_eq!(fresh, CallResponse::ok(json!(2)));
    assert_eq!(
        service.inspect(|r| r.ids().peek(IdNamespace::Species)).await,
        3
    );
}

#[tokio::test]
async fn cached_failures_are_replayed_too() {
    let service = RegistryService::new(Registry::new()).with_dedup(4);
    let id = Uuid::new_v4();
    let request = WireRequest::mutating(
        "update-conservation-status",
        vec![json!(999), json!("Extinct")],
        curator(),
    )
    .with_request_id(id);

    let first = service.handle(request.clone()).await;
    assert_eq!(first.error.as_ref().map(|e| e.code), Some(1));

    // The species now exists, but the retry still sees the first answer.
    service.handle(register("Encephalartos woodii")).await;
    let mut retry = request;
    retry.args = vec![json!(1), json!("Extinct")];
    assert_eq!(service.handle(retry).await, first);
}

#[tokio::test]
async fn timestamps_come_from_the_clock() {
    let start = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap();
    let clock = Arc::new(FixedClock::new(start));
    let service = RegistryService::new(Registry::new()).with_clock(ArcClock(Arc::clone(&clock)));

    service.handle(register("Rafflesia arnoldii")).await;
    clock.advance(TimeDelta::hours(1));
    service.handle(sample(1)).await;

    let read = service
        .handle(WireRequest::read("get-species-diversity", vec![json!(1)]))
        .await;
    let metrics: Value = read.value.unwrap();
    let expected = start.checked_add_signed(TimeDelta::hours(1)).unwrap();
    assert_eq!(metrics["last_updated"], json!(expected));

    let species = service
        .inspect(|r| r.species(SpeciesId::new(1)).map(|s| s.registered_at))
        .await;
    assert_eq!(species, Ok(start));
}

struct ArcClock(Arc<FixedClock>);

impl seedbank_host::Clock for ArcClock {
    fn now(&self) -> chrono::DateTime<Utc> {
        self.0.now()
    }
}

#[tokio::test]
async fn persisted_state_survives_restart() {
    let store = SharedStore::default();
    let service =
        RegistryService::new(Registry::new()).with_store(Box::new(store.clone()));

    service.handle(register("Amorphophallus titanum")).await;
    service.handle(sample(1)).await;
    service.handle(sample(1)).await;
    // Reads and rejected calls do not write.
    service
        .handle(WireRequest::read("get-species", vec![json!(1)]))
        .await;

    let restored = load_registry(&store).unwrap().unwrap();
    assert_eq!(restored.snapshot(), service.snapshot().await);

    let revived = RegistryService::new(restored).with_store(Box::new(store.clone()));
    let next = revived.handle(register("Rafflesia arnoldii")).await;
    assert_eq!(next, CallResponse::ok(json!(2)));
    let third = revived.handle(sample(1)).await;
    assert_eq!(third, CallResponse::ok(json!(3)));
}

#[tokio::test]
async fn failed_write_rolls_the_call_back() {
    let service = RegistryService::new(Registry::new())
        .with_store(Box::new(BrokenStore))
        .with_dedup(4);
    let id = Uuid::new_v4();

    let response = service.handle(register("Wollemia nobilis").with_request_id(id)).await;
    let error = response.error.unwrap();
    assert_eq!(error.kind, ErrorKind::Internal);
    assert_eq!(error.code, CODE_PERSISTENCE_FAILED);

    assert!(service.inspect(Registry::is_empty).await);
    assert_eq!(service.inspect(|r| r.ids().peek(IdNamespace::Species)).await, 1);

    // Not cached: the retry runs again (and fails again).
    let retry = service.handle(register("Wollemia nobilis").with_request_id(id)).await;
    assert_eq!(retry.error.map(|e| e.kind), Some(ErrorKind::Internal));
}

#[tokio::test]
async fn panicking_store_is_reported_and_rolled_back() {
    let service = RegistryService::new(Registry::new()).with_store(Box::new(PanickingStore));

    let first = service.handle(register("Wollemia nobilis")).await;
    let error = first.error.unwrap();
    assert_eq!(error.kind, ErrorKind::Internal);
    assert_eq!(error.code, CODE_PERSISTENCE_FAILED);

    // The store lock is poisoned now; later writes fail cleanly too.
    let second = service.handle(register("Wollemia nobilis")).await;
    assert_eq!(second.error.map(|e| e.kind), Some(ErrorKind::Internal));

    assert!(service.inspect(Registry::is_empty).await);
    // Reads do not touch the store and keep working.
    let read = service
        .handle(WireRequest::read("get-species", vec![json!(1)]))
        .await;
    assert_eq!(read.error.map(|e| e.kind), Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn read_with_request_id_sees_later_writes() {
    let service = RegistryService::new(Registry::new()).with_dedup(8);
    let id = Uuid::new_v4();
    let get = WireRequest::read("get-species", vec![json!(1)]).with_request_id(id);

    assert!(!service.handle(get.clone()).await.success);
    service.handle(register("Rafflesia arnoldii")).await;
    let found = service.handle(get).await;
    assert_eq!(found.value.unwrap()["scientific_name"], json!("Rafflesia arnoldii"));
}

#[tokio::test]
async fn file_store_round_trip() {
    let dir = std::env::temp_dir().join(format!("seedbank-service-{}", Uuid::new_v4()));
    let store = FileStore::open(&dir).unwrap();
    let service = RegistryService::new(Registry::new()).with_store(Box::new(store));
    service.handle(register("Encephalartos woodii")).await;

    let reopened = FileStore::open(&dir).unwrap();
    let restored = load_registry(&reopened).unwrap().unwrap();
    assert_eq!(restored.species_count(), 1);

    std::fs::remove_dir_all(&dir).unwrap();
}
