//! End-to-end registry scenarios through the wire dispatch and the typed API.
//!
//! These follow the call sequences curators actually issue: register a
//! species, attach conditions, log propagation, bank samples, and read the
//! derived diversity back.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use chrono::{DateTime, TimeZone, Utc};
use seedbank_registry::dispatch::{CODE_SPECIES_NOT_FOUND, CODE_UPDATE_NOT_FOUND};
use seedbank_registry::{IdNamespace, Registry, RegistryError};
use seedbank_types::{CallResponse, ErrorKind, Principal, SampleId, SpeciesId};
use serde_json::{Value, json};

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap()
}

fn caller() -> Principal {
    Principal::new("mock-principal")
}

fn register(registry: &mut Registry, scientific: &str, common: &str, status: &str) -> CallResponse {
    registry.call(
        "register-species",
        &[json!(scientific), json!(common), json!(status)],
        caller(),
        at(100),
    )
}

fn sample_args(species_id: u64) -> Vec<Value> {
    vec![
        json!(species_id),
        json!("Bukit Barisan"),
        json!("ITS2; rbcL; matK"),
        json!("Cryo Vault 2"),
        json!("Viable"),
    ]
}

fn condition_args(species_id: u64, light: &str) -> Vec<Value> {
    vec![
        json!(species_id),
        json!(light),
        json!("24-32C"),
        json!("High"),
        json!("Rich organic"),
        json!("Keep moist"),
        json!("Dormancy after flowering"),
    ]
}

#[test]
fn register_species_returns_sequential_ids() {
    let mut registry = Registry::new();
    for expected in 1..=5_u64 {
        let response = register(&mut registry, "Species", "", "Vulnerable");
        assert_eq!(response, CallResponse::ok(json!(expected)));
    }
}

#[test]
fn corpse_flower_status_update() {
    let mut registry = Registry::new();
    let registered = register(
        &mut registry,
        "Amorphophallus titanum",
        "Corpse Flower",
        "Endangered",
    );
    assert_eq!(registered.value, Some(json!(1)));

    let species = registry.read("get-species", &[json!(1)]);
    let value = species.value.unwrap();
    assert_eq!(value["scientific_name"], json!("Amorphophallus titanum"));
    assert_eq!(value["conservation_status"], json!("Endangered"));

    let update = registry.call(
        "update-conservation-status",
        &[json!(1), json!("Critically Endangered")],
        caller(),
        at(200),
    );
    assert_eq!(update, CallResponse::ok(json!(true)));

    let after = registry.read("get-species", &[json!(1)]).value.unwrap();
    assert_eq!(after["conservation_status"], json!("Critically Endangered"));
    // Everything else is untouched.
    assert_eq!(after["common_name"], value["common_name"]);
    assert_eq!(after["registered_at"], value["registered_at"]);
    assert_eq!(after["registered_by"], value["registered_by"]);
}

#[test]
fn updating_missing_species_leaves_state_empty() {
    let mut registry = Registry::new();
    let response = registry.call(
        "update-conservation-status",
        &[json!(999), json!("Extinct")],
        caller(),
        at(1),
    );
    assert!(!response.success);
    let error = response.error.unwrap();
    assert_eq!(error.code, CODE_UPDATE_NOT_FOUND);
    assert_eq!(error.kind, ErrorKind::NotFound);
    assert_eq!(registry, Registry::new());
}

#[test]
fn get_species_never_returned_is_not_found() {
    let mut registry = Registry::new();
    register(&mut registry, "Rafflesia arnoldii", "Corpse Lily", "Vulnerable");
    assert_eq!(
        registry.species(SpeciesId::new(2)).unwrap_err(),
        RegistryError::NotFound {
            kind: seedbank_registry::RecordKind::Species,
            id: 2
        }
    );
    let response = registry.read("get-species", &[json!(2)]);
    assert_eq!(response.error.unwrap().kind, ErrorKind::NotFound);
}

#[test]
fn conditions_on_missing_species_create_nothing() {
    let mut registry = Registry::new();
    for name in ["add-growing-conditions", "update-growing-conditions"] {
        let response = registry.call(name, &condition_args(4, "Shade"), caller(), at(1));
        let error = response.error.unwrap();
        assert_eq!(error.kind, ErrorKind::SpeciesNotFound, "{name}");
    }
    assert!(registry.growing_conditions(SpeciesId::new(4)).is_err());
    assert!(registry.is_empty());
}

#[test]
fn conditions_add_is_an_overwrite_and_update_replaces_wholesale() {
    let mut registry = Registry::new();
    register(&mut registry, "Wollemia nobilis", "Wollemi Pine", "Critically Endangered");

    assert!(registry.read("get-growing-conditions", &[json!(1)]).error.is_some());

    let first = registry.call("add-growing-conditions", &condition_args(1, "Shade"), caller(), at(1));
    assert!(first.success);
    let again = registry.call("add-growing-conditions", &condition_args(1, "Dappled"), caller(), at(2));
    assert!(again.success);

    let mut replacement = condition_args(1, "Full sun");
    replacement[6] = json!("");
    let update = registry.call("update-growing-conditions", &replacement, caller(), at(3));
    assert!(update.success);

    let stored = registry.growing_conditions(SpeciesId::new(1)).unwrap();
    assert_eq!(stored.light_requirements, "Full sun");
    assert_eq!(stored.notes, "");
}

#[test]
fn failed_dependent_writes_allocate_no_ids() {
    let mut registry = Registry::new();
    register(&mut registry, "Encephalartos woodii", "Wood's Cycad", "Extinct in the Wild");

    let propagation = [json!(9), json!("offset"), json!(3), json!("Durban"), json!(100), json!("")];
    let rejected = registry.call("record-propagation", &propagation, caller(), at(1));
    assert_eq!(rejected.error.unwrap().code, CODE_SPECIES_NOT_FOUND);
    assert_eq!(registry.ids().peek(IdNamespace::PropagationEvent), 1);

    let rejected = registry.call("register-genetic-sample", &sample_args(9), caller(), at(1));
    assert_eq!(rejected.error.unwrap().code, CODE_SPECIES_NOT_FOUND);
    assert_eq!(registry.ids().peek(IdNamespace::GeneticSample), 1);

    let mut accepted = propagation.to_vec();
    accepted[0] = json!(1);
    assert_eq!(
        registry.call("record-propagation", &accepted, caller(), at(2)),
        CallResponse::ok(json!(1))
    );
    assert_eq!(
        registry.call("register-genetic-sample", &sample_args(1), caller(), at(2)),
        CallResponse::ok(json!(1))
    );
}

#[test]
fn two_samples_give_sample_count_two() {
    let mut registry = Registry::new();
    register(&mut registry, "Amorphophallus titanum", "Corpse Flower", "Endangered");

    let first = registry.call("register-genetic-sample", &sample_args(1), caller(), at(10));
    let second = registry.call("register-genetic-sample", &sample_args(1), caller(), at(20));
    assert_eq!(first, CallResponse::ok(json!(1)));
    assert_eq!(second, CallResponse::ok(json!(2)));

    let diversity = registry.read("get-species-diversity", &[json!(1)]).value.unwrap();
    assert_eq!(diversity["sample_count"], json!(2));
}

#[test]
fn diversity_follows_sample_count() {
    let mut registry = Registry::new();
    register(&mut registry, "Amorphophallus titanum", "Corpse Flower", "Endangered");
    register(&mut registry, "Rafflesia arnoldii", "Corpse Lily", "Vulnerable");

    assert!(registry.species_diversity(SpeciesId::new(1)).is_err());

    for k in 1..=12_u32 {
        registry.call("register-genetic-sample", &sample_args(1), caller(), at(i64::from(k)));
        let metrics = registry.species_diversity(SpeciesId::new(1)).unwrap();
        assert_eq!(metrics.sample_count, u64::from(k));
        let expected = if k == 1 { 0.0 } else { f64::from(k) };
        assert!(
            (metrics.diversity_index - expected).abs() < 1e-9,
            "k = {k}: {}",
            metrics.diversity_index
        );
        assert_eq!(metrics.last_updated, at(i64::from(k)));
    }

    // Samples of one species never touch another's metrics.
    assert!(registry.species_diversity(SpeciesId::new(2)).is_err());
    assert_eq!(registry.samples_for(SpeciesId::new(1)).count(), 12);
}

#[test]
fn viability_update_only_touches_viability() {
    let mut registry = Registry::new();
    register(&mut registry, "Amorphophallus titanum", "Corpse Flower", "Endangered");
    registry.call("register-genetic-sample", &sample_args(1), caller(), at(5));
    let before = registry.genetic_sample(SampleId::new(1)).unwrap().clone();

    let update = registry.call(
        "update-viability-status",
        &[json!(1), json!("Low viability")],
        caller(),
        at(6),
    );
    assert_eq!(update, CallResponse::ok(json!(true)));

    let after = registry.genetic_sample(SampleId::new(1)).unwrap();
    assert_eq!(after.viability_status, "Low viability");
    assert_eq!(after.collected_at, before.collected_at);
    assert_eq!(after.genetic_markers, before.genetic_markers);
    // Viability changes do not count as new samples.
    assert_eq!(registry.species_diversity(SpeciesId::new(1)).unwrap().sample_count, 1);

    let missing = registry.call(
        "update-viability-status",
        &[json!(2), json!("Viable")],
        caller(),
        at(7),
    );
    assert_eq!(missing.error.unwrap().code, CODE_UPDATE_NOT_FOUND);
}

#[test]
fn propagation_events_are_readable_and_immutable() {
    let mut registry = Registry::new();
    register(&mut registry, "Wollemia nobilis", "Wollemi Pine", "Critically Endangered");
    let args = [json!(1), json!("cutting"), json!(24), json!("Mount Annan"), json!(60), json!("Misted")];
    registry.call("record-propagation", &args, caller(), at(50));

    let event = registry.read("get-propagation-event", &[json!(1)]).value.unwrap();
    assert_eq!(event["species_id"], json!(1));
    assert_eq!(event["quantity"], json!(24));
    assert_eq!(event["success_rate"], json!(60));
    assert_eq!(event["conducted_by"], json!("mock-principal"));

    assert_eq!(
        registry.read("get-propagation-event", &[json!(2)]).error.unwrap().kind,
        ErrorKind::NotFound
    );
    assert_eq!(registry.propagation_events_for(SpeciesId::new(1)).count(), 1);
}
