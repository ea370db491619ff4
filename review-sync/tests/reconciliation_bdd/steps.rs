//! Step definitions and scenario bindings for reconciliation runs.

use super::*;
use review_sync::domain::{CredentialSourceError, PutCode, UPDATE_ACTIVITIES_SCOPE};
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::json;

#[given("Alice holds a credential with the update scope")]
fn alice_holds_an_updating_credential(world: &ReconciliationWorld) {
    world.store_credential(
        "Alice",
        json!({ "value": { "accessToken": "alice-token", "scopes": [UPDATE_ACTIVITIES_SCOPE] } }),
    );
}

#[given("Bob holds a credential with the update scope")]
fn bob_holds_an_updating_credential(world: &ReconciliationWorld) {
    world.store_credential(
        "Bob",
        json!({ "accessToken": "bob-token", "scopes": [UPDATE_ACTIVITIES_SCOPE] }),
    );
}

#[given("Alice holds a credential without the update scope")]
fn alice_holds_an_authenticate_only_credential(world: &ReconciliationWorld) {
    world.store_credential(
        "Alice",
        json!({ "accessToken": "alice-token", "scopes": ["/authenticate"] }),
    );
}

#[given("Alice holds a credential with no scopes field")]
fn alice_holds_a_credential_without_scopes(world: &ReconciliationWorld) {
    world.store_credential("Alice", json!({ "accessToken": "alice-token" }));
}

#[given("a credential is stored under a key that is not an ORCID iD")]
fn a_credential_is_stored_under_a_corrupt_key(world: &ReconciliationWorld) {
    world.store.insert(
        "credential:0000-0000-0000-0000",
        json!({ "accessToken": "token", "scopes": [UPDATE_ACTIVITIES_SCOPE] }).to_string(),
    );
}

#[given("Zenodo lists reviews B and C for Alice")]
fn zenodo_lists_b_and_c_for_alice(world: &ReconciliationWorld) {
    world
        .repository
        .publish(&reviewer("Alice"), vec![review("B"), review("C")]);
}

#[given("Zenodo lists reviews B, C and D for Alice")]
fn zenodo_lists_b_c_and_d_for_alice(world: &ReconciliationWorld) {
    world.repository.publish(
        &reviewer("Alice"),
        vec![review("B"), review("C"), review("D")],
    );
}

#[given("Zenodo lists review A for Alice")]
fn zenodo_lists_a_for_alice(world: &ReconciliationWorld) {
    world.repository.publish(&reviewer("Alice"), vec![review("A")]);
}

#[given("Zenodo lists review B for Bob")]
fn zenodo_lists_b_for_bob(world: &ReconciliationWorld) {
    world.repository.publish(&reviewer("Bob"), vec![review("B")]);
}

#[given("Zenodo is unavailable for Alice")]
fn zenodo_is_unavailable_for_alice(world: &ReconciliationWorld) {
    world.repository.make_unavailable(&reviewer("Alice"));
}

#[given("Alice's ORCID record lists reviews A and B")]
fn alice_record_lists_a_and_b(world: &ReconciliationWorld) {
    let alice = reviewer("Alice");
    world.profile.seed(&alice, doi("A"), PutCode::new(1));
    world.profile.seed(&alice, doi("B"), PutCode::new(2));
}

#[given("Alice's ORCID record lists review A")]
fn alice_record_lists_a(world: &ReconciliationWorld) {
    world
        .profile
        .seed(&reviewer("Alice"), doi("A"), PutCode::new(1));
}

#[given("Alice's ORCID record lists review Z")]
fn alice_record_lists_z(world: &ReconciliationWorld) {
    world
        .profile
        .seed(&reviewer("Alice"), doi("Z"), PutCode::new(9));
}

#[given("ORCID rejects review C")]
fn orcid_rejects_c(world: &ReconciliationWorld) {
    world.profile.reject(doi("C"));
}

#[when("the sync runs")]
fn the_sync_runs(world: &ReconciliationWorld) {
    world.run();
}

#[then("Alice's ORCID record now lists reviews B and C")]
fn alice_record_now_lists_b_and_c(world: &ReconciliationWorld) {
    assert_eq!(world.profile_dois("Alice"), vec![doi("B"), doi("C")]);
}

#[then("Alice's ORCID record now lists reviews B and D")]
fn alice_record_now_lists_b_and_d(world: &ReconciliationWorld) {
    assert_eq!(world.profile_dois("Alice"), vec![doi("B"), doi("D")]);
}

#[then("Alice's ORCID record still lists only review A")]
fn alice_record_still_lists_a(world: &ReconciliationWorld) {
    assert_eq!(world.profile_dois("Alice"), vec![doi("A")]);
}

#[then("Alice's ORCID record still lists only review Z")]
fn alice_record_still_lists_z(world: &ReconciliationWorld) {
    assert_eq!(world.profile_dois("Alice"), vec![doi("Z")]);
}

#[then("Alice's ORCID record is empty")]
fn alice_record_is_empty(world: &ReconciliationWorld) {
    assert!(world.profile_dois("Alice").is_empty());
}

#[then("Bob's ORCID record now lists review B")]
fn bob_record_now_lists_b(world: &ReconciliationWorld) {
    assert_eq!(world.profile_dois("Bob"), vec![doi("B")]);
}

#[then("the run added 1 review and removed 1 review")]
fn the_run_added_one_and_removed_one(world: &ReconciliationWorld) {
    let summary = world.summary();
    assert_eq!(summary.reviews_added, 1);
    assert_eq!(summary.reviews_removed, 1);
    assert_eq!(summary.decisions_failed, 0);
}

#[then("the run added 2 reviews, removed 1 review and failed 1 write")]
fn the_run_added_two_removed_one_and_failed_one(world: &ReconciliationWorld) {
    let summary = world.summary();
    assert_eq!(summary.users_processed, 1);
    assert_eq!(summary.reviews_added, 2);
    assert_eq!(summary.reviews_removed, 1);
    assert_eq!(summary.decisions_failed, 1);
}

#[then("the latest run made no profile writes")]
fn the_latest_run_made_no_writes(world: &ReconciliationWorld) {
    let summary = world.summary();
    assert_eq!(summary.reviews_added, 0);
    assert_eq!(summary.reviews_removed, 0);
    assert_eq!(world.writes_in_latest_run(), 0);
}

#[then("the run counts no users")]
fn the_run_counts_no_users(world: &ReconciliationWorld) {
    assert_eq!(world.summary(), RunSummary::default());
}

#[then("the run counts 1 failed user and 1 processed user")]
fn the_run_counts_one_failed_and_one_processed(world: &ReconciliationWorld) {
    let summary = world.summary();
    assert_eq!(summary.users_failed, 1);
    assert_eq!(summary.users_processed, 1);
}

#[then("the run stops on the corrupt key")]
fn the_run_stops_on_the_corrupt_key(world: &ReconciliationWorld) {
    let guard = world.last_result.lock().expect("result lock");
    let outcome = guard.as_ref().expect("the sync must have run");
    assert!(
        matches!(
            outcome,
            Err(SyncRunError::Enumeration(CredentialSourceError::InvalidKey { .. }))
        ),
        "expected the run to stop on the corrupt key, got: {outcome:?}"
    );
}

#[scenario(
    path = "tests/features/reconciliation.feature",
    name = "A profile converges on Zenodo and a second run writes nothing"
)]
fn profile_converges_and_second_run_is_idempotent(world: ReconciliationWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/reconciliation.feature",
    name = "A credential without the update scope is skipped"
)]
fn scopeless_credential_is_skipped(world: ReconciliationWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/reconciliation.feature",
    name = "A credential missing its scopes fails only that reviewer"
)]
fn missing_scopes_fail_only_that_reviewer(world: ReconciliationWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/reconciliation.feature",
    name = "A Zenodo outage for one reviewer leaves the others untouched"
)]
fn zenodo_outage_is_isolated_to_one_reviewer(world: ReconciliationWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/reconciliation.feature",
    name = "A rejected write does not block the other writes"
)]
fn rejected_write_does_not_block_siblings(world: ReconciliationWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/reconciliation.feature",
    name = "A corrupt credential key stops the run"
)]
fn corrupt_key_stops_the_run(world: ReconciliationWorld) {
    drop(world);
}
