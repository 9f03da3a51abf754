//! End-to-end run scenarios against the in-memory store

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use arborist_core::errors::ExErrorKind;
use arborist_core::model::{DeletionStatus, RunMode, RunStage, Verdict, VerificationStatus};
use arborist_core::policy::{DenyAllExecuteGuard, MaxTargetsGuard, NoopExecuteGuard};
use arborist_engine::{run, CancelSignal, RunOptions};
use arborist_store::{compute_state_digest, FaultPlan};
use common::{
    deleted_in_order, orgs_store, path, scenario_a_config, store_with, test_orgs_config,
};

#[tokio::test]
async fn test_scenario_b_dry_run_makes_no_mutating_calls() {
    // GIVEN the Scenario A rules and tree
    let store = orgs_store();
    let before = compute_state_digest(&store).unwrap();

    // WHEN running in dry-run mode
    let report = run(
        &store,
        &scenario_a_config(),
        &NoopExecuteGuard,
        &RunOptions::dry_run(),
        &CancelSignal::new(),
    )
    .await
    .unwrap();

    // THEN two targets would be deleted and the store is untouched
    let would_delete: Vec<String> = report
        .outcomes
        .iter()
        .filter(|o| o.deletion == DeletionStatus::WouldDelete)
        .map(|o| o.reference.leaf_id().to_string())
        .collect();
    assert_eq!(would_delete.len(), 2);
    assert!(would_delete.contains(&"test-org-7".to_string()));
    assert!(would_delete.contains(&"acme-corp".to_string()));
    assert_eq!(store.delete_call_count(), 0);
    assert_eq!(compute_state_digest(&store).unwrap(), before);

    assert_eq!(report.mode, RunMode::DryRun);
    assert_eq!(report.stage, RunStage::Reported);
    assert!(report.is_success());
    let platform = report.outcome(&path("organizations/platform")).unwrap();
    assert_eq!(platform.disposition.verdict, Verdict::Keep);
    assert_eq!(platform.verification, VerificationStatus::Skipped);
    let acme = report.outcome(&path("organizations/acme-corp")).unwrap();
    assert_eq!(acme.verification, VerificationStatus::NotVerified);
    assert_eq!(acme.descendant_count, 4);
}

#[tokio::test]
async fn test_execute_deletes_and_verifies_every_target() {
    // GIVEN the Scenario A rules and tree
    let store = orgs_store();

    // WHEN executing
    let report = run(
        &store,
        &scenario_a_config(),
        &NoopExecuteGuard,
        &RunOptions::execute(),
        &CancelSignal::new(),
    )
    .await
    .unwrap();

    // THEN both targets and their subtrees are gone, platform is untouched
    assert!(report.is_success());
    let counts = report.counts();
    assert_eq!(counts.deleted, 2);
    assert_eq!(counts.gone, 2);
    assert_eq!(counts.keep, 1);
    assert_eq!(store.len(), 2);
    assert!(store.contains(&path("organizations/platform")));
    assert!(store.contains(&path("organizations/platform/users/root")));

    // One batch holds both subtrees; it is sent as three waves (leaves,
    // test-org-7 and p1, then acme-corp), each child before its parent
    assert_eq!(store.delete_call_count(), 3);
    assert_eq!(store.delete_calls()[2], vec![path("organizations/acme-corp")]);
    let order = deleted_in_order(&store);
    assert_eq!(order.len(), 9);
    let position = |p: &str| order.iter().position(|r| r == &path(p)).unwrap();
    assert!(
        position("organizations/acme-corp/projects/p1/tasks/t1")
            < position("organizations/acme-corp/projects/p1")
    );
    assert!(
        position("organizations/acme-corp/projects/p1")
            < position("organizations/acme-corp")
    );
}

#[tokio::test]
async fn test_scenario_c_target_is_deleted_strictly_last() {
    // GIVEN a target with three children in one subcollection
    let store = store_with(&[
        "organizations/test-org-7",
        "organizations/test-org-7/users/u1",
        "organizations/test-org-7/users/u2",
        "organizations/test-org-7/users/u3",
    ]);

    // WHEN executing
    run(
        &store,
        &test_orgs_config(),
        &NoopExecuteGuard,
        &RunOptions::execute(),
        &CancelSignal::new(),
    )
    .await
    .unwrap();

    // THEN the three children come first, in any order, and the target last
    let order = deleted_in_order(&store);
    assert_eq!(order.len(), 4);
    assert_eq!(order[3], path("organizations/test-org-7"));
    let mut children: Vec<String> = order[..3].iter().map(|r| r.to_string()).collect();
    children.sort();
    assert_eq!(
        children,
        vec![
            "organizations/test-org-7/users/u1",
            "organizations/test-org-7/users/u2",
            "organizations/test-org-7/users/u3",
        ]
    );
}

#[tokio::test]
async fn test_second_execute_run_is_a_no_op() {
    // GIVEN a store already cleaned by one execute run
    let store = orgs_store();
    let config = scenario_a_config();
    run(
        &store,
        &config,
        &NoopExecuteGuard,
        &RunOptions::execute(),
        &CancelSignal::new(),
    )
    .await
    .unwrap();
    let digest = compute_state_digest(&store).unwrap();
    let calls = store.delete_call_count();

    // WHEN running again against the same root
    let report = run(
        &store,
        &config,
        &NoopExecuteGuard,
        &RunOptions::execute(),
        &CancelSignal::new(),
    )
    .await
    .unwrap();

    // THEN there are no targets and no further deletions
    assert_eq!(report.targets().count(), 0);
    assert_eq!(store.delete_call_count(), calls);
    assert_eq!(compute_state_digest(&store).unwrap(), digest);
    assert!(report.is_success());
}

#[tokio::test]
async fn test_keep_matching_descendant_blocks_its_target() {
    // GIVEN acme-corp holds a nested document whose id matches the KEEP rule
    let store = orgs_store();
    store.insert(
        path("organizations/acme-corp/mirrors/platform"),
        Default::default(),
    );

    // WHEN executing
    let report = run(
        &store,
        &scenario_a_config(),
        &NoopExecuteGuard,
        &RunOptions::execute(),
        &CancelSignal::new(),
    )
    .await
    .unwrap();

    // THEN acme-corp is blocked and none of its subtree was sent to the store
    let acme = report.outcome(&path("organizations/acme-corp")).unwrap();
    assert_eq!(acme.deletion, DeletionStatus::Blocked);
    assert_eq!(acme.verification, VerificationStatus::Skipped);
    assert_eq!(acme.errors[0].code, "ERR_PROTECTED_DESCENDANT");
    assert!(acme.errors[0].message.contains("mirrors/platform"));

    let acme_root = path("organizations/acme-corp");
    assert!(deleted_in_order(&store)
        .iter()
        .all(|p| p != &acme_root && !acme_root.is_ancestor_of(p)));
    assert!(store.contains(&acme_root));

    // The independent target still goes through
    let test_org = report.outcome(&path("organizations/test-org-7")).unwrap();
    assert_eq!(test_org.deletion, DeletionStatus::Deleted);
    assert!(!report.is_success());
}

#[tokio::test]
async fn test_discovery_failure_excludes_only_that_target() {
    // GIVEN listing under acme-corp fails
    let store = orgs_store()
        .with_faults(FaultPlan::new().fail_listing_under(path("organizations/acme-corp")));

    // WHEN executing
    let report = run(
        &store,
        &scenario_a_config(),
        &NoopExecuteGuard,
        &RunOptions::execute(),
        &CancelSignal::new(),
    )
    .await
    .unwrap();

    // THEN acme-corp is FAILED with a discovery error and left in place
    let acme = report.outcome(&path("organizations/acme-corp")).unwrap();
    assert_eq!(acme.deletion, DeletionStatus::Failed);
    assert_eq!(acme.verification, VerificationStatus::Skipped);
    assert_eq!(acme.errors[0].code, "ERR_DISCOVERY_FAILED");
    assert!(store.contains(&path("organizations/acme-corp")));
    assert!(store.contains(&path("organizations/acme-corp/users/admin")));

    // AND test-org-7 is still deleted and verified
    let test_org = report.outcome(&path("organizations/test-org-7")).unwrap();
    assert_eq!(test_org.deletion, DeletionStatus::Deleted);
    assert_eq!(test_org.verification, VerificationStatus::Gone);
}

#[tokio::test]
async fn test_depth_guard_excludes_deep_subtree() {
    // GIVEN a target nested deeper than the configured guard
    let store = store_with(&[
        "organizations/test-org-1",
        "organizations/test-org-1/a/1",
        "organizations/test-org-1/a/1/b/2",
        "organizations/test-org-1/a/1/b/2/c/3",
    ]);
    let mut config = test_orgs_config();
    config.max_depth = 2;

    // WHEN executing
    let report = run(
        &store,
        &config,
        &NoopExecuteGuard,
        &RunOptions::execute(),
        &CancelSignal::new(),
    )
    .await
    .unwrap();

    // THEN the target is FAILED with DepthExceeded and nothing is deleted
    let outcome = report.outcome(&path("organizations/test-org-1")).unwrap();
    assert_eq!(outcome.deletion, DeletionStatus::Failed);
    assert_eq!(outcome.errors[0].code, "ERR_DEPTH_EXCEEDED");
    assert_eq!(store.delete_call_count(), 0);
    assert_eq!(store.len(), 4);
}

#[tokio::test]
async fn test_access_denied_aborts_with_zero_mutations() {
    // GIVEN a store that rejects the credentials
    let store = orgs_store().with_faults(FaultPlan::new().deny_access());

    // WHEN executing
    let err = run(
        &store,
        &scenario_a_config(),
        &NoopExecuteGuard,
        &RunOptions::execute(),
        &CancelSignal::new(),
    )
    .await
    .unwrap_err();

    // THEN the run aborts before any delete call
    assert_eq!(err.kind(), ExErrorKind::AuthenticationFailed);
    assert!(err.run_id().is_some());
    assert_eq!(store.delete_call_count(), 0);
    assert_eq!(store.len(), 11);
}

#[tokio::test]
async fn test_guard_rejection_aborts_with_zero_mutations() {
    let store = orgs_store();

    let err = run(
        &store,
        &scenario_a_config(),
        &DenyAllExecuteGuard,
        &RunOptions::execute(),
        &CancelSignal::new(),
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::PolicyDenied);
    assert_eq!(store.delete_call_count(), 0);
}

#[tokio::test]
async fn test_max_targets_guard_counts_eligible_targets() {
    // GIVEN a guard allowing one target while two are eligible
    let store = orgs_store();
    let config = scenario_a_config();

    // WHEN executing with max_targets = 1
    let err = run(
        &store,
        &config,
        &MaxTargetsGuard::new(1),
        &RunOptions::execute(),
        &CancelSignal::new(),
    )
    .await
    .unwrap_err();

    // THEN the run is denied; with room for two it proceeds
    assert_eq!(err.kind(), ExErrorKind::PolicyDenied);
    assert!(err.to_string().contains("max_targets 1"));
    assert_eq!(store.delete_call_count(), 0);

    let report = run(
        &store,
        &config,
        &MaxTargetsGuard::new(2),
        &RunOptions::execute(),
        &CancelSignal::new(),
    )
    .await
    .unwrap();
    assert!(report.is_success());
}

#[tokio::test]
async fn test_guard_is_not_consulted_in_dry_run() {
    let store = orgs_store();

    let report = run(
        &store,
        &scenario_a_config(),
        &DenyAllExecuteGuard,
        &RunOptions::dry_run(),
        &CancelSignal::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.counts().would_delete, 2);
}

#[tokio::test]
async fn test_cancelled_run_aborts_before_discovery() {
    // GIVEN a cancellation requested before the run starts
    let store = orgs_store();
    let cancel = CancelSignal::new();
    cancel.cancel();

    // WHEN executing
    let err = run(
        &store,
        &scenario_a_config(),
        &NoopExecuteGuard,
        &RunOptions::execute(),
        &cancel,
    )
    .await
    .unwrap_err();

    // THEN nothing was mutated
    assert_eq!(err.kind(), ExErrorKind::Cancelled);
    assert!(err.to_string().contains("DISCOVERING"));
    assert_eq!(store.delete_call_count(), 0);
}

#[tokio::test]
async fn test_invalid_config_is_fatal() {
    let store = orgs_store();
    let mut config = scenario_a_config();
    config.batch_size = 501;

    let err = run(
        &store,
        &config,
        &NoopExecuteGuard,
        &RunOptions::execute(),
        &CancelSignal::new(),
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::ConfigInvalid);
    assert_eq!(store.delete_call_count(), 0);
}

#[tokio::test]
async fn test_top_level_listing_failure_aborts() {
    // GIVEN the classification listing fails permanently
    let store = orgs_store().with_faults(
        FaultPlan::new().fail_top_level_listing(1, ExErrorKind::Persistence),
    );

    // WHEN executing
    let err = run(
        &store,
        &scenario_a_config(),
        &NoopExecuteGuard,
        &RunOptions::execute(),
        &CancelSignal::new(),
    )
    .await
    .unwrap_err();

    // THEN the run aborts with the store error and no mutations
    assert_eq!(err.kind(), ExErrorKind::Persistence);
    assert_eq!(err.collection(), Some("organizations"));
    assert_eq!(store.delete_call_count(), 0);
}

#[tokio::test]
async fn test_report_policy_leaves_unmatched_entities_alone() {
    // GIVEN unmatched entities are reported instead of deleted
    let store = orgs_store();
    let mut config = scenario_a_config();
    config.default_policy = arborist_core::policy::DefaultPolicy::Report;

    // WHEN executing
    let report = run(
        &store,
        &config,
        &NoopExecuteGuard,
        &RunOptions::execute(),
        &CancelSignal::new(),
    )
    .await
    .unwrap();

    // THEN acme-corp stays UNKNOWN and untouched
    let acme = report.outcome(&path("organizations/acme-corp")).unwrap();
    assert_eq!(acme.disposition.verdict, Verdict::Unknown);
    assert_eq!(acme.deletion, DeletionStatus::NotAttempted);
    assert_eq!(acme.verification, VerificationStatus::Skipped);
    assert!(store.contains(&path("organizations/acme-corp")));
    assert_eq!(report.counts().unknown, 1);
}
