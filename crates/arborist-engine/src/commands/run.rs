//! Run coordinator
//!
//! ## Stages (in order):
//! 1. AUTHENTICATING: access probe, hard stop on failure
//! 2. CLASSIFYING: list the root collection and classify each entity
//! 3. DISCOVERING: walk every DELETE target, exclude incomplete and
//!    protected subtrees
//! 4. DRY_RUN_REPORT: dry-run stops here, nothing is mutated
//! 5. GUARDING: execute guard, hard stop on denial
//! 6. EXECUTING: ordered batch commits
//! 7. VERIFYING: settle delay, then read every attempted target back
//! 8. REPORTED
//!
//! Every stage before EXECUTING is read-only, so any abort up to that point
//! leaves the store untouched. Cancellation is checked before DISCOVERING,
//! EXECUTING and VERIFYING only.

use arborist_core::config::RunConfig;
use arborist_core::errors::{ArboristError, ExError};
use arborist_core::model::{
    DeletionStatus, EntityReference, ReportedError, RunMode, RunReport, RunStage,
    TargetOutcome, VerificationStatus,
};
use arborist_core::policy::{ExecuteGuard, GuardContext};
use arborist_core::rules::Classifier;
use arborist_core::store_client::DocumentStore;
use arborist_core::traversal::Discovery;
use arborist_core::{log_op_end, log_op_error, log_op_start};
use arborist_core_types::{RunId, TraceId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::commands::classify::classify_top_level;
use crate::commands::discover::discover_targets;
use crate::commands::execute::{execute, plan_batches, DeletionUnit, PathOutcome};
use crate::commands::verify::{apply_verifications, reverify_stragglers, verify};
use crate::retry::{RetryPolicy, RetryingStore};
use crate::Result;

/// Per-invocation options that are not part of the run configuration
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub mode: RunMode,
    /// Run one extra verification pass over stragglers
    pub second_pass: bool,
    pub trace_id: Option<TraceId>,
}

impl RunOptions {
    pub fn dry_run() -> Self {
        Self {
            mode: RunMode::DryRun,
            second_pass: false,
            trace_id: None,
        }
    }

    pub fn execute() -> Self {
        Self {
            mode: RunMode::Execute,
            ..Self::dry_run()
        }
    }

    pub fn with_second_pass(mut self) -> Self {
        self.second_pass = true;
        self
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::dry_run()
    }
}

/// Cooperative cancellation flag, checked at stage boundaries
#[derive(Debug, Clone, Default)]
pub struct CancelSignal(Arc<AtomicBool>);

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Execute one lifecycle run
///
/// Discovery and batch failures are recorded per target in the returned
/// report. Only fatal conditions return `Err`, and all of them happen before
/// the first mutating call.
///
/// # Errors
///
/// - `ConfigInvalid` if `config` fails validation
/// - `AuthenticationFailed` (or the store's error) if the access probe fails
/// - the store's error if the top-level listing fails
/// - `PolicyDenied` if the guard rejects the run
/// - `Cancelled` if `cancel` fires before EXECUTING
pub async fn run<S>(
    store: &S,
    config: &RunConfig,
    guard: &dyn ExecuteGuard,
    options: &RunOptions,
    cancel: &CancelSignal,
) -> Result<RunReport>
where
    S: DocumentStore + ?Sized,
{
    let run_id = RunId::new();
    log_op_start!(
        "run",
        run_id = %run_id,
        mode = %options.mode,
        collection = config.root_collection.as_str()
    );
    let start = Instant::now();

    let result = run_stages(store, config, guard, options, cancel, run_id.clone()).await;

    let elapsed = start.elapsed().as_millis() as u64;
    match &result {
        Ok(report) => {
            let counts = report.counts();
            log_op_end!(
                "run",
                duration_ms = elapsed,
                run_id = %run_id,
                mode = %options.mode,
                success = report.is_success(),
                target_count = counts.delete,
                deleted = counts.deleted,
                failed = counts.failed,
                blocked = counts.blocked
            );
        }
        Err(e) => {
            log_op_error!("run", e.clone(), duration_ms = elapsed, run_id = %run_id);
        }
    }
    result.map_err(|e| e.with_run_id(run_id))
}

async fn run_stages<S>(
    store: &S,
    config: &RunConfig,
    guard: &dyn ExecuteGuard,
    options: &RunOptions,
    cancel: &CancelSignal,
    run_id: RunId,
) -> Result<RunReport>
where
    S: DocumentStore + ?Sized,
{
    config.validate().map_err(ExError::from)?;
    let classifier = config.compile().map_err(ExError::from)?;
    let store = RetryingStore::new(store, RetryPolicy::from(&config.retry));

    let mut report = RunReport::new(run_id, options.mode, config.root_collection.as_str());
    report.trace_id = options.trace_id.clone();

    // ── AUTHENTICATING ───────────────────────────────────────────────────────
    enter(&mut report, RunStage::Authenticating);
    store.check_access().await?;

    // ── CLASSIFYING ──────────────────────────────────────────────────────────
    enter(&mut report, RunStage::Classifying);
    report.outcomes = classify_top_level(&store, &config.root_collection, &classifier).await?;

    // ── DISCOVERING ──────────────────────────────────────────────────────────
    check_cancelled(cancel, RunStage::Discovering)?;
    enter(&mut report, RunStage::Discovering);
    let targets: Vec<EntityReference> = report.targets().map(|o| o.reference.clone()).collect();
    let discoveries = discover_targets(
        &store,
        &targets,
        config.max_depth,
        config.discovery_concurrency,
    )
    .await;
    let units = screen_discoveries(&mut report, &classifier, discoveries);
    let batches = plan_batches(&units, config.batch_size);

    // ── DRY_RUN_REPORT ───────────────────────────────────────────────────────
    if options.mode == RunMode::DryRun {
        enter(&mut report, RunStage::DryRunReport);
        let outcomes = execute(&store, &batches, RunMode::DryRun).await;
        aggregate(&mut report, &units, &outcomes);
        report.finish();
        return Ok(report);
    }

    // ── GUARDING ─────────────────────────────────────────────────────────────
    enter(&mut report, RunStage::Guarding);
    let eligible: Vec<EntityReference> = units.iter().map(|u| u.target.clone()).collect();
    let total_paths = units.iter().map(|u| u.paths.len()).sum();
    guard.check(&GuardContext {
        root_collection: &config.root_collection,
        targets: &eligible,
        total_paths,
    })?;

    // ── EXECUTING ────────────────────────────────────────────────────────────
    check_cancelled(cancel, RunStage::Executing)?;
    enter(&mut report, RunStage::Executing);
    let outcomes = execute(&store, &batches, RunMode::Execute).await;
    aggregate(&mut report, &units, &outcomes);

    // ── VERIFYING ────────────────────────────────────────────────────────────
    if cancel.is_cancelled() {
        tracing::warn!(run_id = %report.run_id, "cancelled after execution, skipping verification");
        report.finish();
        return Ok(report);
    }
    enter(&mut report, RunStage::Verifying);
    let settle_delay = Duration::from_millis(config.settle_delay_ms);
    let results = verify(&store, &config.root_collection, &eligible, settle_delay).await;
    apply_verifications(&mut report, results);
    if options.second_pass {
        reverify_stragglers(&store, &mut report, settle_delay).await;
    }

    report.finish();
    Ok(report)
}

fn enter(report: &mut RunReport, stage: RunStage) {
    tracing::debug!(run_id = %report.run_id, from = %report.stage, to = %stage, "stage transition");
    report.stage = stage;
}

fn check_cancelled(cancel: &CancelSignal, next: RunStage) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(ArboristError::Cancelled {
            stage: next.to_string(),
        }
        .into());
    }
    Ok(())
}

/// Apply discovery results to the report and build the deletion units
///
/// Targets with an incomplete walk are FAILED and targets with a descendant
/// matching a KEEP rule are BLOCKED; neither becomes a unit nor is verified.
/// Discoveries arrive in the same order as `report.targets()`.
fn screen_discoveries(
    report: &mut RunReport,
    classifier: &Classifier,
    discoveries: Vec<Discovery>,
) -> Vec<DeletionUnit> {
    let mut units = Vec::new();
    let mut discoveries = discoveries.into_iter();

    for outcome in report.outcomes.iter_mut().filter(|o| o.is_target()) {
        let Some(discovery) = discoveries.next() else {
            break;
        };
        outcome.descendant_count = discovery.descendant_count();

        if !discovery.is_complete() {
            exclude(outcome, DeletionStatus::Failed);
            for failure in &discovery.failures {
                outcome.push_error(&failure.error);
            }
            tracing::warn!(
                entity_path = %outcome.reference,
                failures = discovery.failures.len(),
                "excluding target with incomplete discovery"
            );
            continue;
        }

        let protected = discovery.descendants.iter().find_map(|node| {
            classifier
                .matches_keep(node.reference.leaf_id(), &node.attributes)
                .map(|rule| (node, rule))
        });
        if let Some((node, rule)) = protected {
            exclude(outcome, DeletionStatus::Blocked);
            outcome.push_error(ExError::from(ArboristError::ProtectedDescendant {
                target: outcome.reference.to_string(),
                descendant: node.reference.to_string(),
                rule: rule.name.clone(),
            }));
            tracing::warn!(
                entity_path = %outcome.reference,
                descendant = %node.reference,
                rule = %rule.name,
                "target blocked by protected descendant"
            );
            continue;
        }

        units.push(DeletionUnit::new(outcome.reference.clone(), discovery.order));
    }
    units
}

fn exclude(outcome: &mut TargetOutcome, status: DeletionStatus) {
    outcome.deletion = status;
    outcome.verification = VerificationStatus::Skipped;
}

/// Fold path outcomes into one deletion status per unit target
///
/// A target is DELETED (or WOULD_DELETE) only if every path of its subtree
/// was; otherwise it is FAILED with the distinct errors of its subtree.
fn aggregate(report: &mut RunReport, units: &[DeletionUnit], outcomes: &[PathOutcome]) {
    for (index, unit) in units.iter().enumerate() {
        let Some(target) = report
            .outcomes
            .iter_mut()
            .find(|o| o.reference == unit.target)
        else {
            continue;
        };

        let paths: Vec<&PathOutcome> = outcomes.iter().filter(|o| o.unit == index).collect();
        let failed: Vec<&PathOutcome> = paths
            .iter()
            .copied()
            .filter(|o| o.status == DeletionStatus::Failed)
            .collect();

        target.deletion = if !failed.is_empty() {
            DeletionStatus::Failed
        } else if paths.iter().all(|o| o.status == DeletionStatus::WouldDelete) {
            DeletionStatus::WouldDelete
        } else {
            DeletionStatus::Deleted
        };

        for path in failed {
            if let Some(err) = &path.error {
                let reported = ReportedError::from(err);
                if !target.errors.contains(&reported) {
                    target.errors.push(reported);
                }
            }
        }
    }
}
