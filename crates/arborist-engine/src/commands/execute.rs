//! Batch executor
//!
//! Packs the ordered subtree lists of the delete targets into batches no
//! larger than the store's atomic write limit and commits them one at a
//! time, in order.
//!
//! ## Packing
//! A whole subtree joins the current batch if it fits, otherwise it opens a
//! new one. A subtree larger than the batch size gets consecutive batches of
//! its own. Paths are never reordered.
//!
//! ## Commit waves
//! A batch usually holds parents together with their children. It is sent as
//! consecutive `delete_batch` calls, deepest paths first, so a parent is only
//! sent after every descendant in its batch has been committed.
//!
//! ## Failure handling
//! - Whole-batch failure: every member is FAILED, the next batch still runs.
//! - Partial failure: only the reported members are FAILED.
//! - Once any path of a subtree fails, its remaining paths (later waves and
//!   later chunks) are held and marked FAILED without being sent, so a parent
//!   is never deleted after one of its descendants failed to delete.

use arborist_core::errors::{ArboristError, ExError, ExErrorKind};
use arborist_core::model::{DeletionStatus, EntityReference, RunMode};
use arborist_core::store_client::{BatchCommit, DocumentStore, MAX_BATCH_SIZE};
use arborist_core::{log_op_end, log_op_start};
use std::collections::{HashMap, HashSet};
use std::time::Instant;

/// One delete target and its subtree, children before parents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionUnit {
    pub target: EntityReference,
    /// Subtree paths; the target itself is last
    pub paths: Vec<EntityReference>,
}

impl DeletionUnit {
    pub fn new(target: EntityReference, paths: Vec<EntityReference>) -> Self {
        Self { target, paths }
    }
}

/// A path placed in a batch, tagged with the unit it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchMember {
    /// Index into the unit list passed to `plan_batches`
    pub unit: usize,
    pub path: EntityReference,
}

/// One atomic `delete_batch` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub index: usize,
    pub members: Vec<BatchMember>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn paths(&self) -> Vec<EntityReference> {
        self.members.iter().map(|m| m.path.clone()).collect()
    }
}

/// Deletion result for a single path
#[derive(Debug, Clone, PartialEq)]
pub struct PathOutcome {
    pub unit: usize,
    pub batch_index: usize,
    pub path: EntityReference,
    pub status: DeletionStatus,
    pub error: Option<ExError>,
}

/// Pack deletion units into batches of at most `batch_size` paths
///
/// `batch_size` is clamped to `1..=MAX_BATCH_SIZE`. Flattening the returned
/// batches yields exactly the concatenation of the units' paths.
pub fn plan_batches(units: &[DeletionUnit], batch_size: usize) -> Vec<Batch> {
    let batch_size = batch_size.clamp(1, MAX_BATCH_SIZE);
    let mut batches: Vec<Batch> = Vec::new();
    let mut current: Vec<BatchMember> = Vec::new();

    for (unit_index, unit) in units.iter().enumerate() {
        let members = unit.paths.iter().map(|path| BatchMember {
            unit: unit_index,
            path: path.clone(),
        });

        if unit.paths.len() > batch_size {
            flush(&mut current, &mut batches);
            let members: Vec<BatchMember> = members.collect();
            for chunk in members.chunks(batch_size) {
                current.extend_from_slice(chunk);
                flush(&mut current, &mut batches);
            }
            continue;
        }

        if current.len() + unit.paths.len() > batch_size {
            flush(&mut current, &mut batches);
        }
        current.extend(members);
    }
    flush(&mut current, &mut batches);

    batches
}

fn flush(current: &mut Vec<BatchMember>, batches: &mut Vec<Batch>) {
    if !current.is_empty() {
        batches.push(Batch {
            index: batches.len(),
            members: std::mem::take(current),
        });
    }
}

/// Commit `batches` in order
///
/// Each batch is sent as one or more waves, deepest paths first: a path is
/// only sent once every descendant sharing its batch has been committed.
/// In dry-run mode nothing is sent to the store and every member is
/// WOULD_DELETE. Outcomes are returned in commit order, one per member.
pub async fn execute<S>(store: &S, batches: &[Batch], mode: RunMode) -> Vec<PathOutcome>
where
    S: DocumentStore + ?Sized,
{
    let total_paths: usize = batches.iter().map(Batch::len).sum();
    log_op_start!(
        "execute",
        mode = %mode,
        batch_count = batches.len(),
        total_paths = total_paths
    );
    let start = Instant::now();

    let mut outcomes = Vec::with_capacity(total_paths);
    let mut failed_units: HashSet<usize> = HashSet::new();

    for batch in batches {
        if mode == RunMode::DryRun {
            outcomes.extend(
                batch
                    .members
                    .iter()
                    .map(|m| path_outcome(m, batch.index, DeletionStatus::WouldDelete, None)),
            );
            continue;
        }

        for wave in waves(batch) {
            commit_wave(store, batch.index, &wave, &mut failed_units, &mut outcomes).await;
        }
    }

    let failed = outcomes
        .iter()
        .filter(|o| o.status == DeletionStatus::Failed)
        .count();
    log_op_end!(
        "execute",
        duration_ms = start.elapsed().as_millis() as u64,
        mode = %mode,
        total_paths = total_paths,
        failed = failed
    );
    outcomes
}

/// Split a batch into commit waves by height within the batch
///
/// A member's height is the largest depth gap to any of its descendants in
/// the same batch, so an ancestor always lands in a later wave than its
/// descendants. Batch order is kept inside each wave.
fn waves(batch: &Batch) -> Vec<Vec<&BatchMember>> {
    let heights: Vec<usize> = batch
        .members
        .iter()
        .map(|member| {
            batch
                .members
                .iter()
                .filter(|other| {
                    other.unit == member.unit && member.path.is_ancestor_of(&other.path)
                })
                .map(|other| other.path.depth() - member.path.depth())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut levels: Vec<usize> = heights.clone();
    levels.sort_unstable();
    levels.dedup();

    levels
        .into_iter()
        .map(|level| {
            batch
                .members
                .iter()
                .zip(&heights)
                .filter(|(_, height)| **height == level)
                .map(|(member, _)| member)
                .collect()
        })
        .collect()
}

async fn commit_wave<S>(
    store: &S,
    batch_index: usize,
    wave: &[&BatchMember],
    failed_units: &mut HashSet<usize>,
    outcomes: &mut Vec<PathOutcome>,
) where
    S: DocumentStore + ?Sized,
{
    let (held, sendable): (Vec<&BatchMember>, Vec<&BatchMember>) = wave
        .iter()
        .copied()
        .partition(|m| failed_units.contains(&m.unit));

    for member in &held {
        let err = ExError::new(ExErrorKind::BatchCommitFailed)
            .with_op("delete_batch")
            .with_batch_index(batch_index)
            .with_entity_path(member.path.to_string())
            .with_message("held: another path of this subtree failed to delete");
        outcomes.push(path_outcome(
            member,
            batch_index,
            DeletionStatus::Failed,
            Some(err),
        ));
    }
    if !held.is_empty() {
        tracing::warn!(
            batch_index = batch_index,
            held = held.len(),
            "holding paths of a subtree with a failed deletion"
        );
    }
    if sendable.is_empty() {
        return;
    }

    let paths: Vec<EntityReference> = sendable.iter().map(|m| m.path.clone()).collect();
    tracing::debug!(batch_index = batch_index, wave_len = paths.len(), "committing wave");

    match store.delete_batch(&paths).await {
        Ok(BatchCommit::Committed) => {
            outcomes.extend(
                sendable
                    .iter()
                    .map(|m| path_outcome(m, batch_index, DeletionStatus::Deleted, None)),
            );
        }
        Ok(BatchCommit::PartialFailure(failures)) => {
            let failures: HashMap<EntityReference, ExError> = failures.into_iter().collect();
            tracing::warn!(
                batch_index = batch_index,
                failed = failures.len(),
                "batch partially committed"
            );
            for member in &sendable {
                match failures.get(&member.path) {
                    Some(err) => {
                        failed_units.insert(member.unit);
                        let err = err.clone().with_batch_index(batch_index);
                        outcomes.push(path_outcome(
                            member,
                            batch_index,
                            DeletionStatus::Failed,
                            Some(err),
                        ));
                    }
                    None => outcomes.push(path_outcome(
                        member,
                        batch_index,
                        DeletionStatus::Deleted,
                        None,
                    )),
                }
            }
        }
        Err(cause) => {
            tracing::error!(
                batch_index = batch_index,
                wave_len = paths.len(),
                error = %cause,
                "batch commit failed"
            );
            let err = ExError::from(ArboristError::BatchCommitFailed {
                batch_index,
                reason: "store rejected the batch".to_string(),
            })
            .with_source(cause);
            for member in &sendable {
                failed_units.insert(member.unit);
                outcomes.push(path_outcome(
                    member,
                    batch_index,
                    DeletionStatus::Failed,
                    Some(err.clone()),
                ));
            }
        }
    }
}

fn path_outcome(
    member: &BatchMember,
    batch_index: usize,
    status: DeletionStatus,
    error: Option<ExError>,
) -> PathOutcome {
    PathOutcome {
        unit: member.unit,
        batch_index,
        path: member.path.clone(),
        status,
        error,
    }
}
