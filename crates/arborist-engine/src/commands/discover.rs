//! Discovery stage
//!
//! Walks the subtree of every delete target. Walks are read-only and
//! independent, so up to `concurrency` of them run at once; results come
//! back in target order.

use arborist_core::model::EntityReference;
use arborist_core::store_client::DocumentStore;
use arborist_core::traversal::{discover, Discovery};
use arborist_core::{log_op_end, log_op_start};
use futures::stream::{self, StreamExt};
use std::time::Instant;

/// Discover the subtrees of `targets`, at most `concurrency` at a time
///
/// Failures are recorded per subtree inside each `Discovery` and never abort
/// the stage.
pub async fn discover_targets<S>(
    store: &S,
    targets: &[EntityReference],
    max_depth: usize,
    concurrency: usize,
) -> Vec<Discovery>
where
    S: DocumentStore + ?Sized,
{
    log_op_start!(
        "discover_targets",
        target_count = targets.len(),
        concurrency = concurrency
    );
    let start = Instant::now();

    let discoveries: Vec<Discovery> = stream::iter(targets)
        .map(|target| discover(store, target, max_depth))
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let incomplete = discoveries.iter().filter(|d| !d.is_complete()).count();
    log_op_end!(
        "discover_targets",
        duration_ms = start.elapsed().as_millis() as u64,
        target_count = targets.len(),
        incomplete = incomplete
    );
    discoveries
}
