//! Classification stage

use arborist_core::errors::ExError;
use arborist_core::model::{EntityReference, TargetOutcome};
use arborist_core::rules::Classifier;
use arborist_core::store_client::DocumentStore;
use arborist_core::{log_op_end, log_op_error, log_op_start};
use std::time::Instant;

use crate::Result;

/// List the root collection and classify every top-level entity
///
/// Outcomes are returned in listing order, one per entity. Only the listing
/// can fail; classification itself is pure.
///
/// # Errors
///
/// Returns the store error if the top-level listing fails.
pub async fn classify_top_level<S>(
    store: &S,
    root_collection: &str,
    classifier: &Classifier,
) -> Result<Vec<TargetOutcome>>
where
    S: DocumentStore + ?Sized,
{
    log_op_start!("classify", collection = root_collection);
    let start = Instant::now();

    let entities = match store.list_top_level(root_collection).await {
        Ok(entities) => entities,
        Err(err) => {
            let err: ExError = err.with_collection(root_collection);
            log_op_error!(
                "classify",
                err.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            return Err(err);
        }
    };

    let outcomes: Vec<TargetOutcome> = entities
        .into_iter()
        .map(|entity| {
            let disposition = classifier.classify(&entity.id, &entity.attributes);
            tracing::debug!(
                id = %entity.id,
                verdict = %disposition.verdict,
                rule = disposition.matched_rule.as_deref().unwrap_or("-"),
                "classified"
            );
            TargetOutcome::new(
                EntityReference::top_level(root_collection, entity.id),
                disposition,
            )
        })
        .collect();

    log_op_end!(
        "classify",
        duration_ms = start.elapsed().as_millis() as u64,
        collection = root_collection,
        total = outcomes.len(),
        target_count = outcomes.iter().filter(|o| o.is_target()).count()
    );
    Ok(outcomes)
}
