//! Consistency verifier
//!
//! The store's read path lags its writes, so a successful `delete_batch` does
//! not prove a document is gone. After a settle delay the verifier reads
//! every attempted target back twice over: once through a single listing of
//! the root collection and once through a point read.

use arborist_core::errors::{ArboristError, ExError};
use arborist_core::model::{EntityReference, RunReport, VerificationStatus};
use arborist_core::store_client::DocumentStore;
use arborist_core::{log_op_end, log_op_start};
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Verification result for one target
#[derive(Debug, Clone, PartialEq)]
pub struct Verification {
    pub reference: EntityReference,
    pub status: VerificationStatus,
    /// Set when the point read failed
    pub error: Option<ExError>,
}

/// Verify that every `attempted` target is gone
///
/// Results are GONE, STILL_EXISTS or READ_FAILED, in `attempted` order. A
/// failed listing is logged and verification falls back to point reads.
/// Nothing is read when `attempted` is empty.
pub async fn verify<S>(
    store: &S,
    root_collection: &str,
    attempted: &[EntityReference],
    settle_delay: Duration,
) -> Vec<Verification>
where
    S: DocumentStore + ?Sized,
{
    if attempted.is_empty() {
        return Vec::new();
    }

    log_op_start!(
        "verify",
        collection = root_collection,
        target_count = attempted.len(),
        settle_delay_ms = settle_delay.as_millis() as u64
    );
    let start = Instant::now();

    if !settle_delay.is_zero() {
        tokio::time::sleep(settle_delay).await;
    }

    let listed: Option<HashSet<String>> = match store.list_top_level(root_collection).await {
        Ok(entities) => Some(entities.into_iter().map(|e| e.id).collect()),
        Err(err) => {
            tracing::warn!(
                collection = root_collection,
                error = %err,
                "verification listing failed, falling back to point reads"
            );
            None
        }
    };

    let mut results = Vec::with_capacity(attempted.len());
    for reference in attempted {
        let in_listing = listed.as_ref().is_some_and(|ids| {
            reference.depth() == 1
                && reference.leaf_collection() == root_collection
                && ids.contains(reference.leaf_id())
        });

        // Always point-read, even when the listing already shows the target
        let read = store.get_by_id(reference).await;
        let (status, error) = match read {
            Ok(Some(_)) => (VerificationStatus::StillExists, None),
            Ok(None) if in_listing => (VerificationStatus::StillExists, None),
            Ok(None) => (VerificationStatus::Gone, None),
            Err(_) if in_listing => (VerificationStatus::StillExists, None),
            Err(cause) => {
                let err = ExError::from(ArboristError::VerificationReadFailed {
                    path: reference.to_string(),
                    reason: "point read failed".to_string(),
                })
                .with_source(cause);
                (VerificationStatus::ReadFailed, Some(err))
            }
        };

        if status == VerificationStatus::StillExists {
            tracing::warn!(
                entity_path = %reference,
                in_listing,
                "target still visible after delete"
            );
        }
        results.push(Verification {
            reference: reference.clone(),
            status,
            error,
        });
    }

    let gone = results
        .iter()
        .filter(|v| v.status == VerificationStatus::Gone)
        .count();
    log_op_end!(
        "verify",
        duration_ms = start.elapsed().as_millis() as u64,
        target_count = results.len(),
        gone = gone,
        listing_ok = listed.is_some()
    );
    results
}

/// Second verification pass over the stragglers of a finished report
///
/// Re-verifies every target left STILL_EXISTS or READ_FAILED and updates
/// the report in place. Returns the number of targets re-verified. Each call
/// is exactly one pass.
pub async fn reverify_stragglers<S>(
    store: &S,
    report: &mut RunReport,
    settle_delay: Duration,
) -> usize
where
    S: DocumentStore + ?Sized,
{
    let stragglers: Vec<EntityReference> = report
        .stragglers()
        .map(|o| o.reference.clone())
        .collect();
    if stragglers.is_empty() {
        return 0;
    }

    tracing::info!(
        run_id = %report.run_id,
        stragglers = stragglers.len(),
        "second verification pass"
    );
    let results = verify(store, &report.root_collection, &stragglers, settle_delay).await;
    apply_verifications(report, results);
    stragglers.len()
}

/// Copy verification results onto the matching report outcomes
pub(crate) fn apply_verifications(report: &mut RunReport, results: Vec<Verification>) {
    for result in results {
        if let Some(outcome) = report
            .outcomes
            .iter_mut()
            .find(|o| o.reference == result.reference)
        {
            outcome.verification = result.status;
            if let Some(err) = result.error {
                outcome.push_error(err);
            }
        }
    }
}
