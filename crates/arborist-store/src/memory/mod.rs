//! In-memory document store
//!
//! Documents are kept in a map keyed by their full path. Deleting a document
//! never deletes its subcollections: children of a deleted parent stay
//! addressable by path, which is how the backing stores this models behave.

mod faults;

pub use faults::FaultPlan;

use arborist_core::errors::{ExError, ExErrorKind};
use arborist_core::model::{Attributes, Entity, EntityReference};
use arborist_core::store_client::{BatchCommit, DocumentStore, StoreResult, MAX_BATCH_SIZE};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::errors::{access_denied, injected};

#[derive(Debug, Default)]
struct State {
    documents: BTreeMap<EntityReference, Attributes>,
    /// Deleted documents still visible on the read path, with reads left
    stale: HashMap<EntityReference, (Attributes, u32)>,
    delete_calls: Vec<Vec<EntityReference>>,
    top_level_calls: usize,
}

/// Thread-safe in-memory `DocumentStore`
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    faults: Mutex<FaultPlan>,
}

impl MemoryStore {
    /// Create a new empty store with no faults
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of `set_faults`
    pub fn with_faults(self, faults: FaultPlan) -> Self {
        self.set_faults(faults);
        self
    }

    /// Replace the active fault plan
    pub fn set_faults(&self, faults: FaultPlan) {
        *self.faults.lock().unwrap_or_else(PoisonError::into_inner) = faults;
    }

    pub fn clear_faults(&self) {
        self.set_faults(FaultPlan::default());
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn faults(&self) -> FaultPlan {
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Insert or replace a document
    pub fn insert(&self, reference: EntityReference, attributes: Attributes) {
        self.state().documents.insert(reference, attributes);
    }

    pub fn contains(&self, reference: &EntityReference) -> bool {
        self.state().documents.contains_key(reference)
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.state().documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().documents.is_empty()
    }

    /// Every stored document in path order
    pub fn documents(&self) -> Vec<(EntityReference, Attributes)> {
        self.state()
            .documents
            .iter()
            .map(|(r, a)| (r.clone(), a.clone()))
            .collect()
    }

    /// Paths passed to every `delete_batch` call so far, failed calls included
    pub fn delete_calls(&self) -> Vec<Vec<EntityReference>> {
        self.state().delete_calls.clone()
    }

    pub fn delete_call_count(&self) -> usize {
        self.state().delete_calls.len()
    }

    /// Forget recorded calls, keeping the documents
    pub fn reset_call_log(&self) {
        let mut state = self.state();
        state.delete_calls.clear();
        state.top_level_calls = 0;
    }

    async fn apply_latency(&self) {
        if let Some(latency) = self.faults().latency {
            tokio::time::sleep(latency).await;
        }
    }
}

/// Documents strictly below `parent` are contiguous after it in path order
fn descendants<'a>(
    documents: &'a BTreeMap<EntityReference, Attributes>,
    parent: &'a EntityReference,
) -> impl Iterator<Item = (&'a EntityReference, &'a Attributes)> + 'a {
    documents
        .range(parent.clone()..)
        .skip_while(move |(r, _)| *r == parent)
        .take_while(move |(r, _)| parent.is_ancestor_of(r))
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn check_access(&self) -> StoreResult<()> {
        self.apply_latency().await;
        if self.faults().deny_access {
            return Err(access_denied());
        }
        Ok(())
    }

    async fn list_top_level(&self, collection: &str) -> StoreResult<Vec<Entity>> {
        self.apply_latency().await;
        let faults = self.faults();
        let mut state = self.state();
        state.top_level_calls += 1;
        if let Some(kind) = faults.top_level_failures.get(&state.top_level_calls) {
            return Err(injected(*kind, "list_top_level", None).with_collection(collection));
        }

        let mut entities: BTreeMap<String, Attributes> = state
            .documents
            .iter()
            .filter(|(r, _)| r.depth() == 1 && r.leaf_collection() == collection)
            .map(|(r, a)| (r.leaf_id().to_string(), a.clone()))
            .collect();

        for (reference, (attributes, reads_left)) in state.stale.iter_mut() {
            if reference.depth() == 1 && reference.leaf_collection() == collection {
                entities.insert(reference.leaf_id().to_string(), attributes.clone());
                *reads_left = reads_left.saturating_sub(1);
            }
        }
        state.stale.retain(|_, (_, reads_left)| *reads_left > 0);

        Ok(entities
            .into_iter()
            .map(|(id, attributes)| Entity::new(id, attributes))
            .collect())
    }

    async fn list_child_collections(&self, path: &EntityReference) -> StoreResult<Vec<String>> {
        self.apply_latency().await;
        if self.faults().failing_listings.contains(path) {
            return Err(injected(
                ExErrorKind::Persistence,
                "list_child_collections",
                Some(path),
            ));
        }

        let state = self.state();
        let collections: BTreeSet<String> = descendants(&state.documents, path)
            .filter(|(r, _)| r.depth() == path.depth() + 1)
            .map(|(r, _)| r.leaf_collection().to_string())
            .collect();
        Ok(collections.into_iter().collect())
    }

    async fn list_documents(
        &self,
        path: &EntityReference,
        collection: &str,
    ) -> StoreResult<Vec<Entity>> {
        self.apply_latency().await;
        let state = self.state();
        Ok(descendants(&state.documents, path)
            .filter(|(r, _)| r.depth() == path.depth() + 1 && r.leaf_collection() == collection)
            .map(|(r, a)| Entity::new(r.leaf_id(), a.clone()))
            .collect())
    }

    async fn delete_batch(&self, paths: &[EntityReference]) -> StoreResult<BatchCommit> {
        self.apply_latency().await;
        let faults = self.faults();
        let mut state = self.state();
        state.delete_calls.push(paths.to_vec());
        let call = state.delete_calls.len();

        if paths.len() > MAX_BATCH_SIZE {
            return Err(ExError::new(ExErrorKind::InvalidInput)
                .with_op("delete_batch")
                .with_message(format!(
                    "batch of {} exceeds the atomic write limit of {}",
                    paths.len(),
                    MAX_BATCH_SIZE
                )));
        }
        if let Some(kind) = faults.delete_call_failures.get(&call) {
            tracing::debug!(call, ?kind, "injected delete_batch failure");
            return Err(injected(*kind, "delete_batch", None));
        }
        if faults.ignore_deletes {
            return Ok(BatchCommit::Committed);
        }

        let mut failures = Vec::new();
        for path in paths {
            if faults.failing_batch_paths.contains(path) {
                failures.push((
                    path.clone(),
                    injected(ExErrorKind::PermissionDenied, "delete_batch", Some(path)),
                ));
                continue;
            }
            if let Some(attributes) = state.documents.remove(path) {
                if faults.stale_reads > 0 {
                    state
                        .stale
                        .insert(path.clone(), (attributes, faults.stale_reads));
                }
            }
        }

        if failures.is_empty() {
            Ok(BatchCommit::Committed)
        } else {
            Ok(BatchCommit::PartialFailure(failures))
        }
    }

    async fn get_by_id(&self, path: &EntityReference) -> StoreResult<Option<Attributes>> {
        self.apply_latency().await;
        if self.faults().failing_point_reads.contains(path) {
            return Err(injected(ExErrorKind::Persistence, "get_by_id", Some(path)));
        }

        let mut state = self.state();
        if let Some(attributes) = state.documents.get(path) {
            return Ok(Some(attributes.clone()));
        }
        let stale = match state.stale.get_mut(path) {
            Some((attributes, reads_left)) => {
                *reads_left = reads_left.saturating_sub(1);
                Some((attributes.clone(), *reads_left))
            }
            None => None,
        };
        match stale {
            Some((attributes, reads_left)) => {
                if reads_left == 0 {
                    state.stale.remove(path);
                }
                Ok(Some(attributes))
            }
            None => Ok(None),
        }
    }
}
