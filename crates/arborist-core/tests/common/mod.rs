use arborist_core::errors::{ExError, ExErrorKind};
use arborist_core::model::{Attributes, Entity, EntityReference};
use arborist_core::store_client::{BatchCommit, DocumentStore, StoreResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Mutex;

/// Minimal in-memory tree used to exercise the walker and classifier
///
/// The full-featured store lives in `arborist-store`; this one only knows
/// how to list and how to fail a listing under a path.
#[derive(Default)]
pub struct FakeStore {
    nodes: Mutex<BTreeMap<EntityReference, Attributes>>,
    failing_listings: HashSet<EntityReference>,
    missing_listings: HashSet<EntityReference>,
}

#[allow(dead_code)]
impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: &str, attributes: Attributes) -> EntityReference {
        let reference: EntityReference = path.parse().unwrap();
        self.nodes
            .lock()
            .unwrap()
            .insert(reference.clone(), attributes);
        reference
    }

    pub fn insert_path(&self, path: &str) -> EntityReference {
        self.insert(path, Attributes::new())
    }

    /// Listing child collections under `path` fails with `Unavailable`
    pub fn fail_listing_under(mut self, path: &str) -> Self {
        self.failing_listings.insert(path.parse().unwrap());
        self
    }

    /// Listing child collections under `path` reports `NotFound`
    pub fn missing_listing_under(mut self, path: &str) -> Self {
        self.missing_listings.insert(path.parse().unwrap());
        self
    }
}

#[async_trait]
impl DocumentStore for FakeStore {
    async fn check_access(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn list_top_level(&self, collection: &str) -> StoreResult<Vec<Entity>> {
        let nodes = self.nodes.lock().unwrap();
        Ok(nodes
            .iter()
            .filter(|(r, _)| r.depth() == 1 && r.leaf_collection() == collection)
            .map(|(r, a)| Entity::new(r.leaf_id(), a.clone()))
            .collect())
    }

    async fn list_child_collections(&self, path: &EntityReference) -> StoreResult<Vec<String>> {
        if self.failing_listings.contains(path) {
            return Err(ExError::new(ExErrorKind::Unavailable)
                .with_entity_path(path.to_string())
                .with_message("injected listing failure"));
        }
        if self.missing_listings.contains(path) {
            return Err(ExError::new(ExErrorKind::NotFound).with_entity_path(path.to_string()));
        }
        let nodes = self.nodes.lock().unwrap();
        let collections: BTreeSet<String> = nodes
            .keys()
            .filter(|r| r.parent().as_ref() == Some(path))
            .map(|r| r.leaf_collection().to_string())
            .collect();
        Ok(collections.into_iter().collect())
    }

    async fn list_documents(
        &self,
        path: &EntityReference,
        collection: &str,
    ) -> StoreResult<Vec<Entity>> {
        let nodes = self.nodes.lock().unwrap();
        Ok(nodes
            .iter()
            .filter(|(r, _)| r.parent().as_ref() == Some(path) && r.leaf_collection() == collection)
            .map(|(r, a)| Entity::new(r.leaf_id(), a.clone()))
            .collect())
    }

    async fn delete_batch(&self, paths: &[EntityReference]) -> StoreResult<BatchCommit> {
        let mut nodes = self.nodes.lock().unwrap();
        for path in paths {
            nodes.remove(path);
        }
        Ok(BatchCommit::Committed)
    }

    async fn get_by_id(&self, path: &EntityReference) -> StoreResult<Option<Attributes>> {
        Ok(self.nodes.lock().unwrap().get(path).cloned())
    }
}

/// Parse a slash path, panicking on malformed test input
#[allow(dead_code)]
pub fn path(s: &str) -> EntityReference {
    s.parse().unwrap()
}
