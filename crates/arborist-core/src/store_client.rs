//! Document store client seam
//!
//! The engine never talks to a concrete backend. Every stage takes a
//! `DocumentStore` passed in by the caller, so tests and the CLI can inject
//! the in-memory store while production callers supply their own client.

use async_trait::async_trait;
use std::sync::Arc;

use crate::errors::ExError;
use crate::model::{Attributes, Entity, EntityReference};

/// Atomic write limit of the store: no batch may carry more paths than this
pub const MAX_BATCH_SIZE: usize = 500;

/// Result type for store calls
pub type StoreResult<T> = std::result::Result<T, ExError>;

/// Outcome of a `delete_batch` call that reached the store
#[derive(Debug, Clone, PartialEq)]
pub enum BatchCommit {
    /// Every path in the batch was deleted
    Committed,
    /// The listed paths failed; every other path in the batch was deleted
    PartialFailure(Vec<(EntityReference, ExError)>),
}

/// Client for a hierarchical, eventually-consistent document store
///
/// Errors are `ExError` values; their kind drives engine policy
/// (`NotFound` during discovery is an empty result, `Timeout` and
/// `Unavailable` are retried, `AuthenticationFailed` aborts the run).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Authentication and permission probe
    async fn check_access(&self) -> StoreResult<()>;

    /// List the documents of a top-level collection
    async fn list_top_level(&self, collection: &str) -> StoreResult<Vec<Entity>>;

    /// List the names of the collections nested under a document
    async fn list_child_collections(&self, path: &EntityReference) -> StoreResult<Vec<String>>;

    /// List the documents of one collection nested under a document
    async fn list_documents(
        &self,
        path: &EntityReference,
        collection: &str,
    ) -> StoreResult<Vec<Entity>>;

    /// Delete up to `MAX_BATCH_SIZE` documents as one atomic write
    ///
    /// An `Err` means nothing in the batch was committed.
    async fn delete_batch(&self, paths: &[EntityReference]) -> StoreResult<BatchCommit>;

    /// Point read of one document
    async fn get_by_id(&self, path: &EntityReference) -> StoreResult<Option<Attributes>>;
}

#[async_trait]
impl<T: DocumentStore + ?Sized> DocumentStore for Arc<T> {
    async fn check_access(&self) -> StoreResult<()> {
        (**self).check_access().await
    }

    async fn list_top_level(&self, collection: &str) -> StoreResult<Vec<Entity>> {
        (**self).list_top_level(collection).await
    }

    async fn list_child_collections(&self, path: &EntityReference) -> StoreResult<Vec<String>> {
        (**self).list_child_collections(path).await
    }

    async fn list_documents(
        &self,
        path: &EntityReference,
        collection: &str,
    ) -> StoreResult<Vec<Entity>> {
        (**self).list_documents(path, collection).await
    }

    async fn delete_batch(&self, paths: &[EntityReference]) -> StoreResult<BatchCommit> {
        (**self).delete_batch(paths).await
    }

    async fn get_by_id(&self, path: &EntityReference) -> StoreResult<Option<Attributes>> {
        (**self).get_by_id(path).await
    }
}
