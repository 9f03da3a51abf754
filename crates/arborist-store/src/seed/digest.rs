//! State digest canonicalization
//!
//! Computes stable SHA256 digests of a store tree so runs can be compared

use arborist_core::model::Attributes;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::errors::{serialization_error, Result};
use crate::memory::MemoryStore;
use crate::seed::format_v0::SeedV0;
use crate::seed::importer::import_seed;

/// Canonical representation of one document for digest calculation
#[derive(Debug, Serialize)]
struct CanonicalDocument<'a> {
    path: String,
    attributes: &'a Attributes,
}

/// Compute a stable digest of the documents held by a store
///
/// Returns a SHA256 hex digest over the canonical JSON of every document,
/// sorted by slash path. Equal digests mean equal trees.
///
/// # Errors
///
/// Returns `Serialization` if the canonical form cannot be encoded.
pub fn compute_state_digest(store: &MemoryStore) -> Result<String> {
    let documents = store.documents();
    let mut canonical: Vec<CanonicalDocument<'_>> = documents
        .iter()
        .map(|(reference, attributes)| CanonicalDocument {
            path: reference.to_string(),
            attributes,
        })
        .collect();
    canonical.sort_by(|a, b| a.path.cmp(&b.path));

    let json = serde_json::to_string(&canonical)
        .map_err(|e| serialization_error("state_digest", e.to_string()))?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Digest of the tree a seed describes
///
/// # Errors
///
/// Returns `InvalidInput` if the seed is invalid.
pub fn compute_seed_digest(seed: &SeedV0) -> Result<String> {
    let store = MemoryStore::new();
    import_seed(&store, seed)?;
    compute_state_digest(&store)
}
