//! Seed exporter
//!
//! Writes the current store state back out as a seed so file-backed runs
//! persist their deletions.

use arborist_core::model::{Attributes, PathSegment};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::errors::{io_error, serialization_error, Result};
use crate::memory::MemoryStore;
use crate::seed::format_v0::{SeedEntity, SeedV0};

/// Snapshot the store as a seed
///
/// A path whose document is gone but which still holds documents below it
/// is written as an `exists: false` entry.
pub fn export_seed(store: &MemoryStore) -> SeedV0 {
    let mut seed = SeedV0::empty();
    for (reference, attributes) in store.documents() {
        place(&mut seed.collections, reference.segments(), &attributes);
    }
    seed
}

fn place(
    collections: &mut BTreeMap<String, Vec<SeedEntity>>,
    segments: &[PathSegment],
    attributes: &Attributes,
) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };

    let entities = collections.entry(head.collection.clone()).or_default();
    let index = match entities.iter().position(|e| e.id == head.id) {
        Some(index) => index,
        None => {
            let mut placeholder = SeedEntity::new(head.id.clone(), Attributes::new());
            placeholder.exists = false;
            entities.push(placeholder);
            entities.len() - 1
        }
    };

    let entity = &mut entities[index];
    if rest.is_empty() {
        entity.exists = true;
        entity.attributes = attributes.clone();
    } else {
        place(&mut entity.collections, rest, attributes);
    }
}

/// Write a seed to `path` atomically (temp file then rename)
///
/// # Errors
///
/// Returns `Serialization` if encoding fails and `Io` if the file cannot be
/// written.
pub fn write_seed_file(path: &Path, seed: &SeedV0) -> Result<()> {
    let yaml = serde_yaml::to_string(seed)
        .map_err(|e| serialization_error("seed_export", e.to_string()))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| io_error("create_seed_dir", e))?;
        }
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, yaml).map_err(|e| io_error("write_seed_temp", e))?;
    fs::rename(&temp_path, path).map_err(|e| io_error("rename_seed_temp", e))?;

    Ok(())
}
