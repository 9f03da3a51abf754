//! Seed importer
//!
//! Loads a validated seed into a `MemoryStore`

use arborist_core::model::EntityReference;
use std::collections::BTreeMap;
use std::path::Path;

use crate::errors::Result;
use crate::memory::MemoryStore;
use crate::seed::format_v0::{SeedEntity, SeedV0};
use crate::seed::parser::{parse_seed_file, validate_seed};

/// Import a seed into a store
///
/// Entries marked `exists: false` only contribute their subcollections.
/// Returns the number of documents inserted.
///
/// # Errors
///
/// Returns `InvalidInput` if the seed fails validation.
pub fn import_seed(store: &MemoryStore, seed: &SeedV0) -> Result<usize> {
    validate_seed(seed)?;

    let mut inserted = 0;
    let mut pending: Vec<(Option<EntityReference>, &BTreeMap<String, Vec<SeedEntity>>)> =
        vec![(None, &seed.collections)];

    while let Some((parent, collections)) = pending.pop() {
        for (collection, entities) in collections {
            for entity in entities {
                let reference = match &parent {
                    Some(parent) => parent.child(collection.as_str(), entity.id.as_str()),
                    None => EntityReference::top_level(collection.as_str(), entity.id.as_str()),
                };
                if entity.exists {
                    store.insert(reference.clone(), entity.attributes.clone());
                    inserted += 1;
                }
                if !entity.collections.is_empty() {
                    pending.push((Some(reference), &entity.collections));
                }
            }
        }
    }

    tracing::debug!(inserted, "seed imported");
    Ok(inserted)
}

/// Parse a seed file and load it into a fresh store
///
/// # Errors
///
/// Returns `InvalidInput` if the file cannot be read or fails validation.
pub fn load_seed_file(path: &Path) -> Result<MemoryStore> {
    let seed = parse_seed_file(path)?;
    let store = MemoryStore::new();
    import_seed(&store, &seed)?;
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::parse_seed_str;

    #[test]
    fn test_import_nested_seed() {
        let seed = parse_seed_str(
            r#"
schema_version: 0
collections:
  orgs:
    - id: acme
      attributes: { name: Acme }
      collections:
        users:
          - id: u1
          - id: u2
"#,
        )
        .unwrap();
        let store = MemoryStore::new();

        let inserted = import_seed(&store, &seed).unwrap();

        assert_eq!(inserted, 3);
        assert!(store.contains(&"orgs/acme/users/u2".parse().unwrap()));
    }

    #[test]
    fn test_placeholder_entries_are_not_documents() {
        let seed = parse_seed_str(
            r#"
schema_version: 0
collections:
  orgs:
    - id: gone
      exists: false
      collections:
        users: [{ id: orphan }]
"#,
        )
        .unwrap();
        let store = MemoryStore::new();

        import_seed(&store, &seed).unwrap();

        assert_eq!(store.len(), 1);
        assert!(!store.contains(&"orgs/gone".parse().unwrap()));
    }
}
