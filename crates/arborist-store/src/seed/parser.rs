//! Seed parser with validation
//!
//! Parses YAML and validates schema version, names and id uniqueness

use crate::errors::{seed_validation, Result};
use crate::seed::format_v0::{SeedEntity, SeedV0};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

/// Parse a seed file from a path
///
/// # Errors
///
/// Returns `InvalidInput` if the file cannot be read, is not valid YAML, or
/// fails validation.
pub fn parse_seed_file(path: &Path) -> Result<SeedV0> {
    let content = fs::read_to_string(path)
        .map_err(|e| seed_validation(&format!("Failed to read seed file: {}", e)))?;

    parse_seed_str(&content)
}

/// Parse a seed from a string
///
/// # Errors
///
/// Returns `InvalidInput` if the YAML is malformed or fails validation.
pub fn parse_seed_str(content: &str) -> Result<SeedV0> {
    let seed: SeedV0 = serde_yaml::from_str(content)
        .map_err(|e| seed_validation(&format!("YAML parse error: {}", e)))?;

    validate_seed(&seed)?;

    Ok(seed)
}

/// Validate a parsed seed
///
/// # Errors
///
/// Returns `InvalidInput` naming the first offending collection or id.
pub fn validate_seed(seed: &SeedV0) -> Result<()> {
    if seed.schema_version != 0 {
        return Err(seed_validation(&format!(
            "Unsupported schema_version: {}. Expected 0",
            seed.schema_version
        )));
    }

    // Explicit worklist of (parent path, collections) pairs
    let mut pending: Vec<(String, &BTreeMap<String, Vec<SeedEntity>>)> =
        vec![(String::new(), &seed.collections)];

    while let Some((parent, collections)) = pending.pop() {
        for (name, entities) in collections {
            let location = if parent.is_empty() {
                name.clone()
            } else {
                format!("{}/{}", parent, name)
            };
            check_component(name, "collection name", &location)?;

            let mut ids = HashSet::new();
            for entity in entities {
                check_component(&entity.id, "id", &location)?;
                if !ids.insert(entity.id.as_str()) {
                    return Err(seed_validation(&format!(
                        "Duplicate id '{}' in collection {}",
                        entity.id, location
                    )));
                }
                if !entity.exists && entity.collections.is_empty() {
                    return Err(seed_validation(&format!(
                        "Entry '{}/{}' has exists: false but no collections",
                        location, entity.id
                    )));
                }
                if !entity.collections.is_empty() {
                    pending.push((format!("{}/{}", location, entity.id), &entity.collections));
                }
            }
        }
    }

    Ok(())
}

fn check_component(value: &str, what: &str, location: &str) -> Result<()> {
    if value.is_empty() {
        return Err(seed_validation(&format!("Empty {} in {}", what, location)));
    }
    if value.contains('/') {
        return Err(seed_validation(&format!(
            "{} '{}' in {} must not contain '/'",
            what, value, location
        )));
    }
    Ok(())
}
