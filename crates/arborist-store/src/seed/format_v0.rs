//! Seed Format v0 schema
//!
//! Defines the YAML structure of a store tree

use arborist_core::model::Attributes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level seed file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedV0 {
    /// Schema version (must be 0 for this format)
    pub schema_version: u32,

    /// Top-level collections by name
    #[serde(default)]
    pub collections: BTreeMap<String, Vec<SeedEntity>>,
}

impl SeedV0 {
    pub fn empty() -> Self {
        Self {
            schema_version: 0,
            collections: BTreeMap::new(),
        }
    }
}

fn default_exists() -> bool {
    true
}

fn is_true(value: &bool) -> bool {
    *value
}

/// Document definition in seed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedEntity {
    /// Document ID, unique within its collection
    pub id: String,

    /// Document fields
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,

    /// `false` for a path that only holds subcollections (its document was
    /// deleted while children remain)
    #[serde(default = "default_exists", skip_serializing_if = "is_true")]
    pub exists: bool,

    /// Nested collections by name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub collections: BTreeMap<String, Vec<SeedEntity>>,
}

impl SeedEntity {
    pub fn new(id: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            id: id.into(),
            attributes,
            exists: true,
            collections: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_seed() {
        let yaml = r#"
schema_version: 0
collections:
  orgs:
    - id: platform
      attributes:
        name: Platform
"#;

        let seed: SeedV0 = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(seed.schema_version, 0);
        assert_eq!(seed.collections["orgs"].len(), 1);
        assert_eq!(seed.collections["orgs"][0].id, "platform");
        assert!(seed.collections["orgs"][0].exists);
        assert_eq!(
            seed.collections["orgs"][0].attributes.get_str("name"),
            Some("Platform")
        );
    }

    #[test]
    fn test_nested_collections() {
        let yaml = r#"
schema_version: 0
collections:
  orgs:
    - id: acme
      collections:
        users:
          - id: u1
            attributes: { role: admin, tags: [a, b] }
"#;

        let seed: SeedV0 = serde_yaml::from_str(yaml).unwrap();
        let users = &seed.collections["orgs"][0].collections["users"];
        assert_eq!(users[0].id, "u1");
        assert_eq!(users[0].attributes.get_str("role"), Some("admin"));
    }
}
