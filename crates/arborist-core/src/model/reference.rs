use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{ArboristError, Result};

/// One `(collection, id)` step in an entity path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathSegment {
    pub collection: String,
    pub id: String,
}

impl PathSegment {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

/// Location of an entity in the store tree
///
/// An ordered, non-empty list of `(collection, id)` segments. The slash form
/// `orgs/acme/users/u1` is used for display, parsing and serialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityReference {
    segments: Vec<PathSegment>,
}

impl EntityReference {
    /// Reference to a document in a top-level collection
    pub fn top_level(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            segments: vec![PathSegment::new(collection, id)],
        }
    }

    /// Build a reference from explicit segments
    ///
    /// # Errors
    ///
    /// Returns `InvalidEntityPath` if `segments` is empty or any component is
    /// empty or contains `/`.
    pub fn from_segments(segments: Vec<PathSegment>) -> Result<Self> {
        let reference = Self { segments };
        reference.validate()?;
        Ok(reference)
    }

    /// Reference to a document in a child collection of this entity
    pub fn child(&self, collection: impl Into<String>, id: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::new(collection, id));
        Self { segments }
    }

    /// The owning entity, or `None` for a top-level entity
    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() <= 1 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Number of segments (1 for a top-level entity)
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Id of the addressed entity
    pub fn leaf_id(&self) -> &str {
        self.segments
            .last()
            .map(|s| s.id.as_str())
            .unwrap_or_default()
    }

    /// Collection holding the addressed entity
    pub fn leaf_collection(&self) -> &str {
        self.segments
            .last()
            .map(|s| s.collection.as_str())
            .unwrap_or_default()
    }

    /// True if `other` lies strictly below this entity
    pub fn is_ancestor_of(&self, other: &EntityReference) -> bool {
        other.segments.len() > self.segments.len()
            && other.segments[..self.segments.len()] == self.segments[..]
    }

    fn validate(&self) -> Result<()> {
        if self.segments.is_empty() {
            return Err(ArboristError::InvalidEntityPath {
                path: String::new(),
                reason: "path has no segments".to_string(),
            });
        }
        for segment in &self.segments {
            for part in [&segment.collection, &segment.id] {
                if part.is_empty() || part.contains('/') {
                    return Err(ArboristError::InvalidEntityPath {
                        path: self.to_string(),
                        reason: format!("invalid component '{}'", part),
                    });
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for EntityReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.segments {
            if !first {
                f.write_str("/")?;
            }
            write!(f, "{}/{}", segment.collection, segment.id)?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for EntityReference {
    type Err = ArboristError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim_matches('/').split('/').collect();
        if parts.len() % 2 != 0 || parts.iter().any(|p| p.is_empty()) {
            return Err(ArboristError::InvalidEntityPath {
                path: s.to_string(),
                reason: "expected collection/id pairs".to_string(),
            });
        }
        let segments = parts
            .chunks(2)
            .map(|pair| PathSegment::new(pair[0], pair[1]))
            .collect();
        Self::from_segments(segments)
    }
}

impl TryFrom<String> for EntityReference {
    type Error = ArboristError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<EntityReference> for String {
    fn from(reference: EntityReference) -> Self {
        reference.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let r: EntityReference = "orgs/acme/users/u1".parse().unwrap();
        assert_eq!(r.depth(), 2);
        assert_eq!(r.leaf_id(), "u1");
        assert_eq!(r.leaf_collection(), "users");
        assert_eq!(r.to_string(), "orgs/acme/users/u1");
    }

    #[test]
    fn test_parse_rejects_odd_components() {
        assert!("orgs/acme/users".parse::<EntityReference>().is_err());
        assert!("orgs//users/u1".parse::<EntityReference>().is_err());
        assert!("".parse::<EntityReference>().is_err());
    }

    #[test]
    fn test_parent_and_child() {
        let root = EntityReference::top_level("orgs", "acme");
        let child = root.child("users", "u1");

        assert_eq!(child.parent(), Some(root.clone()));
        assert_eq!(root.parent(), None);
        assert!(root.is_ancestor_of(&child));
        assert!(!child.is_ancestor_of(&root));
        assert!(!root.is_ancestor_of(&root));
    }

    #[test]
    fn test_sibling_prefix_is_not_ancestor() {
        let a = EntityReference::top_level("orgs", "acme");
        let b = EntityReference::top_level("orgs", "acme-2").child("users", "u1");
        assert!(!a.is_ancestor_of(&b));
    }

    #[test]
    fn test_from_segments_rejects_slash_in_id() {
        let result = EntityReference::from_segments(vec![PathSegment::new("orgs", "a/b")]);
        assert!(matches!(
            result,
            Err(ArboristError::InvalidEntityPath { .. })
        ));
    }

    #[test]
    fn test_serde_uses_slash_form() {
        let r = EntityReference::top_level("orgs", "acme").child("users", "u1");
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, "\"orgs/acme/users/u1\"");
        let back: EntityReference = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
