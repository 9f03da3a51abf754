use serde::{Deserialize, Serialize};
use std::fmt;

use super::Attributes;

/// A stored document as returned by a listing call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    #[serde(default)]
    pub attributes: Attributes,
}

impl Entity {
    pub fn new(id: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            id: id.into(),
            attributes,
        }
    }
}

/// Classifier verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Keep,
    Delete,
    Unknown,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Keep => "KEEP",
            Verdict::Delete => "DELETE",
            Verdict::Unknown => "UNKNOWN",
        })
    }
}

/// Classifier output for one entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disposition {
    pub verdict: Verdict,
    pub reason: String,
    /// Name of the rule that matched; `None` when the default policy decided
    pub matched_rule: Option<String>,
}

impl Disposition {
    /// Disposition produced by a matching rule
    pub fn from_rule(verdict: Verdict, rule: &str, reason: impl Into<String>) -> Self {
        Self {
            verdict,
            reason: reason.into(),
            matched_rule: Some(rule.to_string()),
        }
    }

    /// Disposition produced by the default policy
    pub fn from_default(verdict: Verdict, reason: impl Into<String>) -> Self {
        Self {
            verdict,
            reason: reason.into(),
            matched_rule: None,
        }
    }

    pub fn is_delete(&self) -> bool {
        self.verdict == Verdict::Delete
    }

    pub fn is_keep(&self) -> bool {
        self.verdict == Verdict::Keep
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.matched_rule {
            Some(rule) => write!(f, "{} ({}: {})", self.verdict, rule, self.reason),
            None => write!(f, "{} ({})", self.verdict, self.reason),
        }
    }
}
