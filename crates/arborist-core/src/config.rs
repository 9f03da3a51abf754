//! Run configuration
//!
//! A run is configured by a TOML document supplied by the caller. Nothing
//! here is hardcoded per deployment: the rule set, settle delay, batch size
//! and root collection all come from the file (or CLI overrides).
//!
//! ```toml
//! root_collection = "organizations"
//! default_policy = "keep"
//! settle_delay_ms = 2000
//!
//! [[rules]]
//! name = "core-tenants"
//! verdict = "keep"
//! predicate = { kind = "exact_id", ids = ["platform"] }
//!
//! [[rules]]
//! name = "test-orgs"
//! verdict = "delete"
//! reason = "integration test tenant"
//! predicate = { kind = "id_prefix", prefix = "test-org-" }
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{ArboristError, Result};
use crate::policy::DefaultPolicy;
use crate::rules::{Classifier, Predicate, Rule, RuleSet, RuleVerdict};
use crate::store_client::MAX_BATCH_SIZE;

pub const DEFAULT_SETTLE_DELAY_MS: u64 = 2000;
pub const DEFAULT_MAX_DEPTH: usize = 16;
pub const MAX_DEPTH_LIMIT: usize = 64;
pub const DEFAULT_DISCOVERY_CONCURRENCY: usize = 4;

/// Store-call timeout and retry settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySettings {
    pub call_timeout_ms: u64,
    pub attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            call_timeout_ms: 10_000,
            attempts: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 2000,
        }
    }
}

/// Predicate as written in the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredicateSpec {
    ExactId {
        ids: Vec<String>,
    },
    IdPrefix {
        prefix: String,
    },
    IdRegex {
        pattern: String,
    },
    FieldEquals {
        field: String,
        value: serde_json::Value,
    },
    NameContains {
        fields: Vec<String>,
        needle: String,
        #[serde(default)]
        case_insensitive: bool,
    },
    TagContains {
        field: String,
        tag: String,
    },
}

/// Rule as written in the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    pub name: String,
    pub verdict: RuleVerdict,
    #[serde(default)]
    pub reason: String,
    pub predicate: PredicateSpec,
}

impl RuleSpec {
    /// Compile into a `Rule`, validating the predicate
    ///
    /// # Errors
    ///
    /// Returns `InvalidRule` for an empty name, an empty id set, prefix or
    /// needle, or a pattern that does not compile.
    pub fn compile(&self) -> Result<Rule> {
        let invalid = |reason: &str| ArboristError::InvalidRule {
            rule: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("rule name must not be empty"));
        }

        let predicate = match &self.predicate {
            PredicateSpec::ExactId { ids } => {
                if ids.is_empty() || ids.iter().any(|id| id.is_empty()) {
                    return Err(invalid("exact_id needs at least one non-empty id"));
                }
                Predicate::exact_ids(ids.iter().cloned())
            }
            PredicateSpec::IdPrefix { prefix } => {
                if prefix.is_empty() {
                    return Err(invalid("id_prefix must not be empty"));
                }
                Predicate::id_prefix(prefix.clone())
            }
            PredicateSpec::IdRegex { pattern } => {
                let re = Regex::new(pattern).map_err(|e| ArboristError::InvalidRule {
                    rule: self.name.clone(),
                    reason: format!("bad pattern: {}", e),
                })?;
                Predicate::IdRegex(re)
            }
            PredicateSpec::FieldEquals { field, value } => {
                if field.is_empty() {
                    return Err(invalid("field_equals needs a field name"));
                }
                Predicate::FieldEquals {
                    field: field.clone(),
                    value: value.clone(),
                }
            }
            PredicateSpec::NameContains {
                fields,
                needle,
                case_insensitive,
            } => {
                if fields.is_empty() || needle.is_empty() {
                    return Err(invalid("name_contains needs fields and a non-empty needle"));
                }
                Predicate::name_contains(fields.iter().cloned(), needle.clone(), *case_insensitive)
            }
            PredicateSpec::TagContains { field, tag } => {
                if field.is_empty() || tag.is_empty() {
                    return Err(invalid("tag_contains needs a field and a non-empty tag"));
                }
                Predicate::TagContains {
                    field: field.clone(),
                    tag: tag.clone(),
                }
            }
        };

        Ok(Rule {
            name: self.name.clone(),
            verdict: self.verdict,
            predicate,
            reason: self.reason.clone(),
        })
    }
}

fn default_settle_delay_ms() -> u64 {
    DEFAULT_SETTLE_DELAY_MS
}

fn default_batch_size() -> usize {
    MAX_BATCH_SIZE
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_discovery_concurrency() -> usize {
    DEFAULT_DISCOVERY_CONCURRENCY
}

/// Complete configuration of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub root_collection: String,
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_discovery_concurrency")]
    pub discovery_concurrency: usize,
    #[serde(default)]
    pub default_policy: DefaultPolicy,
    /// Upper bound on delete targets per run; 0 disables the guard
    #[serde(default)]
    pub max_targets: usize,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

impl RunConfig {
    /// Configuration with defaults and no rules
    pub fn new(root_collection: impl Into<String>) -> Self {
        Self {
            root_collection: root_collection.into(),
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            batch_size: MAX_BATCH_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
            discovery_concurrency: DEFAULT_DISCOVERY_CONCURRENCY,
            default_policy: DefaultPolicy::default(),
            max_targets: 0,
            retry: RetrySettings::default(),
            rules: Vec::new(),
        }
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    ///
    /// Returns `Serialization` if the TOML is malformed and `ConfigInvalid`
    /// or `InvalidRule` if a value fails validation.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: RunConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` if the file cannot be read, otherwise as
    /// `from_toml_str`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ArboristError::ConfigInvalid {
            field: path.display().to_string(),
            reason: format!("cannot read config file: {}", e),
        })?;
        Self::from_toml_str(&text)
    }

    /// Validate every field and rule
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigInvalid` or `InvalidRule` found.
    pub fn validate(&self) -> Result<()> {
        let invalid = |field: &str, reason: String| {
            Err(ArboristError::ConfigInvalid {
                field: field.to_string(),
                reason,
            })
        };

        if self.root_collection.trim().is_empty() || self.root_collection.contains('/') {
            return invalid(
                "root_collection",
                "must be a non-empty collection name without '/'".to_string(),
            );
        }
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return invalid(
                "batch_size",
                format!("must be between 1 and {}", MAX_BATCH_SIZE),
            );
        }
        if self.max_depth == 0 || self.max_depth > MAX_DEPTH_LIMIT {
            return invalid(
                "max_depth",
                format!("must be between 1 and {}", MAX_DEPTH_LIMIT),
            );
        }
        if self.discovery_concurrency == 0 {
            return invalid("discovery_concurrency", "must be at least 1".to_string());
        }
        if self.retry.attempts == 0 {
            return invalid("retry.attempts", "must be at least 1".to_string());
        }
        if self.retry.call_timeout_ms == 0 {
            return invalid("retry.call_timeout_ms", "must be at least 1".to_string());
        }

        let mut seen = std::collections::HashSet::new();
        for spec in &self.rules {
            spec.compile()?;
            if !seen.insert(spec.name.as_str()) {
                return Err(ArboristError::InvalidRule {
                    rule: spec.name.clone(),
                    reason: "duplicate rule name".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Build the classifier for this configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidRule` if a rule fails to compile.
    pub fn compile(&self) -> Result<Classifier> {
        let rules = self
            .rules
            .iter()
            .map(RuleSpec::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(Classifier::new(RuleSet::new(rules), self.default_policy))
    }
}
