//! Run policies
//!
//! `DefaultPolicy` decides what happens to entities no rule matches.
//! `ExecuteGuard` is consulted once, after discovery and before the first
//! mutating call, and can veto the whole run.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{ExError, ExErrorKind};
use crate::model::{Disposition, EntityReference, Verdict};

/// Resolution for entities that match no rule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultPolicy {
    /// Unmatched entities are kept (default-allow)
    #[default]
    Keep,
    /// Unmatched entities are deleted (default-deny)
    Delete,
    /// Unmatched entities stay UNKNOWN: never deleted, surfaced in the report
    Report,
}

impl DefaultPolicy {
    /// Disposition given to an entity no rule matched
    pub fn resolve(&self) -> Disposition {
        match self {
            DefaultPolicy::Keep => {
                Disposition::from_default(Verdict::Keep, "no rule matched; default-allow")
            }
            DefaultPolicy::Delete => {
                Disposition::from_default(Verdict::Delete, "no rule matched; default-deny")
            }
            DefaultPolicy::Report => {
                Disposition::from_default(Verdict::Unknown, "no rule matched; reported for review")
            }
        }
    }
}

impl fmt::Display for DefaultPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DefaultPolicy::Keep => "keep",
            DefaultPolicy::Delete => "delete",
            DefaultPolicy::Report => "report",
        })
    }
}

/// What an execute guard sees before the first mutation
#[derive(Debug, Clone, Copy)]
pub struct GuardContext<'a> {
    pub root_collection: &'a str,
    /// Targets that passed discovery and protection checks
    pub targets: &'a [EntityReference],
    /// Total number of paths those targets will delete
    pub total_paths: usize,
}

/// Execute guard: allow or deny a run before any writes
pub trait ExecuteGuard: Send + Sync {
    /// Check whether the run may mutate the store.
    ///
    /// # Errors
    ///
    /// Returns `ExErrorKind::PolicyDenied` if the run is denied.
    fn check(&self, ctx: &GuardContext<'_>) -> std::result::Result<(), ExError>;
}

/// Always allows
pub struct NoopExecuteGuard;

impl ExecuteGuard for NoopExecuteGuard {
    fn check(&self, _: &GuardContext<'_>) -> std::result::Result<(), ExError> {
        Ok(())
    }
}

/// Rejects runs with more eligible targets than `max_targets` (0 = unlimited)
#[derive(Debug, Clone, Copy)]
pub struct MaxTargetsGuard {
    max_targets: usize,
}

impl MaxTargetsGuard {
    pub fn new(max_targets: usize) -> Self {
        Self { max_targets }
    }
}

impl ExecuteGuard for MaxTargetsGuard {
    fn check(&self, ctx: &GuardContext<'_>) -> std::result::Result<(), ExError> {
        if self.max_targets > 0 && ctx.targets.len() > self.max_targets {
            return Err(ExError::new(ExErrorKind::PolicyDenied)
                .with_op("guard")
                .with_collection(ctx.root_collection)
                .with_message(format!(
                    "{} delete targets exceed max_targets {}",
                    ctx.targets.len(),
                    self.max_targets
                )));
        }
        Ok(())
    }
}

/// Always denies (for tests that verify a guard stops all writes)
pub struct DenyAllExecuteGuard;

impl ExecuteGuard for DenyAllExecuteGuard {
    fn check(&self, _: &GuardContext<'_>) -> std::result::Result<(), ExError> {
        Err(ExError::new(ExErrorKind::PolicyDenied).with_message("DenyAll execute guard"))
    }
}
