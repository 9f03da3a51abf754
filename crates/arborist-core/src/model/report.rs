use arborist_core_types::{RunId, TraceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Disposition, EntityReference};
use crate::errors::ExError;

/// Whether a run may mutate the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    DryRun,
    Execute,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunMode::DryRun => "dry_run",
            RunMode::Execute => "execute",
        })
    }
}

/// Coordinator state machine stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStage {
    Idle,
    Authenticating,
    Classifying,
    Discovering,
    DryRunReport,
    Guarding,
    Executing,
    Verifying,
    Reported,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunStage::Idle => "IDLE",
            RunStage::Authenticating => "AUTHENTICATING",
            RunStage::Classifying => "CLASSIFYING",
            RunStage::Discovering => "DISCOVERING",
            RunStage::DryRunReport => "DRY_RUN_REPORT",
            RunStage::Guarding => "GUARDING",
            RunStage::Executing => "EXECUTING",
            RunStage::Verifying => "VERIFYING",
            RunStage::Reported => "REPORTED",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeletionStatus {
    Deleted,
    WouldDelete,
    Failed,
    Blocked,
    NotAttempted,
}

impl fmt::Display for DeletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeletionStatus::Deleted => "DELETED",
            DeletionStatus::WouldDelete => "WOULD_DELETE",
            DeletionStatus::Failed => "FAILED",
            DeletionStatus::Blocked => "BLOCKED",
            DeletionStatus::NotAttempted => "NOT_ATTEMPTED",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    Gone,
    StillExists,
    ReadFailed,
    Skipped,
    NotVerified,
}

impl VerificationStatus {
    /// Stragglers are eligible for an explicit second verification pass
    pub fn is_straggler(&self) -> bool {
        matches!(
            self,
            VerificationStatus::StillExists | VerificationStatus::ReadFailed
        )
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VerificationStatus::Gone => "GONE",
            VerificationStatus::StillExists => "STILL_EXISTS",
            VerificationStatus::ReadFailed => "READ_FAILED",
            VerificationStatus::Skipped => "SKIPPED",
            VerificationStatus::NotVerified => "NOT_VERIFIED",
        })
    }
}

/// Serializable snapshot of an `ExError` attached to a target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedError {
    pub code: String,
    pub message: String,
}

impl From<&ExError> for ReportedError {
    fn from(err: &ExError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<ExError> for ReportedError {
    fn from(err: ExError) -> Self {
        Self::from(&err)
    }
}

/// Result of one run for one classified top-level entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetOutcome {
    pub reference: EntityReference,
    pub disposition: Disposition,
    pub descendant_count: usize,
    pub deletion: DeletionStatus,
    pub verification: VerificationStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ReportedError>,
}

impl TargetOutcome {
    /// Fresh outcome for a classified entity
    ///
    /// Non-DELETE entities start as NOT_ATTEMPTED/SKIPPED and stay that way.
    /// DELETE targets start as NOT_ATTEMPTED/NOT_VERIFIED until the later
    /// stages fill them in.
    pub fn new(reference: EntityReference, disposition: Disposition) -> Self {
        let verification = if disposition.is_delete() {
            VerificationStatus::NotVerified
        } else {
            VerificationStatus::Skipped
        };
        Self {
            reference,
            disposition,
            descendant_count: 0,
            deletion: DeletionStatus::NotAttempted,
            verification,
            errors: Vec::new(),
        }
    }

    pub fn is_target(&self) -> bool {
        self.disposition.is_delete()
    }

    pub fn push_error(&mut self, err: impl Into<ReportedError>) {
        self.errors.push(err.into());
    }
}

/// Aggregate counts over a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportCounts {
    pub total: usize,
    pub keep: usize,
    pub delete: usize,
    pub unknown: usize,
    pub deleted: usize,
    pub would_delete: usize,
    pub failed: usize,
    pub blocked: usize,
    pub gone: usize,
    pub still_exists: usize,
    pub read_failed: usize,
}

/// Structured summary of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: RunId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<TraceId>,
    pub mode: RunMode,
    pub root_collection: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Last stage the coordinator reached
    pub stage: RunStage,
    pub outcomes: Vec<TargetOutcome>,
}

impl RunReport {
    pub fn new(run_id: RunId, mode: RunMode, root_collection: impl Into<String>) -> Self {
        Self {
            run_id,
            trace_id: None,
            mode,
            root_collection: root_collection.into(),
            started_at: Utc::now(),
            finished_at: None,
            stage: RunStage::Idle,
            outcomes: Vec::new(),
        }
    }

    /// Mark the report as finished at the REPORTED stage
    pub fn finish(&mut self) {
        self.stage = RunStage::Reported;
        self.finished_at = Some(Utc::now());
    }

    /// Outcomes classified DELETE
    pub fn targets(&self) -> impl Iterator<Item = &TargetOutcome> {
        self.outcomes.iter().filter(|o| o.is_target())
    }

    /// Outcomes whose verification ended STILL_EXISTS or READ_FAILED
    pub fn stragglers(&self) -> impl Iterator<Item = &TargetOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.verification.is_straggler())
    }

    pub fn outcome(&self, reference: &EntityReference) -> Option<&TargetOutcome> {
        self.outcomes.iter().find(|o| &o.reference == reference)
    }

    /// True in dry-run mode; in execute mode, true only if every DELETE
    /// target was deleted and verified gone
    pub fn is_success(&self) -> bool {
        match self.mode {
            RunMode::DryRun => true,
            RunMode::Execute => self.targets().all(|o| {
                o.deletion == DeletionStatus::Deleted
                    && o.verification == VerificationStatus::Gone
            }),
        }
    }

    pub fn counts(&self) -> ReportCounts {
        let mut counts = ReportCounts {
            total: self.outcomes.len(),
            ..ReportCounts::default()
        };
        for outcome in &self.outcomes {
            match outcome.disposition.verdict {
                super::Verdict::Keep => counts.keep += 1,
                super::Verdict::Delete => counts.delete += 1,
                super::Verdict::Unknown => counts.unknown += 1,
            }
            match outcome.deletion {
                DeletionStatus::Deleted => counts.deleted += 1,
                DeletionStatus::WouldDelete => counts.would_delete += 1,
                DeletionStatus::Failed => counts.failed += 1,
                DeletionStatus::Blocked => counts.blocked += 1,
                DeletionStatus::NotAttempted => {}
            }
            match outcome.verification {
                VerificationStatus::Gone => counts.gone += 1,
                VerificationStatus::StillExists => counts.still_exists += 1,
                VerificationStatus::ReadFailed => counts.read_failed += 1,
                VerificationStatus::Skipped | VerificationStatus::NotVerified => {}
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Verdict;

    fn outcome(id: &str, verdict: Verdict) -> TargetOutcome {
        TargetOutcome::new(
            EntityReference::top_level("orgs", id),
            Disposition::from_default(verdict, "test"),
        )
    }

    #[test]
    fn test_dry_run_report_is_always_success() {
        let mut report = RunReport::new(RunId::new(), RunMode::DryRun, "orgs");
        let mut o = outcome("a", Verdict::Delete);
        o.deletion = DeletionStatus::WouldDelete;
        report.outcomes.push(o);

        assert!(report.is_success());
    }

    #[test]
    fn test_execute_success_requires_deleted_and_gone() {
        let mut report = RunReport::new(RunId::new(), RunMode::Execute, "orgs");
        let mut a = outcome("a", Verdict::Delete);
        a.deletion = DeletionStatus::Deleted;
        a.verification = VerificationStatus::Gone;
        report.outcomes.push(a);
        report.outcomes.push(outcome("keep", Verdict::Keep));
        assert!(report.is_success());

        let mut b = outcome("b", Verdict::Delete);
        b.deletion = DeletionStatus::Deleted;
        b.verification = VerificationStatus::StillExists;
        report.outcomes.push(b);
        assert!(!report.is_success());
        assert_eq!(report.stragglers().count(), 1);
    }

    #[test]
    fn test_new_outcome_defaults_by_verdict() {
        assert_eq!(
            outcome("k", Verdict::Keep).verification,
            VerificationStatus::Skipped
        );
        assert_eq!(
            outcome("d", Verdict::Delete).verification,
            VerificationStatus::NotVerified
        );
    }

    #[test]
    fn test_counts() {
        let mut report = RunReport::new(RunId::new(), RunMode::Execute, "orgs");
        let mut a = outcome("a", Verdict::Delete);
        a.deletion = DeletionStatus::Failed;
        report.outcomes.push(a);
        report.outcomes.push(outcome("b", Verdict::Keep));
        report.outcomes.push(outcome("c", Verdict::Unknown));

        let counts = report.counts();
        assert_eq!(counts.total, 3);
        assert_eq!(counts.delete, 1);
        assert_eq!(counts.keep, 1);
        assert_eq!(counts.unknown, 1);
        assert_eq!(counts.failed, 1);
    }

    #[test]
    fn test_statuses_serialize_screaming_case() {
        assert_eq!(
            serde_json::to_string(&DeletionStatus::WouldDelete).unwrap(),
            "\"WOULD_DELETE\""
        );
        assert_eq!(
            serde_json::to_string(&VerificationStatus::StillExists).unwrap(),
            "\"STILL_EXISTS\""
        );
    }
}
