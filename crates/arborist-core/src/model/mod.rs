//! Data model shared by the classifier, walker, executor and verifier

mod attributes;
mod disposition;
mod reference;
mod report;

pub use attributes::Attributes;
pub use disposition::{Disposition, Entity, Verdict};
pub use reference::{EntityReference, PathSegment};
pub use report::{
    DeletionStatus, ReportCounts, ReportedError, RunMode, RunReport, RunStage, TargetOutcome,
    VerificationStatus,
};
