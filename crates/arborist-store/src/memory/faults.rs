use arborist_core::errors::ExErrorKind;
use arborist_core::model::EntityReference;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Faults injected into a `MemoryStore`
///
/// Call numbers are 1-based and count every call the store receives,
/// retries included.
#[derive(Debug, Clone, Default)]
pub struct FaultPlan {
    pub deny_access: bool,
    /// `delete_batch` call number -> error kind (nothing in that call commits)
    pub delete_call_failures: HashMap<usize, ExErrorKind>,
    /// `list_top_level` call number -> error kind
    pub top_level_failures: HashMap<usize, ExErrorKind>,
    /// Listing child collections under these paths fails with `Persistence`
    pub failing_listings: HashSet<EntityReference>,
    /// Point reads of these paths fail with `Persistence`
    pub failing_point_reads: HashSet<EntityReference>,
    /// These paths fail inside an otherwise committed batch
    pub failing_batch_paths: HashSet<EntityReference>,
    /// `delete_batch` reports success but removes nothing
    pub ignore_deletes: bool,
    /// Number of reads that still observe a document after it was deleted
    pub stale_reads: u32,
    /// Added before every call
    pub latency: Option<Duration>,
}

impl FaultPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deny_access(mut self) -> Self {
        self.deny_access = true;
        self
    }

    /// Fail the `call`-th `delete_batch` call with `kind`
    pub fn fail_delete_call(mut self, call: usize, kind: ExErrorKind) -> Self {
        self.delete_call_failures.insert(call, kind);
        self
    }

    /// Fail the `call`-th `list_top_level` call with `kind`
    pub fn fail_top_level_listing(mut self, call: usize, kind: ExErrorKind) -> Self {
        self.top_level_failures.insert(call, kind);
        self
    }

    pub fn fail_listing_under(mut self, path: EntityReference) -> Self {
        self.failing_listings.insert(path);
        self
    }

    pub fn fail_point_read(mut self, path: EntityReference) -> Self {
        self.failing_point_reads.insert(path);
        self
    }

    pub fn fail_path_in_batch(mut self, path: EntityReference) -> Self {
        self.failing_batch_paths.insert(path);
        self
    }

    pub fn ignore_deletes(mut self) -> Self {
        self.ignore_deletes = true;
        self
    }

    pub fn stale_reads(mut self, reads: u32) -> Self {
        self.stale_reads = reads;
        self
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }
}
