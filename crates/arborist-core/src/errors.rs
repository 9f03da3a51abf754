use arborist_core_types::RunId;
use thiserror::Error;

/// Result type alias using ArboristError
pub type Result<T> = std::result::Result<T, ArboristError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that callers can match on in
/// scripts and CI, and that the engine uses to decide whether a failure is
/// fatal, recorded per target, or retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Structural/Validation
    InvalidInput,
    ConfigInvalid,
    NotFound,
    AlreadyExists,

    // Discovery
    DiscoveryFailed,
    DepthExceeded,
    ProtectedDescendant,

    // Mutation
    BatchCommitFailed,

    // Verification
    VerificationReadFailed,

    // Run control
    PolicyDenied,
    Cancelled,

    // Auth
    AuthenticationFailed,
    PermissionDenied,

    // Integration/IO
    Timeout,
    Unavailable,
    Io,
    Serialization,
    Persistence,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::ConfigInvalid => "ERR_CONFIG_INVALID",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::AlreadyExists => "ERR_ALREADY_EXISTS",
            ExErrorKind::DiscoveryFailed => "ERR_DISCOVERY_FAILED",
            ExErrorKind::DepthExceeded => "ERR_DEPTH_EXCEEDED",
            ExErrorKind::ProtectedDescendant => "ERR_PROTECTED_DESCENDANT",
            ExErrorKind::BatchCommitFailed => "ERR_BATCH_COMMIT_FAILED",
            ExErrorKind::VerificationReadFailed => "ERR_VERIFICATION_READ_FAILED",
            ExErrorKind::PolicyDenied => "ERR_POLICY_DENIED",
            ExErrorKind::Cancelled => "ERR_CANCELLED",
            ExErrorKind::AuthenticationFailed => "ERR_AUTHENTICATION_FAILED",
            ExErrorKind::PermissionDenied => "ERR_PERMISSION_DENIED",
            ExErrorKind::Timeout => "ERR_TIMEOUT",
            ExErrorKind::Unavailable => "ERR_UNAVAILABLE",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether a store call failing with this kind may succeed if retried
    pub fn is_transient(&self) -> bool {
        matches!(self, ExErrorKind::Timeout | ExErrorKind::Unavailable)
    }

    /// Whether this kind aborts a run outright instead of being recorded
    /// against a single target
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ExErrorKind::ConfigInvalid
                | ExErrorKind::AuthenticationFailed
                | ExErrorKind::PolicyDenied
                | ExErrorKind::Cancelled
        )
    }
}

/// Canonical structured error type
///
/// Carries a classification kind for programmatic handling plus optional
/// context (operation, entity path, batch index, run id) for debugging.
#[derive(Debug, Clone, PartialEq)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_path: Option<String>,
    collection: Option<String>,
    batch_index: Option<usize>,
    run_id: Option<RunId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_path: None,
            collection: None,
            batch_index: None,
            run_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity path context (slash form, e.g. `orgs/acme/users/u1`)
    pub fn with_entity_path(mut self, path: impl Into<String>) -> Self {
        self.entity_path = Some(path.into());
        self
    }

    /// Add collection context
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Add batch index context
    pub fn with_batch_index(mut self, index: usize) -> Self {
        self.batch_index = Some(index);
        self
    }

    /// Add run ID context
    pub fn with_run_id(mut self, run_id: RunId) -> Self {
        self.run_id = Some(run_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the entity path context, if any
    pub fn entity_path(&self) -> Option<&str> {
        self.entity_path.as_deref()
    }

    /// Get the collection context, if any
    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    /// Get the batch index context, if any
    pub fn batch_index(&self) -> Option<usize> {
        self.batch_index
    }

    /// Get the run ID context, if any
    pub fn run_id(&self) -> Option<&RunId> {
        self.run_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }

    /// Shorthand for `self.kind().is_transient()`
    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(path) = &self.entity_path {
            write!(f, " (path: {})", path)?;
        }
        if let Some(collection) = &self.collection {
            write!(f, " (collection: {})", collection)?;
        }
        if let Some(index) = self.batch_index {
            write!(f, " (batch: {})", index)?;
        }
        if let Some(source) = &self.source {
            write!(f, " <- {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|s| s as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain error taxonomy for Arborist operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArboristError {
    // ===== Input / Configuration =====
    /// Entity path could not be parsed
    #[error("Invalid entity path '{path}': {reason}")]
    InvalidEntityPath { path: String, reason: String },

    /// A configuration value failed validation
    #[error("Invalid configuration for '{field}': {reason}")]
    ConfigInvalid { field: String, reason: String },

    /// A rule definition failed validation or compilation
    #[error("Invalid rule '{rule}': {reason}")]
    InvalidRule { rule: String, reason: String },

    // ===== Access =====
    /// Store rejected the caller's credentials
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    // ===== Discovery =====
    /// Listing a subtree failed
    #[error("Discovery failed under {path}: {reason}")]
    DiscoveryFailed { path: String, reason: String },

    /// Subtree is deeper than the configured guard
    #[error("Depth guard of {max_depth} exceeded under {path}")]
    DepthExceeded { path: String, max_depth: usize },

    /// A descendant of a delete target matches a KEEP rule
    #[error("Target {target} has protected descendant {descendant} (rule '{rule}')")]
    ProtectedDescendant {
        target: String,
        descendant: String,
        rule: String,
    },

    // ===== Mutation =====
    /// A delete batch failed to commit
    #[error("Batch {batch_index} failed to commit: {reason}")]
    BatchCommitFailed { batch_index: usize, reason: String },

    // ===== Verification =====
    /// Re-reading a target after deletion failed
    #[error("Verification read failed for {path}: {reason}")]
    VerificationReadFailed { path: String, reason: String },

    // ===== Run control =====
    /// An execute guard refused the run
    #[error("Run denied by policy: {reason}")]
    PolicyDenied { reason: String },

    /// The run was cancelled at a stage boundary
    #[error("Run cancelled before stage {stage}")]
    Cancelled { stage: String },

    // ===== Generic Errors =====
    /// Serialization error (JSON/TOML/YAML encoding or decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Conversion from ArboristError to ExError
impl From<ArboristError> for ExError {
    fn from(err: ArboristError) -> Self {
        match err {
            ArboristError::InvalidEntityPath { path, reason } => {
                ExError::new(ExErrorKind::InvalidInput)
                    .with_entity_path(path)
                    .with_message(format!("Invalid entity path: {}", reason))
            }

            ArboristError::ConfigInvalid { field, reason } => {
                ExError::new(ExErrorKind::ConfigInvalid)
                    .with_op("validate_config")
                    .with_message(format!("{}: {}", field, reason))
            }

            ArboristError::InvalidRule { rule, reason } => ExError::new(ExErrorKind::ConfigInvalid)
                .with_op("compile_rules")
                .with_message(format!("rule '{}': {}", rule, reason)),

            ArboristError::AuthenticationFailed { reason } => {
                ExError::new(ExErrorKind::AuthenticationFailed)
                    .with_op("check_access")
                    .with_message(reason)
            }

            ArboristError::DiscoveryFailed { path, reason } => {
                ExError::new(ExErrorKind::DiscoveryFailed)
                    .with_op("discover")
                    .with_entity_path(path)
                    .with_message(reason)
            }

            ArboristError::DepthExceeded { path, max_depth } => {
                ExError::new(ExErrorKind::DepthExceeded)
                    .with_op("discover")
                    .with_entity_path(path)
                    .with_message(format!("Depth guard of {} exceeded", max_depth))
            }

            ArboristError::ProtectedDescendant {
                target,
                descendant,
                rule,
            } => ExError::new(ExErrorKind::ProtectedDescendant)
                .with_entity_path(target)
                .with_message(format!(
                    "Descendant {} matches KEEP rule '{}'",
                    descendant, rule
                )),

            ArboristError::BatchCommitFailed {
                batch_index,
                reason,
            } => ExError::new(ExErrorKind::BatchCommitFailed)
                .with_op("delete_batch")
                .with_batch_index(batch_index)
                .with_message(reason),

            ArboristError::VerificationReadFailed { path, reason } => {
                ExError::new(ExErrorKind::VerificationReadFailed)
                    .with_op("verify")
                    .with_entity_path(path)
                    .with_message(reason)
            }

            ArboristError::PolicyDenied { reason } => {
                ExError::new(ExErrorKind::PolicyDenied).with_message(reason)
            }

            ArboristError::Cancelled { stage } => ExError::new(ExErrorKind::Cancelled)
                .with_message(format!("Run cancelled before stage {}", stage)),

            ArboristError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            ArboristError::Internal { message } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }
        }
    }
}

/// Conversion from serde_json::Error to ArboristError
impl From<serde_json::Error> for ArboristError {
    fn from(err: serde_json::Error) -> Self {
        ArboristError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Conversion from toml::de::Error to ArboristError
impl From<toml::de::Error> for ArboristError {
    fn from(err: toml::de::Error) -> Self {
        ArboristError::Serialization {
            message: err.to_string(),
        }
    }
}
