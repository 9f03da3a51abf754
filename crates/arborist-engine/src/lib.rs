//! Arborist Engine - run orchestration layer
//!
//! Coordinates the stages of a lifecycle run against an injected
//! `DocumentStore`: access check, classification, bounded-parallel
//! discovery, batched deletion and post-delete verification.
//!
//! Every store call made by a run goes through `retry::RetryingStore`.

pub mod commands;
pub mod retry;

pub use commands::engine_command::{apply_engine_command, EngineCommand, EngineCommandResult};
pub use commands::run::{run, CancelSignal, RunOptions};
pub use retry::{RetryPolicy, RetryingStore};

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, arborist_core::ExError>;
