//! Arborist Core - classification, discovery and reporting kernel
//!
//! This crate provides the store-independent building blocks of an Arborist
//! run, including:
//! - Entity paths, attributes, dispositions and the run report model
//! - The `DocumentStore` client seam
//! - Ordered KEEP/DELETE rule sets and the classifier
//! - Default policies and execute guards
//! - TOML run configuration with validation
//! - Depth-guarded subtree discovery (children before parents)
//! - Report rendering (text table, Markdown, JSON)
//!
//! The run stages themselves live in `arborist-engine`.

pub mod config;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod policy;
pub mod render;
pub mod rules;
pub mod store_client;
pub mod traversal;

// Used by the logging macros
pub use arborist_core_types;

// Re-export commonly used types
pub use config::{RetrySettings, RunConfig};
pub use errors::{ArboristError, ExError, ExErrorKind, Result};
pub use model::{Attributes, Disposition, Entity, EntityReference, RunReport, Verdict};
pub use policy::{DefaultPolicy, DenyAllExecuteGuard, ExecuteGuard, MaxTargetsGuard, NoopExecuteGuard};
pub use rules::Classifier;
pub use store_client::{BatchCommit, DocumentStore, StoreResult, MAX_BATCH_SIZE};
