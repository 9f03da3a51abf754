//! Arborist Store - in-memory document store, fault injection and seed files
//!
//! Provides:
//! - `MemoryStore`, a thread-safe `DocumentStore` holding a document tree
//! - `FaultPlan` for injecting access, listing, commit, read and latency faults
//! - Seed Format v0 (YAML) parser, importer and exporter
//! - SHA-256 state digest for idempotence checks

pub mod errors;
pub mod memory;
pub mod seed;

// Re-export key types
pub use errors::Result;
pub use memory::{FaultPlan, MemoryStore};
pub use seed::{compute_state_digest, export_seed, import_seed, load_seed_file, SeedV0};
