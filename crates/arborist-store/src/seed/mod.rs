//! Seed files
//!
//! Provides:
//! - Seed Format v0 schema
//! - YAML parser with validation
//! - Importer into a `MemoryStore` and exporter back to YAML
//! - State digest canonicalization

pub mod digest;
pub mod export;
pub mod format_v0;
pub mod importer;
pub mod parser;

pub use digest::{compute_seed_digest, compute_state_digest};
pub use export::{export_seed, write_seed_file};
pub use format_v0::{SeedEntity, SeedV0};
pub use importer::{import_seed, load_seed_file};
pub use parser::{parse_seed_file, parse_seed_str, validate_seed};
