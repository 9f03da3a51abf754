//! Subtree discovery

pub mod walker;

pub use walker::{discover, DiscoveredNode, Discovery, DiscoveryFailure};
