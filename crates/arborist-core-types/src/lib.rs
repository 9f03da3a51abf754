//! Core types shared across Arborist facilities
//!
//! This crate provides foundational types used by the error, logging
//! and reporting facilities:
//!
//! - **Correlation types**: RunId, TraceId
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod schema;

pub use correlation::{RunId, TraceId};
