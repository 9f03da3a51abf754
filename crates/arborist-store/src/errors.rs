//! Error handling for arborist-store
//!
//! Wraps arborist-core ExError with store-specific helpers

use arborist_core::errors::{ExError, ExErrorKind};
use arborist_core::model::EntityReference;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a seed validation error
pub fn seed_validation(reason: &str) -> ExError {
    ExError::new(ExErrorKind::InvalidInput)
        .with_op("seed_parse")
        .with_message(reason.to_string())
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Create a serialization error
pub fn serialization_error(operation: &str, message: impl Into<String>) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op(operation.to_string())
        .with_message(message)
}

/// Create an access denial error
pub fn access_denied() -> ExError {
    ExError::new(ExErrorKind::AuthenticationFailed)
        .with_op("check_access")
        .with_message("credentials rejected by store")
}

/// Create an injected fault for a store call
pub fn injected(kind: ExErrorKind, operation: &str, path: Option<&EntityReference>) -> ExError {
    let err = ExError::new(kind)
        .with_op(operation.to_string())
        .with_message("injected fault");
    match path {
        Some(path) => err.with_entity_path(path.to_string()),
        None => err,
    }
}
