//! Canonical schema constants for structured logging and events
//!
//! These constants keep field names consistent across the engine's log
//! events and error reporting.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_RUN_ID: &str = "run_id";
pub const FIELD_TRACE_ID: &str = "trace_id";
pub const FIELD_MODE: &str = "mode";

// Entity identifiers
pub const FIELD_ENTITY_PATH: &str = "entity_path";
pub const FIELD_COLLECTION: &str = "collection";

// Collection sizes
pub const FIELD_TARGET_COUNT: &str = "target_count";
pub const FIELD_BATCH_INDEX: &str = "batch_index";
pub const FIELD_BATCH_LEN: &str = "batch_len";
pub const FIELD_DESCENDANT_COUNT: &str = "descendant_count";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
