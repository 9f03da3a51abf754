//! Presentation of run reports
//!
//! Pure functions over a `RunReport` value; nothing here touches a store.

pub mod report_render;

pub use report_render::{render_json, render_markdown, render_table};
