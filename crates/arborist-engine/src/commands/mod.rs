//! Run stages and command dispatch
//!
//! Each stage is a plain async function over an injected `DocumentStore`.
//! `run` wires them into the coordinator state machine and
//! `engine_command` exposes them as a single command surface.

pub mod classify;
pub mod discover;
pub mod engine_command;
pub mod execute;
pub mod run;
pub mod verify;
