//! Operator tooling for the boost service
//!
//! `check-config` validates a service configuration; `replay` drives a JSON
//! scenario script through an in-memory service and fails on the first step
//! that does not behave as scripted.

#![forbid(unsafe_code)]

pub mod commands;

pub use commands::replay::{load_script, Replayer, Script, Step, StepReport};
