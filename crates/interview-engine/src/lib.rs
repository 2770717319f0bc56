//! Interview session engine: drives a candidate from setup through timed question rounds to a
//! scored report, while keeping question history and daily attempt accounting across sessions.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
