//! Structured logging setup shared by the CLI and the scheduled worker jobs.

pub mod tracing_setup;
