//! Business logic and repository traits for the skill registry.
//!
//! This crate is storage- and transport-agnostic: it defines the ports
//! (`repository`, `source_host`, `queue`) that `skillreg-infra` adapts to
//! SQLite, `reqwest`, and an in-process queue, and the pure/async logic
//! that only depends on those ports (`ranking`, `classify`, `permission`,
//! `authflow`, `skill`).

pub mod authflow;
pub mod classify;
pub mod lifecycle;
pub mod permission;
pub mod queue;
pub mod ranking;
pub mod repository;
pub mod skill;
pub mod source_host;
