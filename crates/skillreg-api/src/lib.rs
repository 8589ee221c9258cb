//! Library surface for `skregd`: split out from `main.rs` so integration
//! tests can build a router against a throwaway `AppState` without
//! spawning the real binary.

pub mod cli;
pub mod http;
pub mod state;
pub mod workers;
pub mod zip;
