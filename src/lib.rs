#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # Convoy
//!
//! Staged rollout driver for a cluster automation control plane. The
//! package builds a thin CLI binary on top of this library; [`scenario`]
//! holds the rollout itself.

// Re-export the workspace crates
pub use convoy_client;
pub use convoy_config;

// Rollout scenario driven by the CLI
pub mod scenario;

pub use scenario::{CLEAN_STAGE, STAGES, Scenario, Stage};
