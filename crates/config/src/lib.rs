#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # convoy-config
//!
//! Desired-state config documents for the cluster automation control plane.
//!
//! A config document describes what a group's automation agents should
//! converge the fleet on: which agents run where, which processes exist,
//! and how auth is set up. Documents are written once against the
//! `AGENT_HOSTNAME` placeholder and retargeted per machine before
//! submission.
//!
//! ## Features
//!
//! - Schema-typed model of the sections the client rewrites, with every
//!   other field preserved verbatim through a flattened remainder
//! - Target-host retargeting covering agent entries, process entries,
//!   kerberos principals, and auth users
//! - Document loading with source-aware errors
//!
//! ## Example
//!
//! ```ignore
//! use std::path::Path;
//! use convoy_config::{AutomationConfig, TargetHost};
//!
//! let target: TargetHost = "node-7.internal".parse()?;
//! let mut config = AutomationConfig::from_path(Path::new("configs/api_0_clean.json"))?;
//! config.retarget(&target);
//! ```

pub mod document;
pub mod error;
pub mod target;

// Re-export commonly used items
pub use document::{
    AgentVersion, AuthSection, AuthUser, AutomationConfig, HOSTNAME_PLACEHOLDER, ProcessConfig,
};
pub use error::{Error, Result};
pub use target::TargetHost;
