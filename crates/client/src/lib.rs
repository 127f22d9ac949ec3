#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # convoy-client
//!
//! Client for the cluster automation control plane.
//!
//! Submits desired-state config documents for an automation group and
//! polls the group's status until every process reports the goal
//! version. Requests authenticate per call with digest credentials by
//! default; the scheme is injectable.
//!
//! ## Features
//!
//! - The group automation endpoints behind one typed client
//! - Digest and basic auth as injectable schemes
//! - Bounded goal-state wait loop with deadline and cancellation
//!
//! ## Example
//!
//! ```ignore
//! use convoy_client::{
//!     AutomationClient, ClientConfig, Credentials, WaitOptions, wait_for_goal_state,
//! };
//!
//! let config = ClientConfig::new(base_url, "my-group", Credentials::new("user", "key"));
//! let client = AutomationClient::new(config)?;
//! client.submit_config(&document).await?;
//! let report = wait_for_goal_state(&client, &WaitOptions::default()).await?;
//! println!("converged on goal version {}", report.goal_version);
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod goal_state;
pub mod status;

// Re-export commonly used items
pub use auth::{AuthScheme, BasicAuth, Credentials, DigestAuth, DigestChallenge};
pub use client::AutomationClient;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use goal_state::{
    CancelHandle, CancelToken, GoalStateReport, WaitOptions, cancel_pair, wait_for_goal_state,
};
pub use status::{AutomationStatus, ProcessStatus};
