//! CLI argument definitions using clap.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use convoy_config::TargetHost;
use url::Url;

/// Convoy - goal-state rollout driver
#[derive(Parser, Debug)]
#[command(name = "convoy")]
#[command(version)]
#[command(about = "Drive a cluster automation control plane through a staged rollout")]
#[command(
    long_about = "Convoy submits a sequence of automation config documents to the control plane, \
                  retargets each one at a single agent host, and polls automation status until \
                  every managed process reaches the published goal state."
)]
pub struct Cli {
    /// Base URL of the control plane, e.g. http://cloud.example.com:8080
    pub base_url: Url,

    /// Hostname the automation agent registered under
    pub agent_hostname: TargetHost,

    /// Group whose automation config is driven
    pub group_id: String,

    /// API username
    pub api_user: String,

    /// API key
    pub api_key: String,

    /// Submit only the cleanup document and wait for it to take effect
    #[arg(long, default_value_t = false)]
    pub clean: bool,

    /// Directory holding the staged config documents
    #[arg(long, default_value = "configs")]
    pub configs_dir: PathBuf,

    /// Seconds to sleep between status polls
    #[arg(long, default_value_t = 1)]
    pub interval: u64,

    /// Status polls per stage before giving up (0 = poll forever)
    #[arg(long, default_value_t = 120)]
    pub max_rounds: u32,

    /// HTTP authentication scheme
    #[arg(long, value_enum, default_value_t = AuthKind::Digest)]
    pub auth: AuthKind,
}

/// Authentication scheme selected on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthKind {
    /// Challenge-response digest authentication
    Digest,
    /// Preemptive basic authentication
    Basic,
}
