//! CLI command handlers.
//!
//! Maps parsed arguments onto a configured [`Scenario`] and runs the
//! selected path, either the full rollout or the clean-state reset.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use convoy::scenario::Scenario;
use convoy_client::{AutomationClient, CancelToken, ClientConfig, Credentials, WaitOptions};

use crate::cli::{AuthKind, Cli};

/// Execute the rollout selected on the command line.
pub async fn execute(cli: Cli, cancel: CancelToken) -> Result<()> {
    info!(
        group_id = %cli.group_id,
        base_url = %cli.base_url,
        host = %cli.agent_hostname,
        clean = cli.clean,
        "Starting rollout driver"
    );

    let client = build_client(&cli).context("failed to build control-plane client")?;
    let options = wait_options(&cli, cancel);
    let scenario = Scenario::new(
        client,
        cli.agent_hostname.clone(),
        cli.configs_dir.clone(),
        options,
    );

    if cli.clean {
        scenario.run_clean().await?;
        println!("Group '{}' reset to a clean state", cli.group_id);
    } else {
        scenario.run_full().await?;
        println!("Rollout complete for group '{}'", cli.group_id);
    }
    Ok(())
}

/// Build the API client from the connection arguments.
fn build_client(cli: &Cli) -> convoy_client::Result<AutomationClient> {
    let credentials = Credentials::new(&cli.api_user, &cli.api_key);
    let config = ClientConfig::new(cli.base_url.clone(), cli.group_id.clone(), credentials);
    let config = match cli.auth {
        AuthKind::Digest => config,
        AuthKind::Basic => config.with_basic_auth(),
    };
    AutomationClient::new(config)
}

/// Translate the polling arguments into wait bounds.
///
/// `--max-rounds 0` maps to an unbounded wait.
fn wait_options(cli: &Cli, cancel: CancelToken) -> WaitOptions {
    WaitOptions::default()
        .with_interval(Duration::from_secs(cli.interval))
        .with_max_rounds(NonZeroU32::new(cli.max_rounds))
        .with_cancel(cancel)
}
