//! # Convoy - rollout driver entry point
//!
//! Parses the command line, wires Ctrl+C into a cooperative cancel
//! token, and hands off to the command layer.
//!
//! ## Shutdown
//!
//! Ctrl+C does not kill the process mid-request. It trips the cancel
//! token, the active goal-state wait bails out before its next poll,
//! and the driver exits through the normal error path with the stage
//! it was on in the error context.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use convoy_client::cancel_pair;

use crate::cli::Cli;

mod cli;
mod commands;

/// Main entry point for the rollout driver.
#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let (cancel_handle, cancel_token) = cancel_pair();
    tokio::spawn(async move {
        wait_for_shutdown().await;
        cancel_handle.cancel();
    });

    commands::execute(cli, cancel_token).await
}

/// Initialize tracing subscriber with environment filter.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for shutdown signal (Ctrl+C).
async fn wait_for_shutdown() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, cancelling after the current poll"),
        Err(err) => error!("Failed to listen for shutdown signal: {}", err),
    }
}
