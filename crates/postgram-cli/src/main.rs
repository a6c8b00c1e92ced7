// SPDX-License-Identifier: Apache-2.0

//! Postgram - Reliable Instagram publishing via the Graph API.
//!
//! A CLI tool that publishes images, videos, reels, and stories through the
//! Instagram Graph API, parking rate-limited posts durably and republishing
//! them once their retry windows reopen.

mod cli;
mod commands;
mod errors;
mod logging;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use postgram_core::config;
use tracing::debug;

use crate::cli::{Cli, OutputContext};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.output, cli.verbose);

    let output_ctx = OutputContext::from_cli(cli.output, cli.quiet, cli.verbose);

    let mut config = config::load_config().context("Failed to load configuration")?;
    debug!("Configuration loaded successfully");

    // Apply CLI overrides to config
    if let Some(state_file) = cli.state_file {
        debug!(path = %state_file.display(), "Overriding state file location");
        config.state.file = Some(state_file);
    }

    match commands::run(cli.command, output_ctx, &config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            let formatted = errors::format_error(&e);
            eprintln!("Error: {formatted}");
            Err(e)
        }
    }
}
