//! cli
//!
//! Command-line interface for the `chc` binary.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install logging
//! - Load configuration and connect a client
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap, builds a
//! [`CredHubClient`] from [`ClientConfig`], and runs the selected command
//! on a tokio runtime. All request semantics live in [`crate::client`].

pub mod args;
pub mod commands;

pub use args::{Cli, Command};

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::client::CredHubClient;
use crate::core::config::ClientConfig;

/// Install the tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `--debug` selects the default level.
pub fn init_logging(debug: bool) {
    let default = if debug {
        "credhub_client=debug,warn"
    } else {
        "warn"
    };
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .try_init();
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run(cli: Cli) -> Result<()> {
    let config = ClientConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let client = CredHubClient::connect(&config)
            .await
            .context("failed to connect to CredHub")?;
        commands::dispatch(cli.command, &client).await
    })
}
