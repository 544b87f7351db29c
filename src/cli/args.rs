//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Read configuration from this file
//! - `--debug`: Enable debug logging

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::credential::{CredentialType, WriteMode};

/// chc - command-line client for CredHub
#[derive(Parser, Debug)]
#[command(name = "chc")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of the default locations
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show server and authorization server information
    Info,

    /// List credentials stored under a path
    Find {
        /// Path prefix, e.g. /concourse/main
        #[arg(long)]
        path: String,
    },

    /// Show versions of a credential, newest first
    Get {
        /// Credential name
        #[arg(long)]
        name: String,

        /// Show at most this many versions
        #[arg(long, conflicts_with = "latest")]
        versions: Option<usize>,

        /// Show only the current version
        #[arg(long)]
        latest: bool,
    },

    /// Show one version by id
    GetId {
        /// Version id
        #[arg(long)]
        id: String,
    },

    /// List credentials whose name contains a fragment
    FindName {
        /// Name fragment
        #[arg(long)]
        name_like: String,
    },

    /// Write a credential
    #[command(after_help = "\
EXAMPLES:
    # Store a plain value, creating a new version every time
    chc set --name /app/token --type value --value abc123

    # Store a user, only if the value changed
    chc set --name /app/db --type user --mode converge \\
        --value '{\"username\": \"app\", \"password\": \"s3cret\"}'")]
    Set {
        /// Credential name
        #[arg(long)]
        name: String,

        /// Credential type: value, json, password, user, certificate, rsa, ssh
        #[arg(long = "type", value_name = "TYPE")]
        credential_type: CredentialType,

        /// Value as JSON; anything that is not valid JSON is stored as a string
        #[arg(long)]
        value: String,

        /// Write mode: overwrite, no-overwrite, converge
        #[arg(long, default_value = "overwrite")]
        mode: WriteMode,
    },

    /// Delete every version of a credential
    Delete {
        /// Credential name
        #[arg(long)]
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_set_with_mode() {
        let cli = Cli::try_parse_from([
            "chc", "set", "--name", "/x", "--type", "password", "--value", "p", "--mode",
            "no-overwrite",
        ])
        .unwrap();
        match cli.command {
            Command::Set {
                credential_type,
                mode,
                ..
            } => {
                assert_eq!(credential_type, CredentialType::Password);
                assert_eq!(mode, WriteMode::NoOverwrite);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn set_defaults_to_overwrite() {
        let cli =
            Cli::try_parse_from(["chc", "set", "--name", "/x", "--type", "value", "--value", "v"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Command::Set {
                mode: WriteMode::Overwrite,
                ..
            }
        ));
    }

    #[test]
    fn rejects_unknown_type() {
        let result =
            Cli::try_parse_from(["chc", "set", "--name", "/x", "--type", "secret", "--value", "v"]);
        assert!(result.is_err());
    }

    #[test]
    fn versions_conflicts_with_latest() {
        let result =
            Cli::try_parse_from(["chc", "get", "--name", "/x", "--versions", "2", "--latest"]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["chc", "info", "--debug", "--config", "/tmp/c.toml"]).unwrap();
        assert!(cli.debug);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
    }
}
