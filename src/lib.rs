//! credhub-client - A Rust client for CredHub
//!
//! CredHub stores named, versioned credentials (passwords, certificates,
//! key pairs, generic values) behind an OAuth2-protected HTTP API. This crate
//! authenticates against its UAA server, reads version histories, and writes
//! credentials under an explicit write mode.
//!
//! # Architecture
//!
//! - [`auth`] - UAA discovery, client-credentials grant, token refresh
//! - [`client`] - Authenticated transport, API generation, retrieval, writes
//! - [`core`] - Credential model, typed values, configuration
//! - [`cli`] - The `chc` command-line interface
//!
//! # Write Modes
//!
//! - `Overwrite` always creates a new version
//! - `NoOverwrite` keeps the latest version if one exists
//! - `Converge` keeps the latest version if its value is unchanged
//!
//! The decision is made client-side and is identical on every API
//! generation. If the latest version cannot be read for a reason other than
//! "not found", nothing is written.

pub mod auth;
pub mod cli;
pub mod client;
pub mod core;
