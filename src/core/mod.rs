//! core
//!
//! Domain types and configuration for the CredHub client.
//!
//! # Modules
//!
//! - [`credential`] - The credential envelope, type tags, write modes, ordering
//! - [`values`] - Typed credential payloads and the converge comparison
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - The wire shape is decoded once, into [`credential::Credential`]
//! - Typed access is a projection that fails loudly on a mismatched tag
//! - Nothing here performs I/O except configuration loading

pub mod config;
pub mod credential;
pub mod values;
