//! client - CredHub API access
//!
//! # Modules
//!
//! - `errors`: [`CredHubError`], the error type of every operation
//! - `transport`: authenticated HTTP with one 401 refresh-and-retry
//! - `generation`: v1/v2 detection and request/response encoding
//! - `resolver`: write-mode policy over the [`CredentialBackend`] seam
//! - `credhub`: [`CredHubClient`], the live backend
//! - [`mock`]: in-memory backend for tests
//!
//! # Example
//!
//! ```ignore
//! use credhub_client::client::CredHubClient;
//!
//! let client = CredHubClient::connect(&config).await?;
//! for cred in client.find_by_path("/concourse/main").await? {
//!     println!("{}", cred.name);
//! }
//! ```

mod credhub;
mod errors;
mod generation;
pub mod mock;
mod resolver;
mod transport;

pub use credhub::CredHubClient;
pub use errors::CredHubError;
pub use generation::{ApiGeneration, EncodedWrite};
pub use resolver::{resolve_write, CredentialBackend};
pub use transport::{parse_base_url, Transport};
