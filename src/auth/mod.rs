//! auth - OAuth2 bearer tokens for CredHub requests
//!
//! CredHub delegates authentication to a UAA authorization server. This
//! module acquires bearer tokens with the client-credentials grant and keeps
//! them fresh for the transport layer.
//!
//! # Architecture
//!
//! The auth system:
//! - Discovers the token endpoint from CredHub's `/info`
//! - Acquires a token once at client construction (fail fast)
//! - Refreshes tokens before expiry and after a 401 rejection
//! - Serializes refreshes so concurrent expiry yields one token request
//! - Never exposes tokens or client secrets in logs, errors, or outputs
//!
//! # Components
//!
//! - [`TokenProvider`] - Trait for providing bearer tokens to the transport
//! - [`UaaTokenProvider`] - Implementation backed by the UAA grant
//! - [`StaticTokenProvider`] - Fixed token, for pre-issued tokens and tests
//! - [`UaaClient`] - HTTP client for discovery and the token endpoint
//! - [`AccessToken`] - Token value with expiry tracking
//!
//! # Example
//!
//! ```ignore
//! use credhub_client::auth::{ClientCredentials, TokenProvider, UaaClient, UaaTokenProvider};
//!
//! let uaa = UaaClient::discover(&http, &base_url, ClientCredentials::new("id", "secret")).await?;
//! let provider = UaaTokenProvider::connect(uaa).await?;
//! let token = provider.bearer_token().await?;
//! ```

mod errors;
mod provider;
mod token;
mod uaa;

pub use errors::AuthError;
pub use provider::UaaTokenProvider;
pub use token::{AccessToken, TokenResponse, EXPIRY_BUFFER_SECS};
pub use uaa::{fetch_info, AppInfo, AuthServerInfo, ClientCredentials, ServerInfo, UaaClient};

/// Trait for providing bearer tokens to the transport.
///
/// # Implementation Notes
///
/// Implementors must:
/// - Handle token refresh transparently
/// - Serialize refreshes so concurrent callers share one refresh
/// - Re-check if refresh is needed after acquiring the refresh lock
/// - Never log or expose token values
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns a valid bearer token, refreshing if necessary.
    ///
    /// # Errors
    ///
    /// Any [`AuthError`] from the refresh, propagated to the pending request.
    async fn bearer_token(&self) -> Result<String, AuthError>;

    /// Replace a token the resource server rejected with 401.
    ///
    /// If the current token is no longer `rejected` (another caller already
    /// refreshed), the current token is returned without a new grant.
    async fn refresh_rejected(&self, rejected: &str) -> Result<String, AuthError>;

    /// Check whether a usable token is held, without refreshing.
    async fn is_authenticated(&self) -> bool;

    /// The endpoint tokens are obtained from, for diagnostics.
    fn auth_server(&self) -> &str;
}

/// A provider that always returns the same token.
///
/// Useful for pre-issued tokens and for tests. A 401 cannot be recovered
/// from, so [`TokenProvider::refresh_rejected`] fails with
/// [`AuthError::Unauthorized`].
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    /// Create a provider for a fixed token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait::async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn bearer_token(&self) -> Result<String, AuthError> {
        Ok(self.token.clone())
    }

    async fn refresh_rejected(&self, _rejected: &str) -> Result<String, AuthError> {
        Err(AuthError::Unauthorized)
    }

    async fn is_authenticated(&self) -> bool {
        true
    }

    fn auth_server(&self) -> &str {
        "static"
    }
}

impl std::fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("token", &"[REDACTED]")
            .finish()
    }
}
