//! auth::errors
//!
//! Authentication error types for the UAA client-credentials flow.
//!
//! # Design
//!
//! Error messages MUST NOT contain tokens or client secrets. Every variant
//! carries enough context to diagnose the failure (endpoint, status, OAuth
//! error code) without exposing sensitive data.
//!
//! # Example
//!
//! ```
//! use credhub_client::auth::AuthError;
//!
//! let err = AuthError::TokenRejected {
//!     error: "invalid_client".to_string(),
//!     description: "Bad credentials".to_string(),
//! };
//! assert!(err.to_string().contains("invalid_client"));
//! ```

use thiserror::Error;

/// Errors from authentication operations.
///
/// # Security
///
/// Error messages intentionally do not include token values or the
/// client secret.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The token endpoint could not be discovered from the server's `/info`.
    #[error("token endpoint discovery failed: {0}")]
    Discovery(String),

    /// The authorization server rejected the client credentials.
    #[error("token request rejected: {error}: {description}")]
    TokenRejected {
        /// OAuth error code (e.g. `invalid_client`)
        error: String,
        /// Human-readable description from the server
        description: String,
    },

    /// The client id or secret is not configured.
    #[error("client credentials not configured: {0}")]
    MissingCredentials(String),

    /// The resource server rejected a freshly acquired token.
    #[error("request unauthorized after token refresh")]
    Unauthorized,

    /// Token response could not be parsed.
    #[error("invalid token response: {0}")]
    InvalidTokenResponse(String),

    /// Network error while talking to the authorization server.
    #[error("network error: {0}")]
    Network(String),

    /// Authorization server returned an unexpected status.
    #[error("authorization server error: {status} - {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Response body or error message
        message: String,
    },
}

impl AuthError {
    /// Check if this error indicates a transient failure that might succeed on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            AuthError::Network(_) => true,
            AuthError::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Check if the configured client credentials are at fault.
    pub fn is_bad_credentials(&self) -> bool {
        match self {
            AuthError::TokenRejected { error, .. } => {
                error == "invalid_client" || error == "unauthorized"
            }
            AuthError::Server { status, .. } => *status == 401,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        AuthError::InvalidTokenResponse(err.to_string())
    }
}
