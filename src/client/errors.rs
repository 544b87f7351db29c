//! client::errors
//!
//! Error type shared by every CredHub operation.

use thiserror::Error;

use crate::auth::AuthError;
use crate::core::credential::CredentialType;

/// Errors from CredHub operations.
///
/// Each variant is a distinguishable failure kind so callers can branch on
/// "not found" without string matching.
#[derive(Debug, Clone, Error)]
pub enum CredHubError {
    /// The server answered 404 for the requested resource.
    #[error("not found: {0}")]
    NotFound(String),

    /// Token acquisition failed, or a request was rejected after one refresh.
    #[error("authentication failed: {0}")]
    Authentication(#[from] AuthError),

    /// The request could not be sent or the response could not be read.
    #[error("transport error: {0}")]
    Transport(String),

    /// A response body, or a credential payload, did not have the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// A typed accessor was used on a credential of a different type.
    #[error("type mismatch: expected {expected} credential, found {actual}")]
    TypeMismatch {
        /// Type the accessor projects into
        expected: CredentialType,
        /// Type tag the credential carries
        actual: CredentialType,
    },

    /// A lookup expected at least one version and the server returned none.
    #[error("no versions returned for '{0}'")]
    EmptyResult(String),

    /// Any other non-success status.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body, or the status reason when the body is empty
        message: String,
    },

    /// A setting needed to build the client is missing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The configured base URL could not be used.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The rejected value
        url: String,
        /// Why it was rejected
        reason: String,
    },
}

impl CredHubError {
    /// Whether this is a 404 from the server.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CredHubError::NotFound(_))
    }

    /// Whether retrying the same request later might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            CredHubError::Transport(_) => true,
            CredHubError::Api { status, .. } => *status >= 500,
            CredHubError::Authentication(e) => e.is_transient(),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for CredHubError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            CredHubError::Decode(err.to_string())
        } else {
            CredHubError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CredHubError {
    fn from(err: serde_json::Error) -> Self {
        CredHubError::Decode(err.to_string())
    }
}
