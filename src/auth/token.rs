//! auth::token
//!
//! Access token state for the UAA client-credentials grant.
//!
//! # Design
//!
//! The client-credentials grant issues no refresh token: "refreshing" means
//! running the grant again. An [`AccessToken`] therefore only tracks the
//! bearer value and its expiry, and is replaced wholesale on refresh.
//!
//! # Security
//!
//! Token values MUST never appear in logs, error messages or debug output.
//! [`AccessToken`] implements a redacting `Debug`.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::fmt;

/// Buffer before expiry to trigger proactive refresh (30 seconds).
pub const EXPIRY_BUFFER_SECS: i64 = 30;

/// Successful token response from the authorization server.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    /// The bearer token.
    pub access_token: String,

    /// Token type (always "bearer" for UAA).
    #[serde(default)]
    pub token_type: String,

    /// Seconds until the access token expires.
    pub expires_in: u64,

    /// Granted scopes, space separated.
    #[serde(default)]
    pub scope: Option<String>,
}

/// A bearer token with its expiry.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Create a token that expires `expires_in` seconds from now.
    ///
    /// Lifetimes past the latest representable instant saturate to it.
    pub fn new(value: impl Into<String>, expires_in: u64) -> Self {
        let now = Utc::now();
        let expires_at = i64::try_from(expires_in)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// The bearer value to place in the `Authorization` header.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// When the token expires.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Check if the access token has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Check if the access token needs refresh.
    ///
    /// Returns true if the token expires within [`EXPIRY_BUFFER_SECS`], so
    /// that a request never leaves with a token about to lapse in flight.
    pub fn needs_refresh(&self) -> bool {
        Utc::now() >= self.expires_at - Duration::seconds(EXPIRY_BUFFER_SECS)
    }
}

impl From<TokenResponse> for AccessToken {
    fn from(response: TokenResponse) -> Self {
        AccessToken::new(response.access_token, response.expires_in)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish()
    }
}
