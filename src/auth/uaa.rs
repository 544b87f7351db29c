//! auth::uaa
//!
//! OAuth2 client-credentials client for the UAA authorization server.
//!
//! # Flow Overview
//!
//! 1. `GET <credhub>/info` reveals the authorization server URL
//!    (`auth-server.url`). This endpoint is unauthenticated.
//! 2. `POST <auth-server>/oauth/token` with
//!    `grant_type=client_credentials` exchanges the client id and secret for
//!    a bearer token.
//!
//! The grant has no refresh token. When the access token expires the same
//! request is simply issued again.
//!
//! # Example
//!
//! ```ignore
//! use credhub_client::auth::{ClientCredentials, UaaClient};
//!
//! let uaa = UaaClient::discover(&http, &base_url, credentials).await?;
//! let token = uaa.request_token().await?;
//! ```

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::AuthError;
use super::token::TokenResponse;

/// Path of the token endpoint relative to the authorization server.
const TOKEN_PATH: &str = "oauth/token";

/// Client id and secret used for the client-credentials grant.
#[derive(Clone)]
pub struct ClientCredentials {
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
}

impl ClientCredentials {
    /// Create a new credential pair.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Response of `GET /info`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerInfo {
    /// Authorization server advertised by CredHub.
    #[serde(rename = "auth-server")]
    pub auth_server: AuthServerInfo,

    /// Application metadata (name, and version on 1.x servers).
    #[serde(default)]
    pub app: Option<AppInfo>,
}

/// The `auth-server` block of `/info`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthServerInfo {
    /// Base URL of the UAA server.
    pub url: String,
}

/// The `app` block of `/info`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppInfo {
    /// Application name (normally "CredHub").
    #[serde(default)]
    pub name: String,

    /// Application version; only present on 1.x servers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Error response from OAuth endpoints.
#[derive(Debug, Clone, Deserialize)]
struct OAuthError {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Form body of the token request.
#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    response_type: &'a str,
}

/// Client for the UAA token endpoint.
#[derive(Clone)]
pub struct UaaClient {
    client: Client,
    token_url: Url,
    credentials: ClientCredentials,
}

impl UaaClient {
    /// Create a client for a known authorization server URL.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Discovery`] if `auth_server` is not a valid URL.
    pub fn new(
        client: Client,
        auth_server: &str,
        credentials: ClientCredentials,
    ) -> Result<Self, AuthError> {
        let token_url = token_url(auth_server)?;
        Ok(Self {
            client,
            token_url,
            credentials,
        })
    }

    /// Discover the authorization server from CredHub's `/info` endpoint
    /// and create a client for it.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Network`] if `/info` cannot be reached
    /// - [`AuthError::Discovery`] if the response lacks a usable auth server
    pub async fn discover(
        client: &Client,
        credhub_url: &Url,
        credentials: ClientCredentials,
    ) -> Result<Self, AuthError> {
        let info = fetch_info(client, credhub_url).await?;
        tracing::debug!(auth_server = %info.auth_server.url, "discovered authorization server");
        Self::new(client.clone(), &info.auth_server.url, credentials)
    }

    /// The resolved token endpoint.
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    /// The configured client id.
    pub fn client_id(&self) -> &str {
        &self.credentials.client_id
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        headers
    }

    /// Run the client-credentials grant.
    ///
    /// # Errors
    ///
    /// - [`AuthError::TokenRejected`] if the server returns an OAuth error
    /// - [`AuthError::Server`] for other non-success responses
    /// - [`AuthError::InvalidTokenResponse`] if a 2xx body cannot be parsed
    /// - [`AuthError::Network`] if there's a network error
    pub async fn request_token(&self) -> Result<TokenResponse, AuthError> {
        let request = TokenRequest {
            grant_type: "client_credentials",
            client_id: &self.credentials.client_id,
            client_secret: &self.credentials.client_secret,
            response_type: "token",
        };

        let response = self
            .client
            .post(self.token_url.clone())
            .headers(self.headers())
            .form(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(serde_json::from_str(&body)?);
        }

        if let Ok(err) = serde_json::from_str::<OAuthError>(&body) {
            Err(AuthError::TokenRejected {
                error: err.error,
                description: err.error_description.unwrap_or_default(),
            })
        } else {
            Err(AuthError::Server {
                status: status.as_u16(),
                message: body,
            })
        }
    }
}

impl fmt::Debug for UaaClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UaaClient")
            .field("token_url", &self.token_url.as_str())
            .field("credentials", &self.credentials)
            .finish()
    }
}

/// Fetch `GET /info` from a CredHub server.
pub async fn fetch_info(client: &Client, credhub_url: &Url) -> Result<ServerInfo, AuthError> {
    let url = credhub_url
        .join("info")
        .map_err(|e| AuthError::Discovery(format!("invalid info URL: {}", e)))?;

    let response = client
        .get(url)
        .header(ACCEPT, "application/json")
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(AuthError::Server {
            status: status.as_u16(),
            message: body,
        });
    }

    serde_json::from_str(&body)
        .map_err(|e| AuthError::Discovery(format!("failed to parse /info response: {}", e)))
}

/// Build the token endpoint URL from an authorization server base URL.
fn token_url(auth_server: &str) -> Result<Url, AuthError> {
    let mut base = Url::parse(auth_server).map_err(|e| {
        AuthError::Discovery(format!("invalid auth server URL '{}': {}", auth_server, e))
    })?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(TOKEN_PATH)
        .map_err(|e| AuthError::Discovery(format!("invalid token URL: {}", e)))
}
