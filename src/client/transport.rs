//! client::transport
//!
//! Authenticated HTTP transport for the CredHub API.
//!
//! # Design
//!
//! Every request carries a bearer token from the shared [`TokenProvider`].
//! A 401 from CredHub triggers one token refresh and one retry of the same
//! request; a second 401 is reported as an authentication failure.
//!
//! Endpoints are resolved relative to the base URL, so a CredHub mounted
//! under a context path (`https://host/credhub/`) keeps that prefix.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method, Response, StatusCode, Url};
use serde_json::Value;

use super::errors::CredHubError;
use crate::auth::{
    fetch_info, AuthError, ClientCredentials, ServerInfo, TokenProvider, UaaClient,
    UaaTokenProvider,
};
use crate::core::config::ClientConfig;

/// Authenticated HTTP transport bound to one CredHub server.
#[derive(Clone)]
pub struct Transport {
    client: Client,
    base_url: Url,
    provider: Arc<dyn TokenProvider>,
}

// Custom Debug to avoid exposing provider state
impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("base_url", &self.base_url.as_str())
            .field("auth_server", &self.provider.auth_server())
            .finish()
    }
}

impl Transport {
    /// Build a transport from configuration.
    ///
    /// Discovers the authorization server and acquires the first token, so a
    /// returned transport is known to hold valid credentials.
    ///
    /// # Errors
    ///
    /// - [`CredHubError::Configuration`] if no URL is configured
    /// - [`CredHubError::InvalidUrl`] if the URL is unusable (no request is sent)
    /// - [`CredHubError::Authentication`] if discovery or the grant fails
    /// - [`CredHubError::Transport`] if the HTTP client cannot be built
    pub async fn connect(config: &ClientConfig) -> Result<Self, CredHubError> {
        let url = config
            .url()
            .map_err(|e| CredHubError::Configuration(e.to_string()))?;
        let base_url = parse_base_url(url)?;
        let credentials = ClientCredentials::new(
            config.client_id().map_err(missing_credentials)?,
            config.client_secret().map_err(missing_credentials)?,
        );

        let client = Client::builder()
            .danger_accept_invalid_certs(config.skip_tls_verify)
            .timeout(config.request_timeout())
            .build()?;

        let uaa = UaaClient::discover(&client, &base_url, credentials).await?;
        let provider = UaaTokenProvider::connect(uaa).await?;
        tracing::debug!(url = %base_url, "connected to CredHub");

        Ok(Self::with_provider(base_url, client, Arc::new(provider)))
    }

    /// Build a transport around an existing provider.
    pub fn with_provider(base_url: Url, client: Client, provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            client,
            base_url,
            provider,
        }
    }

    /// The normalized base URL (always ends with `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The token provider shared by all requests.
    pub fn provider(&self) -> &Arc<dyn TokenProvider> {
        &self.provider
    }

    /// Resolve an endpoint path against the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, CredHubError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| CredHubError::InvalidUrl {
                url: path.to_string(),
                reason: e.to_string(),
            })
    }

    /// Resolve `path` and append `segment` as a single path segment.
    ///
    /// The segment is percent-encoded, so `/`, `?` and `#` in it cannot
    /// change which resource is addressed.
    pub fn item_endpoint(&self, path: &str, segment: &str) -> Result<Url, CredHubError> {
        let mut url = self.endpoint(path)?;
        url.path_segments_mut()
            .map_err(|()| CredHubError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: "URL cannot carry path segments".into(),
            })?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    /// Fetch `/info` (unauthenticated).
    pub async fn info(&self) -> Result<ServerInfo, CredHubError> {
        Ok(fetch_info(&self.client, &self.base_url).await?)
    }

    /// Send an unauthenticated GET and return the raw response.
    ///
    /// Used for probes where the status code itself is the answer.
    pub async fn probe(&self, path: &str) -> Result<Response, CredHubError> {
        let url = self.endpoint(path)?;
        Ok(self.client.get(url).header(ACCEPT, "application/json").send().await?)
    }

    fn headers(token: &str) -> Result<HeaderMap, CredHubError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
            CredHubError::Authentication(AuthError::InvalidTokenResponse(
                "token contains invalid header characters".into(),
            ))
        })?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &Url,
        query: &[(&str, String)],
        body: Option<&Value>,
        token: &str,
    ) -> Result<Response, CredHubError> {
        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .headers(Self::headers(token)?);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    /// Send an authenticated request and return the successful response.
    ///
    /// # Errors
    ///
    /// - [`CredHubError::NotFound`] on 404
    /// - [`CredHubError::Authentication`] on 401 after one refresh and retry
    /// - [`CredHubError::Api`] on any other non-success status
    /// - [`CredHubError::Transport`] if the request cannot be sent
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Response, CredHubError> {
        self.execute_at(method, self.endpoint(path)?, query, body).await
    }

    /// Like [`Transport::execute`] but for an already resolved URL.
    pub async fn execute_at(
        &self,
        method: Method,
        url: Url,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Response, CredHubError> {
        tracing::debug!(%method, %url, "sending CredHub request");

        let token = self.provider.bearer_token().await?;
        let mut response = self.send_once(&method, &url, query, body, &token).await?;

        // Retry once with a fresh token
        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::debug!(%url, "token rejected, refreshing");
            let token = self.provider.refresh_rejected(&token).await?;
            response = self.send_once(&method, &url, query, body, &token).await?;
            if response.status() == StatusCode::UNAUTHORIZED {
                return Err(AuthError::Unauthorized.into());
            }
        }

        check_status(response).await
    }

    /// Like [`Transport::execute`] but decodes the body as JSON.
    pub async fn execute_json(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value, CredHubError> {
        self.execute_json_at(method, self.endpoint(path)?, query, body).await
    }

    /// Like [`Transport::execute_json`] but for an already resolved URL.
    pub async fn execute_json_at(
        &self,
        method: Method,
        url: Url,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value, CredHubError> {
        let response = self.execute_at(method, url, query, body).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn missing_credentials(err: crate::core::config::ConfigError) -> CredHubError {
    CredHubError::Authentication(AuthError::MissingCredentials(err.to_string()))
}

/// Map a non-success response to an error, passing successes through.
async fn check_status(response: Response) -> Result<Response, CredHubError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body)
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_default();

    Err(match status {
        StatusCode::NOT_FOUND => CredHubError::NotFound(message),
        StatusCode::UNAUTHORIZED => AuthError::Unauthorized.into(),
        _ => CredHubError::Api {
            status: status.as_u16(),
            message,
        },
    })
}

/// Extract CredHub's `{"error": "..."}` message, falling back to the raw body.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => map
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| Some(trimmed.to_string())),
        _ => Some(trimmed.to_string()),
    }
}

/// Parse and normalize a CredHub base URL.
///
/// Only `http` and `https` are accepted. A trailing `/` is added so relative
/// endpoint paths resolve under any context path.
///
/// # Example
///
/// ```
/// use credhub_client::client::parse_base_url;
///
/// let url = parse_base_url("https://credhub.example.com:8844/ctx").unwrap();
/// assert_eq!(url.as_str(), "https://credhub.example.com:8844/ctx/");
/// assert!(parse_base_url("not a url").is_err());
/// ```
pub fn parse_base_url(raw: &str) -> Result<Url, CredHubError> {
    let invalid = |reason: String| CredHubError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    let mut url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{}'", other))),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".into()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
