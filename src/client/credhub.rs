//! client::credhub
//!
//! `CredHubClient` - version history retrieval and writes against a live
//! CredHub server.
//!
//! # Design
//!
//! The client owns a [`Transport`] and the [`ApiGeneration`] detected when it
//! was built. It holds no credential state; every call round-trips. Writes
//! go through [`resolve_write`] with the client acting as the
//! [`CredentialBackend`].
//!
//! The client is `Send + Sync` and is meant to be shared through an `Arc`.
//!
//! # Example
//!
//! ```ignore
//! use credhub_client::client::CredHubClient;
//! use credhub_client::core::config::ClientConfig;
//! use credhub_client::core::credential::{Credential, CredentialType, WriteMode};
//!
//! let client = CredHubClient::connect(&ClientConfig::load(None)?).await?;
//! let cred = Credential::new("/app/db-password", CredentialType::Password, "hunter2");
//! let stored = client.set(&cred, WriteMode::Converge, None).await?;
//! let latest = client.get_latest_by_name("/app/db-password").await?;
//! assert_eq!(stored.id, latest.id);
//! ```

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Map, Value};

use super::errors::CredHubError;
use super::generation::ApiGeneration;
use super::resolver::{resolve_write, CredentialBackend};
use super::transport::Transport;
use crate::auth::ServerInfo;
use crate::core::config::ClientConfig;
use crate::core::credential::{sort_newest_first, Credential, WriteMode};
use crate::core::values::ConvergeComparison;

/// Client for the CredHub credential API.
#[derive(Debug, Clone)]
pub struct CredHubClient {
    transport: Transport,
    generation: ApiGeneration,
    comparison: ConvergeComparison,
}

impl CredHubClient {
    /// Connect using configuration: authenticate, then probe the API generation.
    ///
    /// # Errors
    ///
    /// Fails if the URL is invalid, authentication fails, or the generation
    /// probe fails. No client is returned in those cases.
    pub async fn connect(config: &ClientConfig) -> Result<Self, CredHubError> {
        let transport = Transport::connect(config).await?;
        let mut client = Self::with_transport(transport).await?;
        client.comparison = config.converge_comparison;
        Ok(client)
    }

    /// Build a client over an existing transport, probing its generation.
    pub async fn with_transport(transport: Transport) -> Result<Self, CredHubError> {
        let generation = ApiGeneration::detect(&transport).await?;
        Ok(Self::with_generation(transport, generation))
    }

    /// Build a client with a known generation, skipping the probe.
    pub fn with_generation(transport: Transport, generation: ApiGeneration) -> Self {
        Self {
            transport,
            generation,
            comparison: ConvergeComparison::default(),
        }
    }

    /// Set the equality policy used by [`WriteMode::Converge`].
    pub fn with_comparison(mut self, comparison: ConvergeComparison) -> Self {
        self.comparison = comparison;
        self
    }

    /// The generation detected at construction.
    pub fn generation(&self) -> ApiGeneration {
        self.generation
    }

    /// Whether the server speaks the v1 API.
    pub fn is_v1_api(&self) -> bool {
        self.generation.is_v1()
    }

    /// The underlying transport.
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Server info from `/info`.
    pub async fn info(&self) -> Result<ServerInfo, CredHubError> {
        self.transport.info().await
    }

    /// List credentials stored under a path.
    ///
    /// Path listings carry only names and timestamps.
    ///
    /// # Errors
    ///
    /// [`CredHubError::NotFound`] if the path is unknown.
    pub async fn find_by_path(&self, path: &str) -> Result<Vec<Credential>, CredHubError> {
        let body = self
            .transport
            .execute_json(
                Method::GET,
                self.generation.data_path(),
                &[("path", path.to_string())],
                None,
            )
            .await?;
        self.generation.decode_path_listing(body)
    }

    /// List credentials whose name contains `fragment`.
    pub async fn find_by_partial_name(
        &self,
        fragment: &str,
    ) -> Result<Vec<Credential>, CredHubError> {
        let body = self
            .transport
            .execute_json(
                Method::GET,
                self.generation.data_path(),
                &[("name-like", fragment.to_string())],
                None,
            )
            .await?;
        self.generation.decode_path_listing(body)
    }

    /// Fetch one version by its id.
    pub async fn get_by_id(&self, id: &str) -> Result<Credential, CredHubError> {
        let url = self.transport.item_endpoint(self.generation.data_path(), id)?;
        let body = self
            .transport
            .execute_json_at(Method::GET, url, &[], None)
            .await?;
        self.generation.decode_credential(body)
    }

    /// Fetch versions of `name`, newest first.
    ///
    /// `latest_only` asks the server for the current version only.
    /// `max_versions` bounds the count; `None` or `Some(0)` means unbounded.
    ///
    /// # Errors
    ///
    /// [`CredHubError::NotFound`] if the name is unknown.
    pub async fn get_by_name(
        &self,
        name: &str,
        latest_only: bool,
        max_versions: Option<usize>,
    ) -> Result<Vec<Credential>, CredHubError> {
        let mut query = vec![("name", name.to_string())];
        if latest_only {
            query.push(("current", "true".to_string()));
        }
        if let Some(count) = max_versions.filter(|&n| n > 0) {
            query.push(("versions", count.to_string()));
        }

        let body = self
            .transport
            .execute_json(Method::GET, self.generation.data_path(), &query, None)
            .await?;
        let mut versions = self.generation.decode_versions(body)?;
        sort_newest_first(&mut versions);
        Ok(versions)
    }

    /// All versions of `name`, newest first.
    pub async fn get_all_by_name(&self, name: &str) -> Result<Vec<Credential>, CredHubError> {
        self.get_by_name(name, false, None).await
    }

    /// At most `count` versions of `name`, newest first.
    pub async fn get_versions_by_name(
        &self,
        name: &str,
        count: usize,
    ) -> Result<Vec<Credential>, CredHubError> {
        self.get_by_name(name, false, Some(count)).await
    }

    /// The current version of `name`.
    ///
    /// # Errors
    ///
    /// - [`CredHubError::NotFound`] if the name is unknown
    /// - [`CredHubError::EmptyResult`] if the server returned no versions
    pub async fn get_latest_by_name(&self, name: &str) -> Result<Credential, CredHubError> {
        self.get_by_name(name, true, None)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CredHubError::EmptyResult(name.to_string()))
    }

    /// Write `credential` under `mode`.
    ///
    /// `params` are passed to the create request when one is issued and
    /// never influence whether it is issued.
    pub async fn set(
        &self,
        credential: &Credential,
        mode: WriteMode,
        params: Option<&Map<String, Value>>,
    ) -> Result<Credential, CredHubError> {
        resolve_write(self, credential, mode, params, self.comparison).await
    }

    /// Delete every version of `name`.
    ///
    /// # Errors
    ///
    /// [`CredHubError::NotFound`] if the name is unknown.
    pub async fn delete(&self, name: &str) -> Result<(), CredHubError> {
        self.transport
            .execute(
                Method::DELETE,
                self.generation.data_path(),
                &[("name", name.to_string())],
                None,
            )
            .await?;
        tracing::debug!(%name, "deleted credential");
        Ok(())
    }
}

#[async_trait]
impl CredentialBackend for CredHubClient {
    async fn latest(&self, name: &str) -> Result<Credential, CredHubError> {
        self.get_latest_by_name(name).await
    }

    async fn create(
        &self,
        credential: &Credential,
        mode: WriteMode,
        params: Option<&Map<String, Value>>,
    ) -> Result<Credential, CredHubError> {
        let encoded = self.generation.encode_write(credential, mode, params);
        if !encoded.dropped.is_empty() {
            tracing::warn!(
                generation = ?self.generation,
                ignored = ?encoded.dropped,
                "write parameters are ignored by this API generation"
            );
        }

        let body = self
            .transport
            .execute_json(
                Method::PUT,
                self.generation.data_path(),
                &[],
                Some(&encoded.body),
            )
            .await?;
        self.generation.decode_credential(body)
    }
}
