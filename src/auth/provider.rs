//! auth::provider
//!
//! UaaTokenProvider - TokenProvider implementation for the UAA
//! client-credentials grant.
//!
//! # Concurrency
//!
//! The provider is shared by every request a client issues. Token state is
//! an owned field guarded by two primitives:
//!
//! - `cache` (`RwLock`) holds the current token; readers never block each
//!   other.
//! - `refresh_guard` (`Mutex`) serializes refreshes.
//!
//! Every stored token bumps a refresh generation. The refresh pattern is:
//!
//! 1. Check if refresh is needed (read lock), noting the generation seen
//! 2. If so, acquire the refresh guard
//! 3. Re-check after acquiring the guard: a different generation means
//!    another task already refreshed
//! 4. Perform refresh if the generation is unchanged
//! 5. Swap the new token into the cache and release the guard
//!
//! Simultaneous expiry therefore produces exactly one token request, even
//! when the server issues tokens that are already inside the expiry buffer,
//! and no reader ever observes a partially updated token.

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use super::errors::AuthError;
use super::token::AccessToken;
use super::uaa::UaaClient;
use super::TokenProvider;

/// Token provider backed by a UAA client-credentials grant.
pub struct UaaTokenProvider {
    uaa: UaaClient,
    cache: RwLock<TokenCache>,
    refresh_guard: Mutex<()>,
}

/// The current token and how many tokens have been stored so far.
#[derive(Default)]
struct TokenCache {
    token: Option<AccessToken>,
    generation: u64,
}

impl UaaTokenProvider {
    /// Create a provider without acquiring a token.
    ///
    /// The first call to [`TokenProvider::bearer_token`] performs the grant.
    pub fn new(uaa: UaaClient) -> Self {
        Self {
            uaa,
            cache: RwLock::new(TokenCache::default()),
            refresh_guard: Mutex::new(()),
        }
    }

    /// Create a provider and perform the initial token acquisition.
    ///
    /// # Errors
    ///
    /// Fails if the grant fails; no provider is returned in that case.
    pub async fn connect(uaa: UaaClient) -> Result<Self, AuthError> {
        let provider = Self::new(uaa);
        provider.refresh_if(0).await?;
        Ok(provider)
    }

    /// The UAA client this provider uses.
    pub fn uaa(&self) -> &UaaClient {
        &self.uaa
    }

    /// Return the cached token if it is still usable.
    async fn cached(&self) -> Option<AccessToken> {
        let cache = self.cache.read().await;
        cache.token.as_ref().filter(|t| !t.needs_refresh()).cloned()
    }

    async fn store(&self, token: AccessToken) {
        let mut cache = self.cache.write().await;
        cache.token = Some(token);
        cache.generation += 1;
    }

    /// Refresh under the guard unless the cache moved past generation `seen`.
    ///
    /// A refresh completed by another task while this one waited is reused,
    /// whatever its remaining lifetime.
    async fn refresh_if(&self, seen: u64) -> Result<AccessToken, AuthError> {
        let _guard = self.refresh_guard.lock().await;

        {
            let cache = self.cache.read().await;
            if cache.generation != seen {
                if let Some(token) = cache.token.as_ref() {
                    return Ok(token.clone());
                }
            }
        }

        tracing::debug!(token_url = %self.uaa.token_url(), "requesting access token");
        let response = self.uaa.request_token().await?;
        let token = AccessToken::from(response);
        self.store(token.clone()).await;
        Ok(token)
    }
}

#[async_trait]
impl TokenProvider for UaaTokenProvider {
    async fn bearer_token(&self) -> Result<String, AuthError> {
        let seen = {
            let cache = self.cache.read().await;
            match cache.token.as_ref() {
                Some(token) if !token.needs_refresh() => return Ok(token.value().to_string()),
                _ => cache.generation,
            }
        };

        let token = self.refresh_if(seen).await?;
        Ok(token.value().to_string())
    }

    async fn refresh_rejected(&self, rejected: &str) -> Result<String, AuthError> {
        let seen = {
            let cache = self.cache.read().await;
            match cache.token.as_ref() {
                // Already replaced by another task
                Some(token) if token.value() != rejected => {
                    return Ok(token.value().to_string())
                }
                _ => cache.generation,
            }
        };

        let token = self.refresh_if(seen).await?;
        Ok(token.value().to_string())
    }

    async fn is_authenticated(&self) -> bool {
        self.cached().await.is_some()
    }

    fn auth_server(&self) -> &str {
        self.uaa.token_url().as_str()
    }
}

// Custom Debug to avoid exposing tokens
impl std::fmt::Debug for UaaTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UaaTokenProvider")
            .field("uaa", &self.uaa)
            .finish_non_exhaustive()
    }
}
