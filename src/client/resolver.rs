//! client::resolver
//!
//! Write-mode resolution.
//!
//! # Design
//!
//! All three write modes funnel through one create primitive; they differ
//! only in whether the latest version is consulted first:
//!
//! | mode | latest exists | latest missing |
//! |---|---|---|
//! | `Overwrite` | create (history not read) | create |
//! | `NoOverwrite` | return latest | create |
//! | `Converge` | equal value: return latest, else create | create |
//!
//! Only [`CredHubError::NotFound`] counts as "latest missing". Any other
//! failure while reading history aborts the write.
//!
//! The policy never depends on the API generation; that is confined to the
//! backend's request encoding.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::errors::CredHubError;
use crate::core::credential::{Credential, WriteMode};
use crate::core::values::{values_converge, ConvergeComparison};

/// The two primitives the resolver needs from a CredHub server.
#[async_trait]
pub trait CredentialBackend: Send + Sync {
    /// Latest version of `name`.
    ///
    /// Must fail with [`CredHubError::NotFound`] when the name has no versions.
    async fn latest(&self, name: &str) -> Result<Credential, CredHubError>;

    /// Create a new version and return it as stored.
    async fn create(
        &self,
        credential: &Credential,
        mode: WriteMode,
        params: Option<&Map<String, Value>>,
    ) -> Result<Credential, CredHubError>;
}

/// Apply `mode` to write `credential` through `backend`.
///
/// # Errors
///
/// Any error from reading history other than `NotFound`, any error from the
/// create request, and decode errors from the converge comparison.
pub async fn resolve_write<B>(
    backend: &B,
    credential: &Credential,
    mode: WriteMode,
    params: Option<&Map<String, Value>>,
    comparison: ConvergeComparison,
) -> Result<Credential, CredHubError>
where
    B: CredentialBackend + ?Sized,
{
    if mode.consults_history() {
        match backend.latest(&credential.name).await {
            Ok(existing) => {
                if mode == WriteMode::NoOverwrite {
                    tracing::debug!(name = %credential.name, id = %existing.id, "keeping existing version");
                    return Ok(existing);
                }
                if values_converge(&existing, credential, comparison)? {
                    tracing::debug!(name = %credential.name, id = %existing.id, "value unchanged, keeping existing version");
                    return Ok(existing);
                }
            }
            Err(CredHubError::NotFound(_)) => {
                tracing::debug!(name = %credential.name, "no existing version");
            }
            Err(e) => return Err(e),
        }
    }

    backend.create(credential, mode, params).await
}
