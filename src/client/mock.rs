//! client::mock
//!
//! In-memory credential backend for deterministic testing.
//!
//! # Design
//!
//! `MockCredHub` implements [`CredentialBackend`] over a map of version
//! histories. Ids are random UUIDs and creation timestamps come from a
//! private clock that advances one second per write, so ordering is
//! deterministic. Every call is recorded, and a single operation can be
//! configured to fail.
//!
//! # Example
//!
//! ```
//! use credhub_client::client::mock::MockCredHub;
//! use credhub_client::client::resolve_write;
//! use credhub_client::core::credential::{Credential, CredentialType, WriteMode};
//!
//! # tokio_test::block_on(async {
//! let mock = MockCredHub::new();
//! let cred = Credential::new("/app/token", CredentialType::Value, "abc");
//!
//! let first = resolve_write(&mock, &cred, WriteMode::NoOverwrite, None, Default::default())
//!     .await
//!     .unwrap();
//! let again = resolve_write(&mock, &cred, WriteMode::NoOverwrite, None, Default::default())
//!     .await
//!     .unwrap();
//!
//! assert_eq!(first.id, again.id);
//! assert_eq!(mock.create_count(), 1);
//! # });
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::errors::CredHubError;
use super::resolver::CredentialBackend;
use crate::core::credential::{sort_newest_first, Credential, WriteMode};

/// Mock CredHub for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone)]
pub struct MockCredHub {
    inner: Arc<Mutex<MockCredHubInner>>,
}

#[derive(Debug)]
struct MockCredHubInner {
    /// Version histories by name, oldest first.
    versions: HashMap<String, Vec<Credential>>,
    /// Timestamp given to the next version.
    clock: DateTime<Utc>,
    /// Operation to fail on (for testing error paths).
    fail_on: Option<FailOn>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail `latest` with the given error.
    Latest(CredHubError),
    /// Fail `create` with the given error.
    Create(CredHubError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq)]
pub enum MockOperation {
    Latest {
        name: String,
    },
    Create {
        name: String,
        mode: WriteMode,
        params: Option<Map<String, Value>>,
    },
}

impl MockCredHub {
    /// Create an empty mock.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockCredHubInner {
                versions: HashMap::new(),
                clock: Utc.with_ymd_and_hms(2017, 1, 1, 0, 0, 0).single().unwrap_or_default(),
                fail_on: None,
                operations: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockCredHubInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store a version directly, without recording an operation.
    ///
    /// Returns the stored version with its assigned id and timestamp.
    pub fn seed(&self, credential: Credential) -> Credential {
        self.lock().store(credential)
    }

    /// Configure an operation to fail until cleared.
    pub fn fail_on(&self, fail_on: FailOn) {
        self.lock().fail_on = Some(fail_on);
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        self.lock().fail_on = None;
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }

    /// Number of create calls that reached the mock, successful or not.
    pub fn create_count(&self) -> usize {
        self.lock()
            .operations
            .iter()
            .filter(|op| matches!(op, MockOperation::Create { .. }))
            .count()
    }

    /// All stored versions of `name`, newest first.
    pub fn versions(&self, name: &str) -> Vec<Credential> {
        let mut versions = self.lock().versions.get(name).cloned().unwrap_or_default();
        sort_newest_first(&mut versions);
        versions
    }
}

impl MockCredHubInner {
    fn store(&mut self, mut credential: Credential) -> Credential {
        credential.id = Uuid::new_v4().to_string();
        credential.created = self.clock.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        self.clock += Duration::seconds(1);

        self.versions
            .entry(credential.name.clone())
            .or_default()
            .push(credential.clone());
        credential
    }
}

impl Default for MockCredHub {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialBackend for MockCredHub {
    async fn latest(&self, name: &str) -> Result<Credential, CredHubError> {
        let mut inner = self.lock();
        inner.operations.push(MockOperation::Latest {
            name: name.to_string(),
        });
        if let Some(FailOn::Latest(e)) = &inner.fail_on {
            return Err(e.clone());
        }

        inner
            .versions
            .get(name)
            .and_then(|versions| versions.last())
            .cloned()
            .ok_or_else(|| CredHubError::NotFound(format!("no credential named '{}'", name)))
    }

    async fn create(
        &self,
        credential: &Credential,
        mode: WriteMode,
        params: Option<&Map<String, Value>>,
    ) -> Result<Credential, CredHubError> {
        let mut inner = self.lock();
        inner.operations.push(MockOperation::Create {
            name: credential.name.clone(),
            mode,
            params: params.cloned(),
        });
        if let Some(FailOn::Create(e)) = &inner.fail_on {
            return Err(e.clone());
        }

        Ok(inner.store(credential.clone()))
    }
}
