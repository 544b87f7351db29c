//! core::credential
//!
//! The credential envelope, its type tag, write modes and version ordering.
//!
//! # Wire Shape
//!
//! ```json
//! {
//!   "id": "6ba7b810-9dad-11d1-80b4-00c04fd430c8",
//!   "name": "/sample-set",
//!   "type": "user",
//!   "value": {"username": "me", "password": "super-secret"},
//!   "version_created_at": "2017-01-01T04:07:18Z"
//! }
//! ```
//!
//! `id` and `version_created_at` are assigned by the server. They are empty
//! on a credential built by a caller and are never sent on write.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Discriminator for the shape of a credential's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialType {
    /// Arbitrary string.
    Value,
    /// Arbitrary JSON object.
    Json,
    /// Single password string.
    Password,
    /// Username/password pair.
    User,
    /// CA, certificate and private key.
    Certificate,
    /// RSA key pair.
    Rsa,
    /// SSH key pair.
    Ssh,
    /// Any tag this client does not model, or no tag at all (path listings).
    #[default]
    #[serde(other)]
    Unknown,
}

impl CredentialType {
    /// The wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialType::Value => "value",
            CredentialType::Json => "json",
            CredentialType::Password => "password",
            CredentialType::User => "user",
            CredentialType::Certificate => "certificate",
            CredentialType::Rsa => "rsa",
            CredentialType::Ssh => "ssh",
            CredentialType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CredentialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CredentialType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "value" => Ok(CredentialType::Value),
            "json" => Ok(CredentialType::Json),
            "password" => Ok(CredentialType::Password),
            "user" => Ok(CredentialType::User),
            "certificate" => Ok(CredentialType::Certificate),
            "rsa" => Ok(CredentialType::Rsa),
            "ssh" => Ok(CredentialType::Ssh),
            other => Err(format!(
                "unknown credential type '{}', must be one of: value, json, password, user, certificate, rsa, ssh",
                other
            )),
        }
    }
}

/// Policy deciding whether a write creates a new version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteMode {
    /// Always create a new version.
    #[default]
    Overwrite,
    /// Create only if the name has no version yet; otherwise return the latest.
    NoOverwrite,
    /// Create only if the value differs from the latest version.
    Converge,
}

impl WriteMode {
    /// The wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteMode::Overwrite => "overwrite",
            WriteMode::NoOverwrite => "no-overwrite",
            WriteMode::Converge => "converge",
        }
    }

    /// Whether the latest version must be fetched before deciding to write.
    pub fn consults_history(&self) -> bool {
        !matches!(self, WriteMode::Overwrite)
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WriteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "overwrite" => Ok(WriteMode::Overwrite),
            "no-overwrite" => Ok(WriteMode::NoOverwrite),
            "converge" => Ok(WriteMode::Converge),
            other => Err(format!(
                "invalid write mode '{}', must be one of: overwrite, no-overwrite, converge",
                other
            )),
        }
    }
}

/// One version of a named credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    /// Server-assigned version id; empty until written.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// Hierarchical name, e.g. `/sample-set`.
    pub name: String,

    /// Type tag; fixed for the lifetime of a name.
    #[serde(rename = "type", default)]
    pub credential_type: CredentialType,

    /// Payload whose shape is determined by `credential_type`.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub value: serde_json::Value,

    /// Server-assigned creation timestamp; the sole ordering key.
    #[serde(
        rename = "version_created_at",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub created: String,
}

impl Credential {
    /// Build a candidate credential for writing.
    ///
    /// # Example
    ///
    /// ```
    /// use credhub_client::core::credential::{Credential, CredentialType};
    ///
    /// let cred = Credential::new("/app/db-password", CredentialType::Password, "hunter2");
    /// assert!(cred.id.is_empty());
    /// assert_eq!(cred.value, "hunter2");
    /// ```
    pub fn new(
        name: impl Into<String>,
        credential_type: CredentialType,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            credential_type,
            value: value.into(),
            created: String::new(),
        }
    }

    /// Build a candidate credential from any serializable typed value.
    ///
    /// # Errors
    ///
    /// Returns the serialization error if `value` cannot be represented as JSON.
    pub fn from_typed<T: Serialize>(
        name: impl Into<String>,
        credential_type: CredentialType,
        value: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(name, credential_type, serde_json::to_value(value)?))
    }

    /// Whether the server has assigned this version an id and timestamp.
    pub fn is_persisted(&self) -> bool {
        !self.id.is_empty() && !self.created.is_empty()
    }
}

/// Order two versions newest first by byte-wise comparison of `created`.
///
/// Timestamps are ISO-8601 strings from the server, so lexicographic order
/// is chronological order. Equal timestamps compare equal; callers use a
/// stable sort so ties keep the server's relative order.
pub fn newest_first(a: &Credential, b: &Credential) -> Ordering {
    b.created.as_bytes().cmp(a.created.as_bytes())
}

/// Sort versions newest first, keeping ties in their original order.
pub fn sort_newest_first(versions: &mut [Credential]) {
    versions.sort_by(newest_first);
}
