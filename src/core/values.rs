//! core::values
//!
//! Typed credential payloads and projections from the generic envelope.
//!
//! # Design
//!
//! [`Credential::value`] is untyped JSON. The accessors here project it into
//! the concrete shape named by the credential's type tag, failing with
//! [`CredHubError::TypeMismatch`] when the tag does not match and with
//! [`CredHubError::Decode`] when the tag matches but the payload does not.
//!
//! [`TypedValue`] is the same projection as a closed enum, used by the
//! converge write mode to compare two payloads structurally instead of by
//! their wire bytes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::credential::{Credential, CredentialType};
use crate::client::CredHubError;

/// Payload of a `user` credential.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserValue {
    /// Username; CredHub permits a null username.
    #[serde(default)]
    pub username: Option<String>,
    pub password: String,
    /// SHA-512 crypt of the password, computed by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
}

/// Payload of a `certificate` credential.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CertificateValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca: Option<String>,
    /// Name of a CA credential to sign with, instead of an inline `ca`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

/// Payload of an `rsa` credential.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RsaValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

/// Payload of an `ssh` credential.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SshValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    /// Computed by the server from `public_key`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_fingerprint: Option<String>,
}

/// How the converge write mode decides two payloads are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConvergeComparison {
    /// Every field of the typed payload must match.
    Strict,
    /// Fields the server derives from others (`password_hash`,
    /// `public_key_fingerprint`) are left out of the comparison.
    #[default]
    IgnoreServerDerived,
}

/// A credential payload decoded into its concrete shape.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Value(String),
    Json(serde_json::Value),
    Password(String),
    User(UserValue),
    Certificate(CertificateValue),
    Rsa(RsaValue),
    Ssh(SshValue),
    /// Payload of a type this client does not model; compared as JSON.
    Opaque(serde_json::Value),
}

impl TypedValue {
    /// Decode a raw payload according to its type tag.
    ///
    /// # Errors
    ///
    /// Returns [`CredHubError::Decode`] if the payload does not fit the shape.
    pub fn decode(
        credential_type: CredentialType,
        value: &serde_json::Value,
    ) -> Result<Self, CredHubError> {
        Ok(match credential_type {
            CredentialType::Value => TypedValue::Value(decode_as(credential_type, value)?),
            CredentialType::Json => TypedValue::Json(value.clone()),
            CredentialType::Password => TypedValue::Password(decode_as(credential_type, value)?),
            CredentialType::User => TypedValue::User(decode_as(credential_type, value)?),
            CredentialType::Certificate => {
                TypedValue::Certificate(decode_as(credential_type, value)?)
            }
            CredentialType::Rsa => TypedValue::Rsa(decode_as(credential_type, value)?),
            CredentialType::Ssh => TypedValue::Ssh(decode_as(credential_type, value)?),
            CredentialType::Unknown => TypedValue::Opaque(value.clone()),
        })
    }

    /// Drop fields the comparison policy ignores.
    fn normalized(self, comparison: ConvergeComparison) -> Self {
        match (comparison, self) {
            (ConvergeComparison::Strict, value) => value,
            (ConvergeComparison::IgnoreServerDerived, TypedValue::User(mut user)) => {
                user.password_hash = None;
                TypedValue::User(user)
            }
            (ConvergeComparison::IgnoreServerDerived, TypedValue::Ssh(mut ssh)) => {
                ssh.public_key_fingerprint = None;
                TypedValue::Ssh(ssh)
            }
            (ConvergeComparison::IgnoreServerDerived, value) => value,
        }
    }
}

/// Decide whether writing `candidate` over `existing` would change nothing.
///
/// Both payloads are decoded into their typed shape before comparison, so
/// field order and whitespace in the wire format are irrelevant. A type
/// change is never a match.
///
/// # Errors
///
/// Returns [`CredHubError::Decode`] if either payload does not fit its tag.
pub fn values_converge(
    existing: &Credential,
    candidate: &Credential,
    comparison: ConvergeComparison,
) -> Result<bool, CredHubError> {
    if existing.credential_type != candidate.credential_type {
        return Ok(false);
    }

    let existing = TypedValue::decode(existing.credential_type, &existing.value)?;
    let candidate = TypedValue::decode(candidate.credential_type, &candidate.value)?;

    Ok(existing.normalized(comparison) == candidate.normalized(comparison))
}

fn decode_as<T: DeserializeOwned>(
    credential_type: CredentialType,
    value: &serde_json::Value,
) -> Result<T, CredHubError> {
    T::deserialize(value).map_err(|e| {
        CredHubError::Decode(format!("invalid {} credential value: {}", credential_type, e))
    })
}

impl Credential {
    fn project<T: DeserializeOwned>(&self, expected: CredentialType) -> Result<T, CredHubError> {
        if self.credential_type != expected {
            return Err(CredHubError::TypeMismatch {
                expected,
                actual: self.credential_type,
            });
        }
        decode_as(expected, &self.value)
    }

    /// Project a `user` credential.
    ///
    /// # Example
    ///
    /// ```
    /// use credhub_client::core::credential::{Credential, CredentialType};
    /// use serde_json::json;
    ///
    /// let cred = Credential::new(
    ///     "/sample-set",
    ///     CredentialType::User,
    ///     json!({"username": "me", "password": "super-secret"}),
    /// );
    /// let user = cred.user_value().unwrap();
    /// assert_eq!(user.password, "super-secret");
    /// ```
    pub fn user_value(&self) -> Result<UserValue, CredHubError> {
        self.project(CredentialType::User)
    }

    /// Project a `password` credential.
    pub fn password_value(&self) -> Result<String, CredHubError> {
        self.project(CredentialType::Password)
    }

    /// Project a `value` credential.
    pub fn value_value(&self) -> Result<String, CredHubError> {
        self.project(CredentialType::Value)
    }

    /// Project a `json` credential.
    pub fn json_value(&self) -> Result<serde_json::Value, CredHubError> {
        self.project(CredentialType::Json)
    }

    /// Project a `certificate` credential.
    pub fn certificate_value(&self) -> Result<CertificateValue, CredHubError> {
        self.project(CredentialType::Certificate)
    }

    /// Project an `rsa` credential.
    pub fn rsa_value(&self) -> Result<RsaValue, CredHubError> {
        self.project(CredentialType::Rsa)
    }

    /// Project an `ssh` credential.
    pub fn ssh_value(&self) -> Result<SshValue, CredHubError> {
        self.project(CredentialType::Ssh)
    }

    /// Decode the payload according to this credential's own tag.
    pub fn typed_value(&self) -> Result<TypedValue, CredHubError> {
        TypedValue::decode(self.credential_type, &self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(password: &str, hash: Option<&str>) -> Credential {
        let mut value = json!({"username": "me", "password": password});
        if let Some(hash) = hash {
            value["password_hash"] = json!(hash);
        }
        Credential::new("/sample-set", CredentialType::User, value)
    }

    #[test]
    fn user_value_projects_fields() {
        let cred = user("old", Some("somestring"));
        let value = cred.user_value().unwrap();
        assert_eq!(value.username.as_deref(), Some("me"));
        assert_eq!(value.password, "old");
        assert_eq!(value.password_hash.as_deref(), Some("somestring"));
    }

    #[test]
    fn accessor_on_wrong_type_is_type_mismatch() {
        let cred = Credential::new("/v", CredentialType::Value, "foo");
        let err = cred.user_value().unwrap_err();
        assert!(matches!(
            err,
            CredHubError::TypeMismatch {
                expected: CredentialType::User,
                actual: CredentialType::Value
            }
        ));
    }

    #[test]
    fn accessor_on_malformed_payload_is_decode_error() {
        let cred = Credential::new("/u", CredentialType::User, json!({"username": "me"}));
        assert!(matches!(cred.user_value(), Err(CredHubError::Decode(_))));
    }

    #[test]
    fn string_accessors() {
        let value = Credential::new("/v", CredentialType::Value, "foo");
        assert_eq!(value.value_value().unwrap(), "foo");

        let password = Credential::new("/p", CredentialType::Password, "hunter2");
        assert_eq!(password.password_value().unwrap(), "hunter2");
        assert!(password.value_value().is_err());
    }

    #[test]
    fn key_pair_accessors() {
        let rsa = Credential::new(
            "/rsa",
            CredentialType::Rsa,
            json!({"public_key": "pub", "private_key": "priv"}),
        );
        assert_eq!(rsa.rsa_value().unwrap().public_key.as_deref(), Some("pub"));

        let ssh = Credential::new(
            "/ssh",
            CredentialType::Ssh,
            json!({"public_key": "pub", "private_key": "priv", "public_key_fingerprint": "fp"}),
        );
        assert_eq!(
            ssh.ssh_value().unwrap().public_key_fingerprint.as_deref(),
            Some("fp")
        );

        let cert = Credential::new(
            "/cert",
            CredentialType::Certificate,
            json!({"ca": "ca-pem", "certificate": "cert-pem", "private_key": "key-pem"}),
        );
        let value = cert.certificate_value().unwrap();
        assert_eq!(value.certificate.as_deref(), Some("cert-pem"));
        assert!(value.ca_name.is_none());
    }

    #[test]
    fn json_accessor_returns_object() {
        let cred = Credential::new("/j", CredentialType::Json, json!({"a": [1, 2]}));
        assert_eq!(cred.json_value().unwrap(), json!({"a": [1, 2]}));
    }

    #[test]
    fn converge_ignores_field_order() {
        let existing: Credential = serde_json::from_str(
            r#"{"name":"/sample-set","type":"user","value":{"password":"s","username":"me"}}"#,
        )
        .unwrap();
        let candidate: Credential = serde_json::from_str(
            r#"{"name":"/sample-set","type":"user","value":{ "username" : "me", "password" : "s" }}"#,
        )
        .unwrap();
        assert!(values_converge(&existing, &candidate, ConvergeComparison::Strict).unwrap());
    }

    #[test]
    fn converge_detects_changed_password() {
        let existing = user("super-secret", Some("somestring"));
        let candidate = user("new-super-secret", Some("somestring"));
        assert!(
            !values_converge(&existing, &candidate, ConvergeComparison::default()).unwrap()
        );
    }

    #[test]
    fn server_derived_fields_depend_on_policy() {
        let existing = user("super-secret", Some("$6$abc"));
        let candidate = user("super-secret", None);

        assert!(values_converge(
            &existing,
            &candidate,
            ConvergeComparison::IgnoreServerDerived
        )
        .unwrap());
        assert!(!values_converge(&existing, &candidate, ConvergeComparison::Strict).unwrap());
    }

    #[test]
    fn type_change_never_converges() {
        let existing = Credential::new("/x", CredentialType::Value, "foo");
        let candidate = Credential::new("/x", CredentialType::Password, "foo");
        assert!(!values_converge(&existing, &candidate, ConvergeComparison::Strict).unwrap());
    }

    #[test]
    fn malformed_existing_value_fails_comparison() {
        let existing = Credential::new("/x", CredentialType::User, json!("not an object"));
        let candidate = user("s", None);
        assert!(matches!(
            values_converge(&existing, &candidate, ConvergeComparison::Strict),
            Err(CredHubError::Decode(_))
        ));
    }

    #[test]
    fn unknown_types_compare_as_json() {
        let a = Credential::new("/x", CredentialType::Unknown, json!({"k": 1, "j": 2}));
        let b = Credential::new("/x", CredentialType::Unknown, json!({"j": 2, "k": 1}));
        assert_eq!(a.typed_value().unwrap(), b.typed_value().unwrap());
        assert!(values_converge(&a, &b, ConvergeComparison::Strict).unwrap());
    }

    #[test]
    fn comparison_policy_parses_from_config_strings() {
        let policy: ConvergeComparison = serde_json::from_value(json!("strict")).unwrap();
        assert_eq!(policy, ConvergeComparison::Strict);
        let policy: ConvergeComparison =
            serde_json::from_value(json!("ignore-server-derived")).unwrap();
        assert_eq!(policy, ConvergeComparison::IgnoreServerDerived);
    }
}
