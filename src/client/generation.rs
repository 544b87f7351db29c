//! client::generation
//!
//! API generation detection and generation-specific (de)serialization.
//!
//! # Design
//!
//! The generation is probed once, when a client is constructed, and is
//! immutable afterwards. Every difference between the generations is a
//! method on [`ApiGeneration`], so the write-mode resolver and the version
//! retrieval code never branch on it.
//!
//! | | v1 | v2 |
//! |---|---|---|
//! | `GET /version` | 404, or `1.x.y` | `2.x.y` and later |
//! | write body | `name`, `type`, `value`, `mode` | `name`, `type`, `value` |
//! | `mode`/`overwrite` in parameters | `overwrite` passed through | dropped with a warning |

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::errors::CredHubError;
use super::transport::Transport;
use crate::core::credential::{Credential, WriteMode};

/// Data endpoint shared by both generations.
const DATA_PATH: &str = "api/v1/data";

/// Keys the write body owns; callers cannot override them via parameters.
const RESERVED_KEYS: &[&str] = &["name", "type", "value", "mode"];

/// Keys the v2 API ignores on write.
const V2_IGNORED_KEYS: &[&str] = &["mode", "overwrite"];

/// Major version of the remote data API contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiGeneration {
    /// CredHub 1.x: the server honours a `mode` on write.
    V1,
    /// CredHub 2.x and later: every write creates a version.
    V2,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    version: String,
}

/// A write body plus any caller parameters left out of it.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedWrite {
    /// JSON body for `PUT /api/v1/data`.
    pub body: Value,
    /// Parameter keys that were not sent, in the order supplied.
    pub dropped: Vec<String>,
}

impl ApiGeneration {
    /// Probe the server's generation with `GET /version`.
    ///
    /// # Errors
    ///
    /// - [`CredHubError::Api`] if the probe answers anything but 200 or 404
    /// - [`CredHubError::Decode`] if a 200 body has no usable version
    /// - [`CredHubError::Transport`] if the probe cannot be sent
    pub async fn detect(transport: &Transport) -> Result<Self, CredHubError> {
        let response = transport.probe("version").await?;
        let status = response.status();

        let generation = match status {
            StatusCode::NOT_FOUND => ApiGeneration::V1,
            StatusCode::OK => {
                let bytes = response.bytes().await?;
                let body: VersionResponse = serde_json::from_slice(&bytes)?;
                Self::from_version(&body.version)?
            }
            _ => {
                return Err(CredHubError::Api {
                    status: status.as_u16(),
                    message: format!(
                        "unexpected response to version probe: {}",
                        status.canonical_reason().unwrap_or("unknown status")
                    ),
                })
            }
        };

        tracing::debug!(?generation, "detected CredHub API generation");
        Ok(generation)
    }

    /// Classify a server version string such as `2.1.0`.
    pub fn from_version(version: &str) -> Result<Self, CredHubError> {
        let major = version
            .trim()
            .split('.')
            .next()
            .and_then(|m| m.parse::<u32>().ok())
            .ok_or_else(|| {
                CredHubError::Decode(format!("unrecognised server version '{}'", version))
            })?;
        Ok(if major <= 1 {
            ApiGeneration::V1
        } else {
            ApiGeneration::V2
        })
    }

    /// Whether this is the v1 generation.
    pub fn is_v1(&self) -> bool {
        matches!(self, ApiGeneration::V1)
    }

    /// Path of the credential data endpoint.
    pub fn data_path(&self) -> &'static str {
        DATA_PATH
    }

    /// Build the body of a create request.
    ///
    /// `params` are merged into the top level of the body. Keys the body
    /// owns, and keys this generation ignores, are left out and reported in
    /// [`EncodedWrite::dropped`].
    pub fn encode_write(
        &self,
        credential: &Credential,
        mode: WriteMode,
        params: Option<&Map<String, Value>>,
    ) -> EncodedWrite {
        let mut body = Map::new();
        let mut dropped = Vec::new();

        if let Some(params) = params {
            for (key, value) in params {
                let ignored = match self {
                    ApiGeneration::V1 => RESERVED_KEYS.contains(&key.as_str()),
                    ApiGeneration::V2 => {
                        RESERVED_KEYS.contains(&key.as_str())
                            || V2_IGNORED_KEYS.contains(&key.as_str())
                    }
                };
                if ignored {
                    dropped.push(key.clone());
                } else {
                    body.insert(key.clone(), value.clone());
                }
            }
        }

        body.insert("name".into(), Value::String(credential.name.clone()));
        body.insert(
            "type".into(),
            Value::String(credential.credential_type.as_str().into()),
        );
        body.insert("value".into(), credential.value.clone());
        if self.is_v1() {
            body.insert("mode".into(), Value::String(mode.as_str().into()));
        }

        EncodedWrite {
            body: Value::Object(body),
            dropped,
        }
    }

    /// Decode a `{"credentials": [...]}` listing (path and partial-name search).
    pub fn decode_path_listing(&self, body: Value) -> Result<Vec<Credential>, CredHubError> {
        decode_envelope(body, "credentials")
    }

    /// Decode a `{"data": [...]}` version listing.
    pub fn decode_versions(&self, body: Value) -> Result<Vec<Credential>, CredHubError> {
        decode_envelope(body, "data")
    }

    /// Decode a single credential returned by a write or an id lookup.
    pub fn decode_credential(&self, body: Value) -> Result<Credential, CredHubError> {
        Ok(serde_json::from_value(body)?)
    }
}

fn decode_envelope(mut body: Value, key: &str) -> Result<Vec<Credential>, CredHubError> {
    let items = body
        .get_mut(key)
        .map(Value::take)
        .ok_or_else(|| CredHubError::Decode(format!("response has no '{}' field", key)))?;
    Ok(serde_json::from_value(items)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::credential::CredentialType;
    use serde_json::json;

    fn candidate() -> Credential {
        Credential::new("/some-value", CredentialType::Value, "foo")
    }

    #[test]
    fn version_strings_classify_by_major() {
        assert_eq!(ApiGeneration::from_version("1.9.3").unwrap(), ApiGeneration::V1);
        assert_eq!(ApiGeneration::from_version("2.0.0").unwrap(), ApiGeneration::V2);
        assert_eq!(ApiGeneration::from_version("2.12.1").unwrap(), ApiGeneration::V2);
        assert!(matches!(
            ApiGeneration::from_version("latest"),
            Err(CredHubError::Decode(_))
        ));
    }

    #[test]
    fn v1_write_carries_mode() {
        let encoded = ApiGeneration::V1.encode_write(&candidate(), WriteMode::NoOverwrite, None);
        assert_eq!(
            encoded.body,
            json!({"name": "/some-value", "type": "value", "value": "foo", "mode": "no-overwrite"})
        );
        assert!(encoded.dropped.is_empty());
    }

    #[test]
    fn v2_write_never_carries_mode() {
        let encoded = ApiGeneration::V2.encode_write(&candidate(), WriteMode::Converge, None);
        assert_eq!(
            encoded.body,
            json!({"name": "/some-value", "type": "value", "value": "foo"})
        );
        assert!(encoded.dropped.is_empty());
    }

    #[test]
    fn v2_drops_ignored_parameters() {
        let params = json!({"overwrite": true, "additional_permissions": []});
        let encoded = ApiGeneration::V2.encode_write(
            &candidate(),
            WriteMode::Overwrite,
            params.as_object(),
        );
        assert_eq!(encoded.dropped, vec!["overwrite".to_string()]);
        assert_eq!(encoded.body["additional_permissions"], json!([]));
        assert!(encoded.body.get("overwrite").is_none());
    }

    #[test]
    fn v1_passes_overwrite_but_not_reserved_keys() {
        let params = json!({"overwrite": true, "name": "/elsewhere"});
        let encoded =
            ApiGeneration::V1.encode_write(&candidate(), WriteMode::Overwrite, params.as_object());
        assert_eq!(encoded.body["overwrite"], json!(true));
        assert_eq!(encoded.body["name"], json!("/some-value"));
        assert_eq!(encoded.dropped, vec!["name".to_string()]);
    }

    #[test]
    fn write_body_omits_server_fields() {
        let mut cred = candidate();
        cred.id = "6ba7b810-9dad-11d1-80b4-00c04fd430c8".into();
        cred.created = "2017-01-01T04:07:18Z".into();
        let encoded = ApiGeneration::V2.encode_write(&cred, WriteMode::Overwrite, None);
        assert!(encoded.body.get("id").is_none());
        assert!(encoded.body.get("version_created_at").is_none());
    }

    #[test]
    fn decodes_envelopes() {
        let versions = ApiGeneration::V1
            .decode_versions(json!({"data": [
                {"id": "1", "name": "/x", "type": "value", "value": "a", "version_created_at": "t1"}
            ]}))
            .unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].id, "1");

        let listing = ApiGeneration::V1
            .decode_path_listing(json!({"credentials": [
                {"name": "/p/x", "version_created_at": "t1"}
            ]}))
            .unwrap();
        assert_eq!(listing[0].name, "/p/x");
        assert_eq!(listing[0].credential_type, CredentialType::Unknown);
    }

    #[test]
    fn missing_envelope_is_decode_error() {
        let err = ApiGeneration::V2
            .decode_versions(json!({"credentials": []}))
            .unwrap_err();
        assert!(matches!(err, CredHubError::Decode(_)));

        let err = ApiGeneration::V2
            .decode_versions(json!({"data": [{"id": 7}]}))
            .unwrap_err();
        assert!(matches!(err, CredHubError::Decode(_)));
    }

    #[test]
    fn data_paths() {
        assert_eq!(ApiGeneration::V1.data_path(), "api/v1/data");
        assert_eq!(ApiGeneration::V2.data_path(), "api/v1/data");
    }
}
