//! Artifact model: one version of a named, opaque binary item.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::errors::ValidationError;
use super::version::Version;

/// Free-form string metadata attached to an artifact.
///
/// A sorted map so that equality (and therefore idempotence) does not depend
/// on insertion order.
pub type ArtifactMetadata = BTreeMap<String, String>;

/// Hex-encoded SHA-256 of an artifact's content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn of(content: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(content)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Input of `put_artifact`.
///
/// # Example
/// ```ignore
/// let input = ArtifactInput::new(b"v1".to_vec())
///     .with_content_type("text/plain")
///     .with_metadata([("foo", "bar")]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactInput {
    pub content: Vec<u8>,
    pub content_type: Option<String>,
    pub metadata: ArtifactMetadata,
}

impl ArtifactInput {
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: content.into(),
            content_type: None,
            metadata: ArtifactMetadata::new(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_metadata<K, V>(mut self, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.metadata = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }
}

/// Metadata record of one artifact version, as kept in the metadata store.
///
/// Absence of the record means the version is deleted; the blob it points
/// at may still exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub name: String,
    pub version: Version,
    pub content_hash: ContentHash,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: ArtifactMetadata,
    pub storage_locator: String,
    pub created_at: DateTime<Utc>,
}

impl VersionRecord {
    /// Would writing this content leave the record unchanged?
    pub fn has_same_content(
        &self,
        content_hash: &ContentHash,
        content_type: Option<&str>,
        metadata: &ArtifactMetadata,
    ) -> bool {
        &self.content_hash == content_hash
            && self.content_type.as_deref() == content_type
            && &self.metadata == metadata
    }

    pub fn into_artifact(self, content: Vec<u8>) -> Artifact {
        Artifact {
            name: self.name,
            version: self.version,
            content,
            content_type: self.content_type,
            metadata: self.metadata,
            content_hash: self.content_hash,
            storage_locator: self.storage_locator,
            created_at: self.created_at,
        }
    }
}

/// One live version of an artifact, with its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub name: String,
    pub version: Version,
    pub content: Vec<u8>,
    pub content_type: Option<String>,
    pub metadata: ArtifactMetadata,
    pub content_hash: ContentHash,
    pub storage_locator: String,
    pub created_at: DateTime<Utc>,
}

/// Artifact names partition both stores and form the blob key prefix, so
/// they must be non-empty and free of `/`.
pub fn validate_artifact_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::value_error("artifact name must not be empty"));
    }
    if name.contains('/') {
        return Err(ValidationError::value_error(format!(
            "artifact name must not contain '/', got {name:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_sha256_hex() {
        let hash = ContentHash::of(b"");
        assert_eq!(
            hash.as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_ne!(ContentHash::of(b"v1"), ContentHash::of(b"v2"));
    }

    #[test]
    fn same_content_compares_all_three_fields() {
        let record = VersionRecord {
            name: "deploy".into(),
            version: Version::Latest,
            content_hash: ContentHash::of(b"v1"),
            content_type: Some("text/plain".into()),
            metadata: ArtifactMetadata::from([("foo".into(), "bar".into())]),
            storage_locator: "artifacts/deploy/LATEST".into(),
            created_at: Utc::now(),
        };
        let meta = record.metadata.clone();

        assert!(record.has_same_content(&ContentHash::of(b"v1"), Some("text/plain"), &meta));
        assert!(!record.has_same_content(&ContentHash::of(b"v2"), Some("text/plain"), &meta));
        assert!(!record.has_same_content(&ContentHash::of(b"v1"), None, &meta));
        assert!(!record.has_same_content(
            &ContentHash::of(b"v1"),
            Some("text/plain"),
            &ArtifactMetadata::new()
        ));
    }

    #[test]
    fn metadata_order_does_not_matter() {
        let a = ArtifactInput::new("x").with_metadata([("a", "1"), ("b", "2")]);
        let b = ArtifactInput::new("x").with_metadata([("b", "2"), ("a", "1")]);
        assert_eq!(a, b);
    }

    #[test]
    fn artifact_names_are_validated() {
        assert!(validate_artifact_name("deploy").is_ok());
        assert!(validate_artifact_name("").is_err());
        assert!(validate_artifact_name("team/deploy").is_err());
    }
}
