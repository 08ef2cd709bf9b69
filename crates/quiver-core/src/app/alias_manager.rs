//! AliasManager - alias のライフサイクル
//!
//! alias は 1 つの版、または重み付きの 2 つの版（canary）を指す名前。
//! VersionManager は存在確認にだけ使い、版を変更することはない。

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::errors::StoreResultExt;
use crate::domain::{
    AliasInput, AliasRecord, CanaryTarget, Operation, RepoError, ResolvedAlias, Version,
    validate_alias_name, validate_artifact_name,
};
use crate::ports::{MetadataRecord, MetadataStore, PutCondition, RecordKey, RecordType, StoredItem};

use super::config::RepositoryConfig;
use super::version_manager::{VersionManager, unexpected_record};

#[derive(Clone)]
pub struct AliasManager {
    metadata: Arc<dyn MetadataStore>,
    versions: VersionManager,
    table: String,
}

impl AliasManager {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        versions: VersionManager,
        config: &RepositoryConfig,
    ) -> Self {
        Self {
            metadata,
            versions,
            table: config.metadata_table.clone(),
        }
    }

    /// Create or fully overwrite an alias.
    ///
    /// All validation happens before any write:
    /// weight type → weight range → `secondary_version != version` →
    /// existence of `version` → existence of `secondary_version`.
    /// The equality check needs no store access, so it runs before the
    /// existence lookups and fires even when no artifact exists yet.
    pub async fn put_alias(
        &self,
        name: &str,
        alias: &str,
        input: AliasInput,
    ) -> Result<AliasRecord, RepoError> {
        const OP: Operation = Operation::PutAlias;
        validate_artifact_name(name)?;
        validate_alias_name(alias)?;

        let secondary = input.validate().inspect_err(|err| {
            debug!(name, alias, %err, "rejected alias input");
        })?;

        self.require_version(OP, name, input.version).await?;
        if let Some((secondary_version, _)) = secondary {
            self.require_version(OP, name, secondary_version).await?;
        }

        let record = AliasRecord {
            name: name.to_string(),
            alias: alias.to_string(),
            version: input.version,
            secondary_version: secondary.map(|(v, _)| v),
            secondary_weight: secondary.map(|(_, w)| w),
        };
        self.metadata
            .put_item(
                &self.table,
                &RecordKey::alias(name, alias),
                MetadataRecord::Alias(record.clone()),
                PutCondition::Always,
            )
            .await
            .in_op(OP, name, alias)?;

        info!(
            name,
            alias,
            version = %record.version,
            secondary = ?record.secondary_version.map(|v| v.to_string()),
            weight = ?record.secondary_weight.map(|w| w.percent()),
            "put alias"
        );
        Ok(record)
    }

    pub async fn get_alias(&self, name: &str, alias: &str) -> Result<AliasRecord, RepoError> {
        self.get_in(Operation::GetAlias, name, alias).await
    }

    /// Aliases of `name`, ordered by alias.
    pub async fn list_aliases(&self, name: &str) -> Result<Vec<AliasRecord>, RepoError> {
        const OP: Operation = Operation::ListAliases;
        validate_artifact_name(name)?;

        self.metadata
            .query(&self.table, name, RecordType::Alias.prefix())
            .await
            .in_op(OP, name, "*")?
            .into_iter()
            .map(|item| expect_alias(OP, item))
            .collect()
    }

    /// Fails with `AliasNotFound` if there is nothing to delete.
    pub async fn delete_alias(&self, name: &str, alias: &str) -> Result<(), RepoError> {
        const OP: Operation = Operation::DeleteAlias;
        validate_artifact_name(name)?;
        validate_alias_name(alias)?;

        let removed = self
            .metadata
            .delete_item(&self.table, &RecordKey::alias(name, alias))
            .await
            .in_op(OP, name, alias)?;
        if !removed {
            return Err(RepoError::AliasNotFound {
                name: name.to_string(),
                alias: alias.to_string(),
            });
        }

        info!(name, alias, "deleted alias");
        Ok(())
    }

    /// Load the alias and the artifacts it points at. Picking primary or
    /// secondary for a given request is up to the caller.
    pub async fn resolve_alias(&self, name: &str, alias: &str) -> Result<ResolvedAlias, RepoError> {
        const OP: Operation = Operation::ResolveAlias;
        let record = self.get_in(OP, name, alias).await?;

        let primary = self.versions.get_in(OP, name, record.version).await?;
        let secondary = match (record.secondary_version, record.secondary_weight) {
            (Some(version), Some(weight)) => Some(CanaryTarget {
                artifact: self.versions.get_in(OP, name, version).await?,
                weight,
            }),
            _ => None,
        };

        Ok(ResolvedAlias {
            alias: record,
            primary,
            secondary,
        })
    }

    async fn get_in(&self, op: Operation, name: &str, alias: &str) -> Result<AliasRecord, RepoError> {
        validate_artifact_name(name)?;
        validate_alias_name(alias)?;

        let item = self
            .metadata
            .get_item(&self.table, &RecordKey::alias(name, alias))
            .await
            .in_op(op, name, alias)?
            .ok_or_else(|| RepoError::AliasNotFound {
                name: name.to_string(),
                alias: alias.to_string(),
            })?;
        expect_alias(op, item)
    }

    async fn require_version(&self, op: Operation, name: &str, version: Version) -> Result<(), RepoError> {
        if self.versions.exists_in(op, name, version).await? {
            Ok(())
        } else {
            Err(RepoError::ArtifactNotFound {
                name: name.to_string(),
                version,
            })
        }
    }
}

fn expect_alias(op: Operation, item: StoredItem) -> Result<AliasRecord, RepoError> {
    match item.record {
        MetadataRecord::Alias(record) => Ok(record),
        _ => Err(unexpected_record(op, &item)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArtifactInput, ErrorKind, ValidationKind};
    use crate::impls::{InMemoryBlobStore, InMemoryMetadataStore};
    use crate::ports::{BlobStore, SystemClock};
    use rstest::rstest;

    struct Fixture {
        metadata: InMemoryMetadataStore,
        versions: VersionManager,
        aliases: AliasManager,
        config: RepositoryConfig,
    }

    async fn fixture() -> Fixture {
        let config = RepositoryConfig::default();
        let blobs = InMemoryBlobStore::new();
        let metadata = InMemoryMetadataStore::new();
        blobs.bootstrap(&config.blob_container).await.unwrap();
        metadata.bootstrap(&config.metadata_table).await.unwrap();

        let versions = VersionManager::new(
            Arc::new(blobs),
            Arc::new(metadata.clone()),
            Arc::new(SystemClock),
            &config,
        );
        let aliases = AliasManager::new(Arc::new(metadata.clone()), versions.clone(), &config);
        Fixture {
            metadata,
            versions,
            aliases,
            config,
        }
    }

    /// LATEST = "v2", version 1 = "v1", version 2 = "v2".
    async fn published_fixture() -> Fixture {
        let fx = fixture().await;
        fx.versions.put_artifact("deploy", ArtifactInput::new("v1")).await.unwrap();
        fx.versions.publish_artifact_version("deploy").await.unwrap();
        fx.versions.put_artifact("deploy", ArtifactInput::new("v2")).await.unwrap();
        fx.versions.publish_artifact_version("deploy").await.unwrap();
        fx
    }

    #[tokio::test]
    async fn test_put_and_get_alias() {
        let fx = published_fixture().await;
        let record = fx
            .aliases
            .put_alias("deploy", "LIVE", AliasInput::latest())
            .await
            .unwrap();
        assert_eq!(record.version, Version::Latest);
        assert!(!record.has_secondary());

        assert_eq!(fx.aliases.get_alias("deploy", "LIVE").await.unwrap(), record);
    }

    #[tokio::test]
    async fn test_put_alias_overwrites_fully() {
        let fx = published_fixture().await;
        fx.aliases
            .put_alias("deploy", "LIVE", AliasInput::new(1u64).with_secondary(2u64, 20u8))
            .await
            .unwrap();
        let record = fx
            .aliases
            .put_alias("deploy", "LIVE", AliasInput::new(2u64))
            .await
            .unwrap();

        assert_eq!(record.version, Version::Number(2));
        assert_eq!(record.secondary_version, None);
        assert_eq!(record.secondary_weight, None);
        assert_eq!(fx.aliases.get_alias("deploy", "LIVE").await.unwrap(), record);
    }

    #[tokio::test]
    async fn test_get_missing_alias() {
        let fx = fixture().await;
        let err = fx.aliases.get_alias("deploy", "LIVE").await.unwrap_err();
        assert!(matches!(err, RepoError::AliasNotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_missing_alias_fails() {
        let fx = published_fixture().await;
        let err = fx.aliases.delete_alias("deploy", "LIVE").await.unwrap_err();
        assert!(matches!(err, RepoError::AliasNotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_aliases_is_sorted() {
        let fx = published_fixture().await;
        for alias in ["PROD", "DEV", "LIVE"] {
            fx.aliases
                .put_alias("deploy", alias, AliasInput::latest())
                .await
                .unwrap();
        }
        let names: Vec<String> = fx
            .aliases
            .list_aliases("deploy")
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.alias)
            .collect();
        assert_eq!(names, vec!["DEV", "LIVE", "PROD"]);
    }

    // Precedence holds even when no artifact exists at all.
    #[rstest]
    #[case::non_numeric_weight(AliasInput::new(1u64).with_secondary(2u64, "20"), Some(ValidationKind::Type))]
    #[case::out_of_range_weight(AliasInput::new(1u64).with_secondary(2u64, 200u32), Some(ValidationKind::Value))]
    #[case::same_versions(AliasInput::new(1u64).with_secondary(1u64, 20u8), Some(ValidationKind::Value))]
    #[case::missing_version(AliasInput::new(1u64).with_secondary(2u64, 20u8), None)]
    #[tokio::test]
    async fn test_validation_precedence_without_artifacts(
        #[case] input: AliasInput,
        #[case] expected: Option<ValidationKind>,
    ) {
        let fx = fixture().await;
        let err = fx.aliases.put_alias("deploy", "LIVE", input).await.unwrap_err();
        match expected {
            Some(kind) => assert_eq!(err.validation_kind(), Some(kind), "{err}"),
            None => assert!(matches!(err, RepoError::ArtifactNotFound { .. }), "{err}"),
        }
        assert_eq!(fx.metadata.record_count(&fx.config.metadata_table).await, 0);
    }

    #[tokio::test]
    async fn test_missing_secondary_version() {
        let fx = published_fixture().await;
        let err = fx
            .aliases
            .put_alias("deploy", "LIVE", AliasInput::new(1u64).with_secondary(7u64, 20u8))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::ArtifactNotFound { version: Version::Number(7), .. }
        ));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_invalid_request_leaves_existing_alias() {
        let fx = published_fixture().await;
        let original = fx
            .aliases
            .put_alias("deploy", "LIVE", AliasInput::new(1u64))
            .await
            .unwrap();
        let _ = fx
            .aliases
            .put_alias("deploy", "LIVE", AliasInput::new(1u64).with_secondary(2u64, 101u32))
            .await
            .unwrap_err();
        assert_eq!(fx.aliases.get_alias("deploy", "LIVE").await.unwrap(), original);
    }

    #[tokio::test]
    async fn test_resolve_alias_with_canary() {
        let fx = published_fixture().await;
        fx.aliases
            .put_alias("deploy", "LIVE", AliasInput::new(1u64).with_secondary(2u64, 20u8))
            .await
            .unwrap();

        let resolved = fx.aliases.resolve_alias("deploy", "LIVE").await.unwrap();
        assert_eq!(resolved.primary.content, b"v1");
        let canary = resolved.secondary.unwrap();
        assert_eq!(canary.artifact.content, b"v2");
        assert_eq!(canary.weight.percent(), 20.0);
    }

    #[tokio::test]
    async fn test_resolve_alias_after_target_deleted() {
        let fx = published_fixture().await;
        fx.aliases
            .put_alias("deploy", "LIVE", AliasInput::new(1u64))
            .await
            .unwrap();
        fx.versions
            .delete_artifact_version("deploy", Version::Number(1))
            .await
            .unwrap();

        let err = fx.aliases.resolve_alias("deploy", "LIVE").await.unwrap_err();
        assert!(matches!(
            err,
            RepoError::ArtifactNotFound { version: Version::Number(1), .. }
        ));
    }
}
