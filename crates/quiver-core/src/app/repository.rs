//! Repository - 公開 API（facade）
//!
//! VersionManager と AliasManager を束ね、ストアの bootstrap を提供する。
//! プロセス内に可変状態は持たない：永続状態はすべて 2 つのストアにある。

use std::sync::Arc;

use tracing::{info, instrument};

use crate::domain::errors::StoreResultExt;
use crate::domain::{
    AliasInput, AliasRecord, Artifact, ArtifactInput, Operation, RepoError, ResolvedAlias,
    Version,
};
use crate::ports::{BlobStore, MetadataStore};

use super::alias_manager::AliasManager;
use super::builder::RepositoryBuilder;
use super::config::RepositoryConfig;
use super::version_manager::{PurgeReport, VersionManager};

/// Versioned artifact repository with alias-based canary routing.
///
/// # 使用例
/// ```ignore
/// let repo = Repository::builder()
///     .blob_store(Arc::new(InMemoryBlobStore::new()))
///     .metadata_store(Arc::new(InMemoryMetadataStore::new()))
///     .build()?;
/// repo.bootstrap().await?;
/// repo.put_artifact("deploy", ArtifactInput::new("v1")).await?;
/// let v1 = repo.publish_artifact_version("deploy").await?;
/// ```
///
/// # 並行性
/// ロックは取らない。同じ name への put は last-write-wins、
/// 同時 publish は片方が `RepoError::ConcurrentPublish` で失敗する。
#[derive(Clone)]
pub struct Repository {
    config: RepositoryConfig,
    blobs: Arc<dyn BlobStore>,
    metadata: Arc<dyn MetadataStore>,
    versions: VersionManager,
    aliases: AliasManager,
}

impl Repository {
    pub fn builder() -> RepositoryBuilder {
        RepositoryBuilder::new()
    }

    pub(crate) fn from_parts(
        config: RepositoryConfig,
        blobs: Arc<dyn BlobStore>,
        metadata: Arc<dyn MetadataStore>,
        versions: VersionManager,
        aliases: AliasManager,
    ) -> Self {
        Self {
            config,
            blobs,
            metadata,
            versions,
            aliases,
        }
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Provision the blob container and the metadata table. Idempotent.
    #[instrument(skip(self), fields(container = %self.config.blob_container, table = %self.config.metadata_table))]
    pub async fn bootstrap(&self) -> Result<(), RepoError> {
        self.blobs
            .bootstrap(&self.config.blob_container)
            .await
            .in_op(Operation::Bootstrap, &self.config.blob_container, "blob_container")?;
        self.metadata
            .bootstrap(&self.config.metadata_table)
            .await
            .in_op(Operation::Bootstrap, &self.config.metadata_table, "metadata_table")?;
        info!("stores ready");
        Ok(())
    }

    #[instrument(skip(self, input), fields(bytes = input.content.len()))]
    pub async fn put_artifact(&self, name: &str, input: ArtifactInput) -> Result<Artifact, RepoError> {
        self.versions.put_artifact(name, input).await
    }

    #[instrument(skip(self))]
    pub async fn publish_artifact_version(&self, name: &str) -> Result<Artifact, RepoError> {
        self.versions.publish_artifact_version(name).await
    }

    #[instrument(skip(self), fields(%version))]
    pub async fn get_artifact_version(&self, name: &str, version: Version) -> Result<Artifact, RepoError> {
        self.versions.get_artifact_version(name, version).await
    }

    #[instrument(skip(self))]
    pub async fn list_artifact_versions(&self, name: &str) -> Result<Vec<Artifact>, RepoError> {
        self.versions.list_artifact_versions(name).await
    }

    #[instrument(skip(self), fields(%version))]
    pub async fn delete_artifact_version(&self, name: &str, version: Version) -> Result<(), RepoError> {
        self.versions.delete_artifact_version(name, version).await
    }

    #[instrument(skip(self))]
    pub async fn purge_artifact(&self, name: &str) -> Result<PurgeReport, RepoError> {
        self.versions.purge_artifact(name).await
    }

    #[instrument(skip(self, input), fields(version = %input.version))]
    pub async fn put_alias(
        &self,
        name: &str,
        alias: &str,
        input: AliasInput,
    ) -> Result<AliasRecord, RepoError> {
        self.aliases.put_alias(name, alias, input).await
    }

    #[instrument(skip(self))]
    pub async fn get_alias(&self, name: &str, alias: &str) -> Result<AliasRecord, RepoError> {
        self.aliases.get_alias(name, alias).await
    }

    #[instrument(skip(self))]
    pub async fn list_aliases(&self, name: &str) -> Result<Vec<AliasRecord>, RepoError> {
        self.aliases.list_aliases(name).await
    }

    #[instrument(skip(self))]
    pub async fn delete_alias(&self, name: &str, alias: &str) -> Result<(), RepoError> {
        self.aliases.delete_alias(name, alias).await
    }

    #[instrument(skip(self))]
    pub async fn resolve_alias(&self, name: &str, alias: &str) -> Result<ResolvedAlias, RepoError> {
        self.aliases.resolve_alias(name, alias).await
    }
}
