//! RepositoryBuilder - Repository の構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - ストアのクライアントは依存性注入（シングルトンにしない）

use std::sync::Arc;

use crate::ports::{BlobStore, Clock, MetadataStore, SystemClock};

use super::alias_manager::AliasManager;
use super::config::{ConfigError, RepositoryConfig};
use super::repository::Repository;
use super::version_manager::VersionManager;

/// RepositoryBuilder は Repository を構築
///
/// # 使用例
/// ```ignore
/// let repo = RepositoryBuilder::new()
///     .config(RepositoryConfig::from_toml_str(source)?)
///     .blob_store(blobs)
///     .metadata_store(metadata)
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - build() 時に設定を検証する
/// - ストアが注入されていなければ BuildError を返す
pub struct RepositoryBuilder {
    config: RepositoryConfig,
    blobs: Option<Arc<dyn BlobStore>>,
    metadata: Option<Arc<dyn MetadataStore>>,
    clock: Arc<dyn Clock>,
}

/// BuildError は Repository 構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no blob store was provided")]
    MissingBlobStore,

    #[error("no metadata store was provided")]
    MissingMetadataStore,

    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
}

impl RepositoryBuilder {
    pub fn new() -> Self {
        Self {
            config: RepositoryConfig::default(),
            blobs: None,
            metadata: None,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn config(mut self, config: RepositoryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn blob_store(mut self, blobs: Arc<dyn BlobStore>) -> Self {
        self.blobs = Some(blobs);
        self
    }

    pub fn metadata_store(mut self, metadata: Arc<dyn MetadataStore>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Defaults to `SystemClock`.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> Result<Repository, BuildError> {
        self.config.validate()?;
        let blobs = self.blobs.ok_or(BuildError::MissingBlobStore)?;
        let metadata = self.metadata.ok_or(BuildError::MissingMetadataStore)?;

        let versions = VersionManager::new(
            Arc::clone(&blobs),
            Arc::clone(&metadata),
            self.clock,
            &self.config,
        );
        let aliases = AliasManager::new(Arc::clone(&metadata), versions.clone(), &self.config);

        Ok(Repository::from_parts(
            self.config,
            blobs,
            metadata,
            versions,
            aliases,
        ))
    }
}

impl Default for RepositoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{InMemoryBlobStore, InMemoryMetadataStore};

    #[test]
    fn test_build_success() {
        let repo = RepositoryBuilder::new()
            .blob_store(Arc::new(InMemoryBlobStore::new()))
            .metadata_store(Arc::new(InMemoryMetadataStore::new()))
            .build();
        assert!(repo.is_ok());
    }

    #[test]
    fn test_build_missing_blob_store() {
        let repo = RepositoryBuilder::new()
            .metadata_store(Arc::new(InMemoryMetadataStore::new()))
            .build();
        assert!(matches!(repo, Err(BuildError::MissingBlobStore)));
    }

    #[test]
    fn test_build_missing_metadata_store() {
        let repo = RepositoryBuilder::new()
            .blob_store(Arc::new(InMemoryBlobStore::new()))
            .build();
        assert!(matches!(repo, Err(BuildError::MissingMetadataStore)));
    }

    #[test]
    fn test_build_invalid_config() {
        let repo = RepositoryBuilder::new()
            .config(RepositoryConfig {
                version_zero_pad_width: 0,
                ..RepositoryConfig::default()
            })
            .blob_store(Arc::new(InMemoryBlobStore::new()))
            .metadata_store(Arc::new(InMemoryMetadataStore::new()))
            .build();
        assert!(matches!(repo, Err(BuildError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_repositories_with_different_configs_coexist() {
        let blobs = InMemoryBlobStore::new();
        let metadata = InMemoryMetadataStore::new();
        let build = |container: &str, table: &str| {
            RepositoryBuilder::new()
                .config(RepositoryConfig {
                    blob_container: container.to_string(),
                    metadata_table: table.to_string(),
                    ..RepositoryConfig::default()
                })
                .blob_store(Arc::new(blobs.clone()))
                .metadata_store(Arc::new(metadata.clone()))
                .build()
                .unwrap()
        };
        let models = build("models", "models-meta");
        let configs = build("configs", "configs-meta");
        models.bootstrap().await.unwrap();
        configs.bootstrap().await.unwrap();

        models
            .put_artifact("x", crate::domain::ArtifactInput::new("model"))
            .await
            .unwrap();
        assert!(configs.list_artifact_versions("x").await.unwrap().is_empty());
        assert_eq!(blobs.object_count("models").await, 1);
        assert_eq!(blobs.object_count("configs").await, 0);
    }
}
