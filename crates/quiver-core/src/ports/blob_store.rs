//! BlobStore port - Blob ストレージ（S3/MinIO/Local/InMemory）
//!
//! artifact の本体（バイト列）を `{name}/{version_token}{suffix}` のキーで保存する。
//! メタ情報（どの版が生きているか）は MetadataStore 側が正本。

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::domain::StoreError;

/// A stored object: bytes plus the attributes written with them.
///
/// Bytes, content type and metadata are written in a single `put`, so a
/// reader always sees a consistent snapshot of the three.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobObject {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

/// BlobStore は artifact 本体の保存先
///
/// # 設計原則
/// - container（bucket）は `bootstrap` で作成する（冪等）
/// - 未作成の container への操作は `StoreError::ContainerMissing`
/// - `put` は上書き、`delete` / `delete_prefix` は対象がなくても成功
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Provision the container if it does not exist yet.
    async fn bootstrap(&self, container: &str) -> Result<(), StoreError>;

    async fn put(&self, container: &str, key: &str, object: BlobObject) -> Result<(), StoreError>;

    /// Fails with `StoreError::ObjectMissing` if there is no object at `key`.
    async fn get(&self, container: &str, key: &str) -> Result<BlobObject, StoreError>;

    async fn delete(&self, container: &str, key: &str) -> Result<(), StoreError>;

    /// Delete every object whose key starts with `prefix`; returns how many.
    async fn delete_prefix(&self, container: &str, prefix: &str) -> Result<usize, StoreError>;

    /// Keys starting with `prefix`, in lexicographic order.
    async fn list(&self, container: &str, prefix: &str) -> Result<Vec<String>, StoreError>;

    async fn exists(&self, container: &str, key: &str) -> Result<bool, StoreError>;
}
