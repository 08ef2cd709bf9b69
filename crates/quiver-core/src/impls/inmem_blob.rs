//! InMemoryBlobStore - 開発用・テスト用の Blob ストア
//!
//! container ごとに `BTreeMap<key, BlobObject>` を持つ。
//! BTreeMap なので prefix list は辞書順で返る。

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::StoreError;
use crate::ports::{BlobObject, BlobStore};

type Container = BTreeMap<String, BlobObject>;

/// InMemoryBlobStore は開発用の Blob ストア
///
/// # 使用例
/// ```ignore
/// let blobs = InMemoryBlobStore::new();
/// blobs.bootstrap("artifacts").await?;
/// blobs.put("artifacts", "deploy/LATEST", BlobObject::default()).await?;
/// assert_eq!(blobs.object_count("artifacts").await, 1);
/// ```
#[derive(Clone, Default)]
pub struct InMemoryBlobStore {
    containers: Arc<RwLock<HashMap<String, Container>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects in `container` (0 if it does not exist).
    pub async fn object_count(&self, container: &str) -> usize {
        self.containers
            .read()
            .await
            .get(container)
            .map_or(0, BTreeMap::len)
    }
}

fn missing(container: &str) -> StoreError {
    StoreError::ContainerMissing(container.to_string())
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn bootstrap(&self, container: &str) -> Result<(), StoreError> {
        self.containers
            .write()
            .await
            .entry(container.to_string())
            .or_default();
        Ok(())
    }

    async fn put(&self, container: &str, key: &str, object: BlobObject) -> Result<(), StoreError> {
        let mut containers = self.containers.write().await;
        let objects = containers.get_mut(container).ok_or_else(|| missing(container))?;
        objects.insert(key.to_string(), object);
        Ok(())
    }

    async fn get(&self, container: &str, key: &str) -> Result<BlobObject, StoreError> {
        let containers = self.containers.read().await;
        let objects = containers.get(container).ok_or_else(|| missing(container))?;
        objects
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::ObjectMissing(format!("{container}/{key}")))
    }

    async fn delete(&self, container: &str, key: &str) -> Result<(), StoreError> {
        let mut containers = self.containers.write().await;
        let objects = containers.get_mut(container).ok_or_else(|| missing(container))?;
        objects.remove(key);
        Ok(())
    }

    async fn delete_prefix(&self, container: &str, prefix: &str) -> Result<usize, StoreError> {
        let mut containers = self.containers.write().await;
        let objects = containers.get_mut(container).ok_or_else(|| missing(container))?;
        let before = objects.len();
        objects.retain(|key, _| !key.starts_with(prefix));
        Ok(before - objects.len())
    }

    async fn list(&self, container: &str, prefix: &str) -> Result<Vec<String>, StoreError> {
        let containers = self.containers.read().await;
        let objects = containers.get(container).ok_or_else(|| missing(container))?;
        Ok(objects
            .range(prefix.to_string()..)
            .map(|(key, _)| key)
            .take_while(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn exists(&self, container: &str, key: &str) -> Result<bool, StoreError> {
        let containers = self.containers.read().await;
        let objects = containers.get(container).ok_or_else(|| missing(container))?;
        Ok(objects.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(bytes: &[u8]) -> BlobObject {
        BlobObject {
            bytes: bytes.to_vec(),
            ..BlobObject::default()
        }
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let store = InMemoryBlobStore::new();
        store.bootstrap("c").await.unwrap();
        let mut obj = object(b"hello");
        obj.content_type = Some("text/plain".into());
        obj.metadata.insert("foo".into(), "bar".into());

        store.put("c", "a/LATEST", obj.clone()).await.unwrap();
        assert_eq!(store.get("c", "a/LATEST").await.unwrap(), obj);
        assert!(store.exists("c", "a/LATEST").await.unwrap());
    }

    #[tokio::test]
    async fn test_unprovisioned_container_fails() {
        let store = InMemoryBlobStore::new();
        let err = store.put("nope", "k", object(b"x")).await.unwrap_err();
        assert_eq!(err, StoreError::ContainerMissing("nope".into()));
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let store = InMemoryBlobStore::new();
        store.bootstrap("c").await.unwrap();
        store.put("c", "k", object(b"x")).await.unwrap();
        store.bootstrap("c").await.unwrap();
        assert_eq!(store.object_count("c").await, 1);
    }

    #[tokio::test]
    async fn test_get_missing_object() {
        let store = InMemoryBlobStore::new();
        store.bootstrap("c").await.unwrap();
        let err = store.get("c", "missing").await.unwrap_err();
        assert!(matches!(err, StoreError::ObjectMissing(_)));
        assert!(!store.exists("c", "missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_and_delete_prefix() {
        let store = InMemoryBlobStore::new();
        store.bootstrap("c").await.unwrap();
        for key in ["a/00000002", "a/00000001", "a/LATEST", "ab/LATEST", "b/LATEST"] {
            store.put("c", key, object(b"x")).await.unwrap();
        }

        assert_eq!(
            store.list("c", "a/").await.unwrap(),
            vec!["a/00000001", "a/00000002", "a/LATEST"]
        );

        assert_eq!(store.delete_prefix("c", "a/").await.unwrap(), 3);
        assert_eq!(store.object_count("c").await, 2);
        assert_eq!(store.delete_prefix("c", "a/").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = InMemoryBlobStore::new();
        store.bootstrap("c").await.unwrap();
        store.put("c", "k", object(b"x")).await.unwrap();
        store.delete("c", "k").await.unwrap();
        store.delete("c", "k").await.unwrap();
        assert_eq!(store.object_count("c").await, 0);
    }
}
