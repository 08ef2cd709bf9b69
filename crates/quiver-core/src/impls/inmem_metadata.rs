//! InMemoryMetadataStore - 開発用・テスト用のメタ情報ストア
//!
//! レコードは JSON ドキュメントとして保存する（document store と同じく
//! シリアライズ境界を通す）。revision は書き込みごとに 1 ずつ増える。

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::StoreError;
use crate::ports::{MetadataRecord, MetadataStore, PutCondition, RecordKey, StoredItem};

#[derive(Debug, Clone)]
struct Entry {
    document: String,
    revision: u64,
}

type Table = BTreeMap<RecordKey, Entry>;

#[derive(Clone, Default)]
pub struct InMemoryMetadataStore {
    tables: Arc<RwLock<HashMap<String, Table>>>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in `table` (0 if it does not exist).
    pub async fn record_count(&self, table: &str) -> usize {
        self.tables.read().await.get(table).map_or(0, BTreeMap::len)
    }
}

fn missing(table: &str) -> StoreError {
    StoreError::ContainerMissing(table.to_string())
}

fn decode(key: &RecordKey, entry: &Entry) -> Result<StoredItem, StoreError> {
    let record: MetadataRecord = serde_json::from_str(&entry.document).map_err(|e| {
        StoreError::OperationFailed(format!(
            "corrupt record {}/{}: {e}",
            key.name, key.record_id
        ))
    })?;
    Ok(StoredItem {
        key: key.clone(),
        record,
        revision: entry.revision,
    })
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn bootstrap(&self, table: &str) -> Result<(), StoreError> {
        self.tables.write().await.entry(table.to_string()).or_default();
        Ok(())
    }

    async fn put_item(
        &self,
        table: &str,
        key: &RecordKey,
        record: MetadataRecord,
        condition: PutCondition,
    ) -> Result<u64, StoreError> {
        let document = serde_json::to_string(&record)
            .map_err(|e| StoreError::OperationFailed(format!("encode record: {e}")))?;

        let mut tables = self.tables.write().await;
        let items = tables.get_mut(table).ok_or_else(|| missing(table))?;

        let current = items.get(key).map(|entry| entry.revision);
        let allowed = match condition {
            PutCondition::Always => true,
            PutCondition::NotExists => current.is_none(),
            PutCondition::RevisionEquals(expected) => current == Some(expected),
        };
        if !allowed {
            return Err(StoreError::ConditionFailed(format!(
                "{}/{}",
                key.name, key.record_id
            )));
        }

        let revision = current.map_or(1, |r| r + 1);
        items.insert(key.clone(), Entry { document, revision });
        Ok(revision)
    }

    async fn get_item(
        &self,
        table: &str,
        key: &RecordKey,
    ) -> Result<Option<StoredItem>, StoreError> {
        let tables = self.tables.read().await;
        let items = tables.get(table).ok_or_else(|| missing(table))?;
        items.get(key).map(|entry| decode(key, entry)).transpose()
    }

    async fn query(
        &self,
        table: &str,
        name: &str,
        record_id_prefix: &str,
    ) -> Result<Vec<StoredItem>, StoreError> {
        let tables = self.tables.read().await;
        let items = tables.get(table).ok_or_else(|| missing(table))?;
        let start = RecordKey {
            name: name.to_string(),
            record_id: record_id_prefix.to_string(),
        };
        items
            .range(start..)
            .take_while(|(key, _)| key.name == name && key.record_id.starts_with(record_id_prefix))
            .map(|(key, entry)| decode(key, entry))
            .collect()
    }

    async fn delete_item(&self, table: &str, key: &RecordKey) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let items = tables.get_mut(table).ok_or_else(|| missing(table))?;
        Ok(items.remove(key).is_some())
    }
}
