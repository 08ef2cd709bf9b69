//! MetadataStore port - メタ情報ストア（DynamoDB/PostgreSQL/InMemory）
//!
//! version レコードと alias レコードを artifact name でパーティション分けして保存する。
//! record_id は `version#<token>` / `alias#<alias>` / `counter#` の形で、
//! 先頭の種別（discriminator）で prefix query できる。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{AliasRecord, StoreError, VersionRecord};

/// Record type discriminator; also the record id prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    Version,
    Alias,
    Counter,
}

impl RecordType {
    pub fn prefix(self) -> &'static str {
        match self {
            RecordType::Version => "version#",
            RecordType::Alias => "alias#",
            RecordType::Counter => "counter#",
        }
    }
}

/// Partition key (`name`) + sort key (`record_id`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    pub name: String,
    pub record_id: String,
}

impl RecordKey {
    /// `token` is the fixed-width version token, so ids sort numerically.
    pub fn version(name: &str, token: &str) -> Self {
        Self::typed(name, RecordType::Version, token)
    }

    pub fn alias(name: &str, alias: &str) -> Self {
        Self::typed(name, RecordType::Alias, alias)
    }

    pub fn counter(name: &str) -> Self {
        Self::typed(name, RecordType::Counter, "")
    }

    fn typed(name: &str, record_type: RecordType, id: &str) -> Self {
        Self {
            name: name.to_string(),
            record_id: format!("{}{}", record_type.prefix(), id),
        }
    }
}

/// Highest version number ever assigned to a name.
///
/// Survives soft deletes; only `purge_artifact` removes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionCounter {
    pub last_assigned: u64,
}

/// A document in the metadata store, tagged by record type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetadataRecord {
    Version(VersionRecord),
    Alias(AliasRecord),
    Counter(VersionCounter),
}

impl MetadataRecord {
    pub fn record_type(&self) -> RecordType {
        match self {
            MetadataRecord::Version(_) => RecordType::Version,
            MetadataRecord::Alias(_) => RecordType::Alias,
            MetadataRecord::Counter(_) => RecordType::Counter,
        }
    }
}

/// A record as read back, with the revision used for conditional writes.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredItem {
    pub key: RecordKey,
    pub record: MetadataRecord,
    pub revision: u64,
}

/// Precondition of a `put_item`.
///
/// A failed precondition is reported as `StoreError::ConditionFailed` and
/// leaves the stored item untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PutCondition {
    #[default]
    Always,
    NotExists,
    RevisionEquals(u64),
}

/// MetadataStore はバージョン / alias のメタ情報の正本
///
/// # 設計原則
/// - table は `bootstrap` で作成する（冪等）
/// - `get_item` / `query` は状態を変更しない（alias 検証で使う存在確認）
/// - 条件付き書き込み（`PutCondition`）で version counter の CAS を実現する
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn bootstrap(&self, table: &str) -> Result<(), StoreError>;

    /// Write `record` at `key`; returns the new revision.
    async fn put_item(
        &self,
        table: &str,
        key: &RecordKey,
        record: MetadataRecord,
        condition: PutCondition,
    ) -> Result<u64, StoreError>;

    async fn get_item(&self, table: &str, key: &RecordKey)
    -> Result<Option<StoredItem>, StoreError>;

    /// Items of partition `name` whose record id starts with `record_id_prefix`,
    /// ordered by record id.
    async fn query(
        &self,
        table: &str,
        name: &str,
        record_id_prefix: &str,
    ) -> Result<Vec<StoredItem>, StoreError>;

    /// Returns whether an item was removed.
    async fn delete_item(&self, table: &str, key: &RecordKey) -> Result<bool, StoreError>;
}
