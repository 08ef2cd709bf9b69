//! VersionManager - artifact バージョンのライフサイクル
//!
//! put / publish / get / list / soft delete / purge を担当する。
//!
//! # 2 つのストアをまたぐ不変条件
//! - Blob の書き込みは必ずメタ情報の書き込みより先
//!   （中断しても残るのは参照されない Blob だけで、宙に浮いたレコードは残らない）
//! - 削除は逆順：purge はメタ情報を消してから Blob を消す
//! - 版番号は永続化された counter を CAS で進める（再利用しない）

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::errors::StoreResultExt;
use crate::domain::{
    Artifact, ArtifactInput, ContentHash, Operation, RepoError, StoreError, Version,
    VersionRecord, validate_artifact_name,
};
use crate::ports::{
    BlobObject, BlobStore, Clock, MetadataRecord, MetadataStore, PutCondition, RecordKey,
    RecordType, StoredItem, VersionCounter,
};

use super::config::RepositoryConfig;
use super::layout::KeyLayout;

/// What `purge_artifact` removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub records_removed: usize,
    pub blobs_removed: usize,
}

#[derive(Clone)]
pub struct VersionManager {
    blobs: Arc<dyn BlobStore>,
    metadata: Arc<dyn MetadataStore>,
    clock: Arc<dyn Clock>,
    layout: KeyLayout,
    container: String,
    table: String,
}

impl VersionManager {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        metadata: Arc<dyn MetadataStore>,
        clock: Arc<dyn Clock>,
        config: &RepositoryConfig,
    ) -> Self {
        Self {
            blobs,
            metadata,
            clock,
            layout: KeyLayout::new(config),
            container: config.blob_container.clone(),
            table: config.metadata_table.clone(),
        }
    }

    /// Write `input` as the new `LATEST`, unless it is identical to the
    /// current `LATEST` (same hash, content type and metadata), in which case
    /// nothing is written and the current record is returned.
    pub async fn put_artifact(&self, name: &str, input: ArtifactInput) -> Result<Artifact, RepoError> {
        const OP: Operation = Operation::PutArtifact;
        validate_artifact_name(name)?;

        let content_hash = ContentHash::of(&input.content);
        let token = self.token(name, Version::Latest)?;

        if let Some(current) = self.load_record(OP, name, &token).await?
            && current.has_same_content(&content_hash, input.content_type.as_deref(), &input.metadata)
        {
            debug!(name, hash = %content_hash, "identical content, skipping write");
            return Ok(current.into_artifact(input.content));
        }

        let blob_key = self.layout.blob_key(name, &token);
        let object = BlobObject {
            bytes: input.content,
            content_type: input.content_type,
            metadata: input.metadata,
        };
        self.blobs
            .put(&self.container, &blob_key, object.clone())
            .await
            .in_op(OP, name, Version::Latest)?;

        let record = VersionRecord {
            name: name.to_string(),
            version: Version::Latest,
            content_hash,
            content_type: object.content_type,
            metadata: object.metadata,
            storage_locator: self.layout.locator(&blob_key),
            created_at: self.clock.now(),
        };
        self.metadata
            .put_item(
                &self.table,
                &self.layout.version_record(name, &token),
                MetadataRecord::Version(record.clone()),
                PutCondition::Always,
            )
            .await
            .in_op(OP, name, Version::Latest)?;

        info!(name, hash = %record.content_hash, "wrote LATEST");
        Ok(record.into_artifact(object.bytes))
    }

    /// Freeze the current `LATEST` into the next numbered version.
    ///
    /// The number is reserved first by advancing the persisted counter with a
    /// conditional write; losing that race yields `ConcurrentPublish` and
    /// nothing else is written. A reserved number is never handed out again,
    /// even if the rest of the publish fails.
    pub async fn publish_artifact_version(&self, name: &str) -> Result<Artifact, RepoError> {
        const OP: Operation = Operation::PublishArtifactVersion;
        validate_artifact_name(name)?;

        let latest_token = self.token(name, Version::Latest)?;
        if self.load_record(OP, name, &latest_token).await?.is_none() {
            return Err(RepoError::ArtifactNotFound {
                name: name.to_string(),
                version: Version::Latest,
            });
        }

        let (last_assigned, revision) = self.load_counter(OP, name).await?;
        let next = last_assigned
            .checked_add(1)
            .ok_or_else(|| RepoError::VersionSpaceExhausted {
                name: name.to_string(),
                width: self.layout.width(),
            })?;
        let version = Version::Number(next);
        let token = self.token(name, version)?;

        let condition = revision.map_or(PutCondition::NotExists, PutCondition::RevisionEquals);
        self.reserve(name, version, condition).await?;

        // copy bytes + attributes from one blob read so they stay consistent
        let source = self
            .blobs
            .get(&self.container, &self.layout.blob_key(name, &latest_token))
            .await
            .in_op(OP, name, Version::Latest)?;

        let blob_key = self.layout.blob_key(name, &token);
        self.blobs
            .put(&self.container, &blob_key, source.clone())
            .await
            .in_op(OP, name, version)?;

        let record = VersionRecord {
            name: name.to_string(),
            version,
            content_hash: ContentHash::of(&source.bytes),
            content_type: source.content_type,
            metadata: source.metadata,
            storage_locator: self.layout.locator(&blob_key),
            created_at: self.clock.now(),
        };
        self.metadata
            .put_item(
                &self.table,
                &self.layout.version_record(name, &token),
                MetadataRecord::Version(record.clone()),
                PutCondition::NotExists,
            )
            .await
            .map_err(|e| self.conflict_or_store(e, OP, name, version))?;

        info!(name, %version, hash = %record.content_hash, "published version");
        Ok(record.into_artifact(source.bytes))
    }

    pub async fn get_artifact_version(&self, name: &str, version: Version) -> Result<Artifact, RepoError> {
        self.get_in(Operation::GetArtifactVersion, name, version).await
    }

    /// Live versions, ascending by number, `LATEST` last.
    pub async fn list_artifact_versions(&self, name: &str) -> Result<Vec<Artifact>, RepoError> {
        const OP: Operation = Operation::ListArtifactVersions;
        validate_artifact_name(name)?;

        let items = self
            .metadata
            .query(&self.table, name, RecordType::Version.prefix())
            .await
            .in_op(OP, name, "*")?;

        let mut records: Vec<VersionRecord> = items
            .into_iter()
            .map(|item| expect_version(OP, item))
            .collect::<Result<_, _>>()?;
        records.sort_by_key(|record| record.version);

        let mut artifacts = Vec::with_capacity(records.len());
        for record in records {
            let content = self.read_content(OP, &record).await?;
            artifacts.push(record.into_artifact(content));
        }
        Ok(artifacts)
    }

    /// Soft delete: the metadata record goes away, the blob stays.
    pub async fn delete_artifact_version(&self, name: &str, version: Version) -> Result<(), RepoError> {
        const OP: Operation = Operation::DeleteArtifactVersion;
        validate_artifact_name(name)?;

        let not_found = || RepoError::ArtifactNotFound {
            name: name.to_string(),
            version,
        };
        let Some(token) = self.layout.token(version) else {
            return Err(not_found());
        };
        let removed = self
            .metadata
            .delete_item(&self.table, &self.layout.version_record(name, &token))
            .await
            .in_op(OP, name, version)?;
        if !removed {
            return Err(not_found());
        }

        info!(name, %version, "soft-deleted version");
        Ok(())
    }

    /// Remove every record (versions, aliases, counter) and every blob of
    /// `name`. Succeeds when there is nothing to remove.
    pub async fn purge_artifact(&self, name: &str) -> Result<PurgeReport, RepoError> {
        const OP: Operation = Operation::PurgeArtifact;
        validate_artifact_name(name)?;

        let items = self
            .metadata
            .query(&self.table, name, "")
            .await
            .in_op(OP, name, "*")?;

        let mut report = PurgeReport::default();
        for item in items {
            let removed = self
                .metadata
                .delete_item(&self.table, &item.key)
                .await
                .in_op(OP, name, &item.key.record_id)?;
            if removed {
                report.records_removed += 1;
            }
        }

        report.blobs_removed = self
            .blobs
            .delete_prefix(&self.container, &self.layout.prefix(name))
            .await
            .in_op(OP, name, "*")?;

        info!(
            name,
            records = report.records_removed,
            blobs = report.blobs_removed,
            "purged artifact"
        );
        Ok(report)
    }

    /// Does `(name, version)` resolve to a live record? Read-only.
    pub async fn exists(&self, name: &str, version: Version) -> Result<bool, RepoError> {
        self.exists_in(Operation::GetArtifactVersion, name, version).await
    }

    pub(crate) async fn exists_in(
        &self,
        op: Operation,
        name: &str,
        version: Version,
    ) -> Result<bool, RepoError> {
        let Some(token) = self.layout.token(version) else {
            return Ok(false);
        };
        Ok(self.load_record(op, name, &token).await?.is_some())
    }

    pub(crate) async fn get_in(
        &self,
        op: Operation,
        name: &str,
        version: Version,
    ) -> Result<Artifact, RepoError> {
        validate_artifact_name(name)?;

        let not_found = || RepoError::ArtifactNotFound {
            name: name.to_string(),
            version,
        };
        let Some(token) = self.layout.token(version) else {
            return Err(not_found());
        };
        let record = self
            .load_record(op, name, &token)
            .await?
            .ok_or_else(not_found)?;
        let content = self.read_content(op, &record).await?;
        Ok(record.into_artifact(content))
    }

    fn token(&self, name: &str, version: Version) -> Result<String, RepoError> {
        self.layout
            .token(version)
            .ok_or_else(|| RepoError::VersionSpaceExhausted {
                name: name.to_string(),
                width: self.layout.width(),
            })
    }

    async fn load_record(
        &self,
        op: Operation,
        name: &str,
        token: &str,
    ) -> Result<Option<VersionRecord>, RepoError> {
        self.metadata
            .get_item(&self.table, &self.layout.version_record(name, token))
            .await
            .in_op(op, name, token)?
            .map(|item| expect_version(op, item))
            .transpose()
    }

    /// Last assigned number (0 if none) and the counter's revision.
    async fn load_counter(&self, op: Operation, name: &str) -> Result<(u64, Option<u64>), RepoError> {
        let item = self
            .metadata
            .get_item(&self.table, &RecordKey::counter(name))
            .await
            .in_op(op, name, "counter")?;
        match item {
            None => Ok((0, None)),
            Some(StoredItem {
                record: MetadataRecord::Counter(counter),
                revision,
                ..
            }) => Ok((counter.last_assigned, Some(revision))),
            Some(other) => Err(unexpected_record(op, &other)),
        }
    }

    async fn reserve(
        &self,
        name: &str,
        version: Version,
        condition: PutCondition,
    ) -> Result<(), RepoError> {
        const OP: Operation = Operation::PublishArtifactVersion;
        let last_assigned = version.number().unwrap_or_default();
        self.metadata
            .put_item(
                &self.table,
                &RecordKey::counter(name),
                MetadataRecord::Counter(VersionCounter { last_assigned }),
                condition,
            )
            .await
            .map_err(|e| self.conflict_or_store(e, OP, name, version))?;
        debug!(name, %version, "reserved version number");
        Ok(())
    }

    fn conflict_or_store(
        &self,
        err: StoreError,
        op: Operation,
        name: &str,
        version: Version,
    ) -> RepoError {
        match err {
            StoreError::ConditionFailed(_) => RepoError::ConcurrentPublish {
                name: name.to_string(),
                version,
            },
            source => RepoError::Store {
                operation: op,
                name: name.to_string(),
                target: version.to_string(),
                source,
            },
        }
    }

    async fn read_content(&self, op: Operation, record: &VersionRecord) -> Result<Vec<u8>, RepoError> {
        let token = self.token(&record.name, record.version)?;
        let object = self
            .blobs
            .get(&self.container, &self.layout.blob_key(&record.name, &token))
            .await
            .in_op(op, &record.name, record.version)?;
        Ok(object.bytes)
    }
}

fn expect_version(op: Operation, item: StoredItem) -> Result<VersionRecord, RepoError> {
    match item.record {
        MetadataRecord::Version(record) => Ok(record),
        _ => Err(unexpected_record(op, &item)),
    }
}

pub(crate) fn unexpected_record(op: Operation, item: &StoredItem) -> RepoError {
    RepoError::Store {
        operation: op,
        name: item.key.name.clone(),
        target: item.key.record_id.clone(),
        source: StoreError::OperationFailed(format!(
            "expected a different record type, found {:?}",
            item.record.record_type()
        )),
    }
}
