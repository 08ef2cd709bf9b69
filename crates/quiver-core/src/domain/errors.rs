//! Errors - エラー型と分類
//!
//! - `RepoError`: Repository の公開 API が返すエラー
//! - `StoreError`: BlobStore / MetadataStore（外部ストア）が返すエラー
//! - `ValidationError`: 入力検証エラー（型 / 値の 2 種類）

use std::fmt;

use thiserror::Error;

use super::version::Version;

/// ErrorKind はエラーの運用分類
///
/// # 分類
/// - NotFound: 参照先が存在しない（artifact / alias）
/// - Validation: 入力が不正（リトライ無意味）
/// - Conflict: 並行 publish に負けた（呼び出し側でリトライ可能）
/// - Infrastructure: ストアの障害（ネットワーク、権限、スロットリング）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    Infrastructure,
}

/// Which half of the two-stage validation rejected the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    /// The value has the wrong type (e.g. a non-numeric weight).
    Type,
    /// The value has the right type but is out of range or inconsistent.
    Value,
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationKind::Type => f.write_str("type"),
            ValidationKind::Value => f.write_str("value"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} validation failed: {message}")]
pub struct ValidationError {
    pub kind: ValidationKind,
    pub message: String,
}

impl ValidationError {
    pub fn type_error(message: impl Into<String>) -> Self {
        Self {
            kind: ValidationKind::Type,
            message: message.into(),
        }
    }

    pub fn value_error(message: impl Into<String>) -> Self {
        Self {
            kind: ValidationKind::Value,
            message: message.into(),
        }
    }
}

/// StoreError は外部ストアの失敗
///
/// Repository はこれをリトライせず、操作名・name・対象を付けて
/// `RepoError::Store` として返す。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("container or table '{0}' has not been provisioned")]
    ContainerMissing(String),

    #[error("object '{0}' does not exist")]
    ObjectMissing(String),

    #[error("conditional write rejected for '{0}'")]
    ConditionFailed(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    OperationFailed(String),
}

/// The repository operation during which a store failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Bootstrap,
    PutArtifact,
    PublishArtifactVersion,
    GetArtifactVersion,
    ListArtifactVersions,
    DeleteArtifactVersion,
    PurgeArtifact,
    PutAlias,
    GetAlias,
    ListAliases,
    DeleteAlias,
    ResolveAlias,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Bootstrap => "bootstrap",
            Operation::PutArtifact => "put_artifact",
            Operation::PublishArtifactVersion => "publish_artifact_version",
            Operation::GetArtifactVersion => "get_artifact_version",
            Operation::ListArtifactVersions => "list_artifact_versions",
            Operation::DeleteArtifactVersion => "delete_artifact_version",
            Operation::PurgeArtifact => "purge_artifact",
            Operation::PutAlias => "put_alias",
            Operation::GetAlias => "get_alias",
            Operation::ListAliases => "list_aliases",
            Operation::DeleteAlias => "delete_alias",
            Operation::ResolveAlias => "resolve_alias",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RepoError は Repository のドメインエラー
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("artifact not found: name={name} version={version}")]
    ArtifactNotFound { name: String, version: Version },

    #[error("alias not found: name={name} alias={alias}")]
    AliasNotFound { name: String, alias: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("concurrent publish detected: name={name} version={version} was claimed by another writer")]
    ConcurrentPublish { name: String, version: Version },

    #[error("version space exhausted: name={name} does not fit in {width} digits")]
    VersionSpaceExhausted { name: String, width: usize },

    #[error("store failure during {operation}: name={name} target={target}: {source}")]
    Store {
        operation: Operation,
        name: String,
        target: String,
        #[source]
        source: StoreError,
    },
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RepoError::ArtifactNotFound { .. } | RepoError::AliasNotFound { .. } => {
                ErrorKind::NotFound
            }
            RepoError::Validation(_) | RepoError::VersionSpaceExhausted { .. } => {
                ErrorKind::Validation
            }
            RepoError::ConcurrentPublish { .. } => ErrorKind::Conflict,
            RepoError::Store { .. } => ErrorKind::Infrastructure,
        }
    }

    /// The validation kind, if this is a validation failure.
    pub fn validation_kind(&self) -> Option<ValidationKind> {
        match self {
            RepoError::Validation(err) => Some(err.kind),
            _ => None,
        }
    }
}

/// Attaches operation context to a raw store result.
pub(crate) trait StoreResultExt<T> {
    fn in_op(self, operation: Operation, name: &str, target: impl fmt::Display)
    -> Result<T, RepoError>;
}

impl<T> StoreResultExt<T> for Result<T, StoreError> {
    fn in_op(
        self,
        operation: Operation,
        name: &str,
        target: impl fmt::Display,
    ) -> Result<T, RepoError> {
        self.map_err(|source| RepoError::Store {
            operation,
            name: name.to_string(),
            target: target.to_string(),
            source,
        })
    }
}
