//! quiver-core
//!
//! Versioned artifact repository with alias-based canary routing.
//!
//! 名前付きの不透明なバイナリ（artifact）の不変な版履歴と、
//! 1 つの版（または重み付きの 2 つの版）を指す alias を管理する control-plane。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（Version, Artifact, AliasRecord, errors）
//! - **ports**: 抽象化レイヤー（BlobStore, MetadataStore, Clock）
//! - **impls**: 実装（InMemoryBlobStore / InMemoryMetadataStore など開発用）
//! - **app**: アプリケーションロジック（Repository, VersionManager, AliasManager, config）

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{Repository, RepositoryBuilder, RepositoryConfig};
pub use domain::{
    AliasInput, AliasRecord, Artifact, ArtifactInput, ErrorKind, RepoError, Version,
};
