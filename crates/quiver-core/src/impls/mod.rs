//! Impls - 実装（開発用・テスト用）
//!
//! このモジュールには ports の実装を含めます。
//!
//! # 含まれる実装
//! - **InMemoryBlobStore**: 開発用の Blob ストア
//! - **InMemoryMetadataStore**: 開発用のメタ情報ストア
//!
//! # 本番用実装
//! S3 / DynamoDB などのクライアントを使う実装は別クレートに配置し、
//! `BlobStore` / `MetadataStore` を実装して Repository に注入します。

pub mod inmem_blob;
pub mod inmem_metadata;

// 主要な型を再エクスポート
pub use self::inmem_blob::InMemoryBlobStore;
pub use self::inmem_metadata::InMemoryMetadataStore;
