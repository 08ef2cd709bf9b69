//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部システム（Blob storage, メタ情報ストア, 時計）への
//! インターフェースを提供し、実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - MetadataStore が source of truth（どの版・alias が生きているか）
//! - BlobStore は artifact 本体の保存先
//! - 2 つのストアをまたぐトランザクションはない：
//!   Blob の書き込みを必ずメタ情報の書き込みより先に行う
//! - クライアントは Repository 構築時に注入する（プロセス共有のシングルトンにしない）

pub mod blob_store;
pub mod clock;
pub mod metadata_store;

// 主要な trait を再エクスポート
pub use self::blob_store::{BlobObject, BlobStore};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::metadata_store::{
    MetadataRecord, MetadataStore, PutCondition, RecordKey, RecordType, StoredItem,
    VersionCounter,
};
pub use crate::domain::StoreError;
