//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **RepositoryBuilder**: 設定とストアのワイヤリング
//! - **Repository**: 公開 API（facade）
//! - **VersionManager**: artifact バージョンのライフサイクル
//! - **AliasManager**: alias のライフサイクルと参照検証
//! - **KeyLayout**: Blob キーと record id のエンコード

pub mod alias_manager;
pub mod builder;
pub mod config;
pub mod layout;
pub mod repository;
pub mod version_manager;

// 主要な型を再エクスポート
pub use self::alias_manager::AliasManager;
pub use self::builder::{BuildError, RepositoryBuilder};
pub use self::config::{ConfigError, RepositoryConfig};
pub use self::layout::KeyLayout;
pub use self::repository::Repository;
pub use self::version_manager::{PurgeReport, VersionManager};
