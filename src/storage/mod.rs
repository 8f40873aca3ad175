//! 翻訳キャッシュとセッションが共有する永続キー・バリューストア

/// ストレージのエラー型
mod error;
/// 設定ファイルの実装
mod prefs;

pub use error::StorageError;
pub use prefs::{
    Batch,
    PrefValue,
    Preferences,
};
