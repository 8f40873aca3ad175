//! 翻訳キャッシュ: 翻訳ストア、差分同期、ルックアップのファサード

/// 同期エンドポイントのモデルとトランスポート境界
pub mod api;
/// プレースホルダー置換と大文字・小文字変換
pub mod format;
/// ルックアップのファサード
mod manager;
/// ホストのリソースによるフォールバック
mod resources;
/// 翻訳ストア
mod storage;
/// 同期エンジン
mod sync;

pub use api::{
    LocalisationApi,
    LocalisationSyncResponse,
    SyncRequest,
};
pub use format::CaseTransform;
pub use manager::LocalisationManager;
pub use resources::FallbackResources;
pub use storage::LocalisationStorage;
pub use sync::{
    SyncEngine,
    SyncError,
    SyncOutcome,
    SyncReport,
};
