//! SDK 設定 (`blaink.json`) の読み込みとバリデーション
/// 設定ファイルの読み込み
mod loader;
/// 設定の型とエラー
mod types;

pub use loader::{
    CONFIG_FILE_NAME,
    load_settings,
};
pub use types::{
    ConfigError,
    LOCALISATION_STORE_FILE,
    SESSION_STORE_FILE,
    SdkSettings,
    ValidationError,
};
