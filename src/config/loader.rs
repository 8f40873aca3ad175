//! 設定ファイルの読み込み関数

use std::path::Path;

use super::{
    ConfigError,
    SdkSettings,
};

/// 設定ファイル名
pub const CONFIG_FILE_NAME: &str = "blaink.json";

/// ディレクトリの `blaink.json` を読み込んでバリデーションする
///
/// # Errors
/// - 設定ファイルが存在しない
/// - ファイル読み込みエラー
/// - JSON パースエラー
/// - バリデーションエラー
pub fn load_settings(config_dir: &Path) -> Result<SdkSettings, ConfigError> {
    let settings = load_from_dir(config_dir)?
        .ok_or_else(|| ConfigError::NotFound(config_dir.join(CONFIG_FILE_NAME)))?;

    settings.validate().map_err(ConfigError::ValidationErrors)?;

    // SDK キーはログに出さない
    tracing::debug!(
        environment = %settings.environment,
        storage_dir = %settings.storage_dir.display(),
        "Settings loaded successfully"
    );
    Ok(settings)
}

/// ディレクトリから設定を読み込む
///
/// `blaink.json` ファイルを探して読み込む。相対パスの `storageDir` は
/// `config_dir` を基準に解決する。
///
/// # Arguments
/// * `config_dir` - 設定ファイルを置くディレクトリ
///
/// # Returns
/// - `Ok(Some(settings))`: 設定ファイルが見つかり、読み込みに成功
/// - `Ok(None)`: 設定ファイルが見つからない
/// - `Err(ConfigError)`: ファイル読み込みまたはパースエラー
fn load_from_dir(config_dir: &Path) -> Result<Option<SdkSettings>, ConfigError> {
    let config_path = config_dir.join(CONFIG_FILE_NAME);

    if !config_path.exists() {
        tracing::debug!("Configuration file not found: {:?}", config_path);
        return Ok(None);
    }

    tracing::debug!("Loading configuration from: {:?}", config_path);

    let content = std::fs::read_to_string(&config_path)?;
    let mut settings: SdkSettings = serde_json::from_str(&content)?;

    if settings.storage_dir.is_relative() && !settings.storage_dir.as_os_str().is_empty() {
        settings.storage_dir = config_dir.join(&settings.storage_dir);
    }

    Ok(Some(settings))
}
