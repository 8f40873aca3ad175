use std::path::PathBuf;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;
use unic_langid::LanguageIdentifier;

use crate::types::PushEnvironment;

/// 翻訳ストアのファイル名（[`SdkSettings::storage_dir`] 配下）
pub const LOCALISATION_STORE_FILE: &str = "localisation.json";
/// セッションストアのファイル名（[`SdkSettings::storage_dir`] 配下）
pub const SESSION_STORE_FILE: &str = "session.json";

/// 1 つのフィールドのバリデーションエラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// フィールドの JSON パス（例: "sdkKey"）
    pub field_path: String,
    /// エラーメッセージ
    pub message: String,
}

impl ValidationError {
    /// エラーを作成
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

/// 設定の読み込みエラー
#[derive(Error, Debug)]
pub enum ConfigError {
    /// バリデーションエラー
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    /// 設定ファイルが存在しない
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// ファイル読み込みエラー
    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON パースエラー
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// 番号付きで 1 行に 1 エラー
fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `blaink.json` の内容
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SdkSettings {
    /// ダッシュボードで発行された SDK キー
    pub sdk_key: String,
    /// プッシュ配信環境
    pub environment: PushEnvironment,
    /// デバッグログを出力する
    pub debug_logs: bool,

    /// 設定ファイルを保存するディレクトリ
    /// 相対パスは設定ディレクトリを基準に解決される
    pub storage_dir: PathBuf,

    /// 翻訳の初期言語
    /// 未設定の場合は保存済みの選択、なければホストのロケールを使う
    pub language: Option<String>,
}

impl Default for SdkSettings {
    fn default() -> Self {
        Self {
            sdk_key: String::new(),
            environment: PushEnvironment::default(),
            debug_logs: false,
            storage_dir: PathBuf::from(".blaink"),
            language: None,
        }
    }
}

impl SdkSettings {
    /// `sdk_key` 以外をデフォルト値にした設定
    #[must_use]
    pub fn new(sdk_key: impl Into<String>) -> Self {
        Self { sdk_key: sdk_key.into(), ..Self::default() }
    }

    /// 翻訳ストアのパス
    #[must_use]
    pub fn localisation_store_path(&self) -> PathBuf {
        self.storage_dir.join(LOCALISATION_STORE_FILE)
    }

    /// セッションストアのパス
    #[must_use]
    pub fn session_store_path(&self) -> PathBuf {
        self.storage_dir.join(SESSION_STORE_FILE)
    }

    /// 設定をバリデーションし、全エラーをまとめて返す
    ///
    /// # Errors
    /// - SDK キーが空、または空白を含む
    /// - 言語が空、または BCP 47 タグではない
    /// - 保存ディレクトリが空
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.sdk_key.trim().is_empty() {
            errors.push(ValidationError::new(
                "sdkKey",
                "The SDK key cannot be empty. Copy it from the Blaink dashboard",
            ));
        } else if self.sdk_key.chars().any(char::is_whitespace) {
            errors.push(ValidationError::new("sdkKey", "The SDK key cannot contain whitespace"));
        }

        if let Some(language) = &self.language {
            if language.is_empty() {
                errors.push(ValidationError::new(
                    "language",
                    "The language cannot be empty. Specify a language (e.g., \"en\"), or remove this field",
                ));
            } else if let Err(e) = language.parse::<LanguageIdentifier>() {
                errors.push(ValidationError::new(
                    "language",
                    format!("Invalid language tag '{language}': {e}"),
                ));
            }
        }

        if self.storage_dir.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "storageDir",
                "The storage directory cannot be empty. Example: \".blaink\"",
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}
