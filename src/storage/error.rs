use thiserror::Error;

/// 設定ファイルの読み込み・コミット時のエラー
#[derive(Error, Debug)]
pub enum StorageError {
    /// ファイルの読み書きまたはリネームに失敗
    #[error("Failed to access preferences file: {0}")]
    Io(#[from] std::io::Error),
    /// ファイルが設定ドキュメントとして不正
    #[error("Failed to (de)serialize preferences: {0}")]
    Serialization(#[from] serde_json::Error),
}
