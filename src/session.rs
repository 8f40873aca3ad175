//! ユーザーセッションとデバイス識別子
//!
//! トークンと識別子はホストが提供する [`SecureStore`] に保存する。
//! [`Preferences`] は暗号化なしでこれを実装するため、保存時の保護はホスト側で行う。

use std::sync::Arc;

use uuid::Uuid;

use crate::storage::{
    Preferences,
    StorageError,
};

/// デバイス ID のキー
const DEVICE_ID_KEY: &str = "blaink_device_id";
/// クライアント ID のキー
const CLIENT_ID_KEY: &str = "blaink_client_id";
/// プッシュトークンのキー
const PUSH_TOKEN_KEY: &str = "push_notification_token";
/// アクセストークンのキー
const ACCESS_TOKEN_KEY: &str = "blainks_access_token";
/// リフレッシュトークンのキー
const REFRESH_TOKEN_KEY: &str = "blainks_refresh_token";

/// セッションの秘密情報を保存するキー・バリューストア
pub trait SecureStore: Send + Sync {
    /// `key` の値を取得
    fn get(&self, key: &str) -> Option<String>;

    /// `key` に `value` を保存する（`None` ならキーを削除）
    ///
    /// # Errors
    /// - 変更を永続化できない
    fn set(&self, key: &str, value: Option<&str>) -> Result<(), StorageError>;

    /// 全キーを削除
    ///
    /// # Errors
    /// - 変更を永続化できない
    fn clear(&self) -> Result<(), StorageError>;
}

impl SecureStore for Preferences {
    fn get(&self, key: &str) -> Option<String> {
        self.get_string(key)
    }

    fn set(&self, key: &str, value: Option<&str>) -> Result<(), StorageError> {
        self.edit(|batch| match value {
            Some(value) => batch.put_string(key, value),
            None => {
                batch.remove(key);
            }
        })
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.edit(|batch| batch.clear())
    }
}

/// ランダムな UUID v4 文字列
fn generate_uuid() -> String {
    Uuid::new_v4().to_string()
}

/// 現在のデバイスのセッション状態
pub struct UserSession<S> {
    /// 保存先のストア
    store: Arc<S>,
}

impl<S> std::fmt::Debug for UserSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserSession").field("store", &"<SecureStore>").finish()
    }
}

impl<S> Clone for UserSession<S> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store) }
    }
}

impl<S: SecureStore> UserSession<S> {
    /// `store` を使うセッションを作成
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// デバイス ID（初回利用時に生成して保存）
    ///
    /// # Errors
    /// - 生成した ID を保存できない
    pub fn device_id(&self) -> Result<String, StorageError> {
        self.get_or_create(DEVICE_ID_KEY)
    }

    /// クライアント ID（初回利用時に生成して保存）
    ///
    /// # Errors
    /// - 生成した ID を保存できない
    pub fn client_id(&self) -> Result<String, StorageError> {
        self.get_or_create(CLIENT_ID_KEY)
    }

    /// `key` に保存済みの ID、なければ新しく生成した ID
    fn get_or_create(&self, key: &str) -> Result<String, StorageError> {
        if let Some(existing) = self.store.get(key) {
            return Ok(existing);
        }
        let id = generate_uuid();
        self.store.set(key, Some(&id))?;
        tracing::debug!(key, "Generated identifier");
        Ok(id)
    }

    /// アクセストークン
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.store.get(ACCESS_TOKEN_KEY)
    }

    /// アクセストークンを保存（`None` で削除）
    ///
    /// # Errors
    /// - 変更を永続化できない
    pub fn set_access_token(&self, token: Option<&str>) -> Result<(), StorageError> {
        self.store.set(ACCESS_TOKEN_KEY, token)
    }

    /// リフレッシュトークン
    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.store.get(REFRESH_TOKEN_KEY)
    }

    /// リフレッシュトークンを保存（`None` で削除）
    ///
    /// # Errors
    /// - 変更を永続化できない
    pub fn set_refresh_token(&self, token: Option<&str>) -> Result<(), StorageError> {
        self.store.set(REFRESH_TOKEN_KEY, token)
    }

    /// プッシュ通知トークン
    #[must_use]
    pub fn push_token(&self) -> Option<String> {
        self.store.get(PUSH_TOKEN_KEY)
    }

    /// プッシュ通知トークンを保存（`None` で削除）
    ///
    /// # Errors
    /// - 変更を永続化できない
    pub fn set_push_token(&self, token: Option<&str>) -> Result<(), StorageError> {
        self.store.set(PUSH_TOKEN_KEY, token)
    }

    /// アクセストークンが保存されている
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    /// 両方のトークンを削除する（デバイス ID とクライアント ID は残す）
    ///
    /// # Errors
    /// - 変更を永続化できない
    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.set(ACCESS_TOKEN_KEY, None)?;
        self.store.set(REFRESH_TOKEN_KEY, None)
    }
}
