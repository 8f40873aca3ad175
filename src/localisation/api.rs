//! 翻訳同期エンドポイントのリクエスト・レスポンスとトランスポート境界

use std::collections::HashMap;
use std::future::Future;

use serde::{
    Deserialize,
    Serialize,
};

use crate::api::ApiError;

/// 同期エンドポイントのパス
pub const SYNC_PATH: &str = "api/v1/localise";
/// SDK キーを運ぶヘッダー
pub const SDK_KEY_HEADER: &str = "X-SDK-Key";
/// 最後に適用したバージョンを運ぶクエリパラメータ
pub const SINCE_VERSION_QUERY: &str = "since_version";

/// 1 回の同期取得のパラメータ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    /// アプリの SDK キー
    pub sdk_key: String,
    /// 最後に適用したバージョン（0 なら全件取得）
    pub since_version: u64,
}

impl SyncRequest {
    /// リクエストのクエリ文字列（`since_version=N`）
    #[must_use]
    pub fn query(&self) -> String {
        format!("{SINCE_VERSION_QUERY}={}", self.since_version)
    }

    /// リクエストヘッダー
    #[must_use]
    pub fn headers(&self) -> [(&'static str, &str); 1] {
        [(SDK_KEY_HEADER, self.sdk_key.as_str())]
    }
}

/// 同期エンドポイントが返す差分
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalisationSyncResponse {
    /// サーバー側の最新バージョン
    pub version: u64,
    /// `key -> lang -> value`
    #[serde(default)]
    pub keys: HashMap<String, HashMap<String, String>>,
    /// 全言語から削除するキー
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_keys: Option<Vec<String>>,
}

impl LocalisationSyncResponse {
    /// レスポンスボディをデコードする
    ///
    /// # Errors
    /// - ボディが空（[`ApiError::EmptyBody`]）
    /// - ボディが同期レスポンスとして不正（[`ApiError::Decode`]）
    pub fn from_json(body: &str) -> Result<Self, ApiError> {
        if body.trim().is_empty() {
            return Err(ApiError::EmptyBody);
        }
        Ok(serde_json::from_str(body)?)
    }

    /// レスポンスに含まれる `(key, lang)` エントリ数
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.keys.values().map(HashMap::len).sum()
    }

    /// 削除対象のキー数
    #[must_use]
    pub fn deleted_count(&self) -> usize {
        self.deleted_keys.as_ref().map_or(0, Vec::len)
    }
}

/// リモートの翻訳サービス
pub trait LocalisationApi: Send + Sync {
    /// [`SDK_KEY_HEADER`] と [`SINCE_VERSION_QUERY`] を付けた `GET api/v1/localise`
    fn sync(
        &self,
        request: &SyncRequest,
    ) -> impl Future<Output = Result<LocalisationSyncResponse, ApiError>> + Send;
}
