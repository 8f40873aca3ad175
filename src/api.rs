//! Blaink プラットフォーム API のワイヤーモデルとトランスポート境界
//!
//! SDK 自身は HTTP を実行しない。ホストは自前の HTTP クライアントの上に
//! [`BlainkApi`]（と [`crate::localisation::LocalisationApi`]）を実装し、
//! [`crate::session::UserSession::access_token`] を Bearer トークンとして付与し、
//! 成功以外のステータスを [`ApiError::Status`] に変換する。

use std::future::Future;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use crate::types::PushEnvironment;

/// SDK の初期化（デバイス登録）
pub const INIT_PATH: &str = "api/v1/client/init";
/// リフレッシュトークンによるトークン再発行
pub const REFRESH_PATH: &str = "api/v1/client/refresh";
/// 現在のユーザーの取得・更新
pub const ME_PATH: &str = "api/v1/client/me";
/// ログアウト
pub const LOGOUT_PATH: &str = "api/v1/client/logout";
/// アカウント削除（バージョン接頭辞なし）
pub const DELETE_ACCOUNT_PATH: &str = "api/client/me";
/// 通知アクションの記録
pub const UPDATE_NOTIFICATION_PATH: &str = "api/v1/client/updateNotification";
/// テストデバイスの登録
pub const TEST_DEVICE_REGISTER_PATH: &str = "api/v1/test-device/register";

/// トランスポート実装が報告する失敗
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// レスポンスが得られなかった（接続、TLS、タイムアウト、キャンセル）
    #[error("Transport failure: {0}")]
    Transport(String),
    /// サーバーが成功以外のステータスを返した
    #[error("Server responded with status {status}: {body}")]
    Status {
        /// HTTP ステータスコード
        status: u16,
        /// レスポンスボディ
        body: String,
    },
    /// 成功ステータスだがボディが空
    #[error("Response body was empty")]
    EmptyBody,
    /// ボディをデコードできない
    #[error("Failed to decode response body: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// 登録時に送信するデバイス情報
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// 永続的なデバイス ID
    pub device_id: String,
    /// 表示用のデバイス名
    pub device_name: String,
    /// プラットフォーム名
    pub platform: String,
    /// デバイスの言語
    pub language: Option<String>,
    /// 登録済みのプッシュトークン
    pub push_notification_token: Option<String>,
    /// プッシュ配信環境
    pub push_environment: PushEnvironment,
}

/// `POST api/v1/client/init` のボディ
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRequest {
    /// 永続的なクライアント ID
    pub client_id: String,
    /// アプリの SDK キー
    pub sdk_key: String,
    /// デバイス情報
    pub device: Device,
}

/// クライアント系エンドポイントのレスポンス
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientResponse {
    /// サーバーが要求を拒否した
    pub error: bool,
    /// ユーザーとトークン
    pub body: ClientBody,
    /// 拒否理由
    #[serde(default)]
    pub reason: String,
}

/// [`ClientResponse`] の本体
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientBody {
    /// Blaink のユーザー ID
    pub id: String,
    /// アクセストークン
    pub access_token: String,
    /// リフレッシュトークン
    pub refresh_token: String,
    /// クライアント ID
    pub client_id: String,
    /// プッシュ通知が有効か
    #[serde(default)]
    pub push_notification_enabled: bool,
}

/// `PUT api/v1/client/me` のボディ（未設定のフィールドは省略）
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    /// 新しいプッシュトークン
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_notification_token: Option<String>,
    /// プッシュ配信環境
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_environment: Option<PushEnvironment>,
    /// 言語
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// デバイス名
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
}

/// `PUT api/v1/client/updateNotification` のボディ
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NotificationActionRequest {
    /// 通知 ID
    pub id: String,
    /// `delivered` / `opened` / `dismissed`
    pub action: String,
}

/// `POST api/v1/test-device/register` のボディ
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TestDeviceRegisterRequest {
    /// ディープリンクから取り出した UDID
    pub udid: String,
}

/// SDK が利用するプラットフォームのエンドポイント
pub trait BlainkApi: Send + Sync {
    /// `POST api/v1/client/init`
    fn init_sdk(
        &self,
        request: &ClientRequest,
    ) -> impl Future<Output = Result<ClientResponse, ApiError>> + Send;

    /// `GET api/v1/client/refresh`
    ///
    /// アクセストークンの代わりに `refresh_token` を `Authorization` ヘッダーに付与する。
    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<ClientResponse, ApiError>> + Send;

    /// `PUT api/v1/client/me`
    fn update_user(
        &self,
        request: &UpdateUserRequest,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `GET api/v1/client/me`
    fn current_user(&self) -> impl Future<Output = Result<ClientResponse, ApiError>> + Send;

    /// `GET api/v1/client/logout`
    fn logout(&self) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `DELETE api/client/me`
    fn delete_account(&self) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `PUT api/v1/client/updateNotification`
    fn update_notification(
        &self,
        request: &NotificationActionRequest,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `POST api/v1/test-device/register`
    fn register_test_device(
        &self,
        request: &TestDeviceRegisterRequest,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}
