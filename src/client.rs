//! SDK のエントリポイント
//!
//! [`Blaink`] はセッション、プッシュ通知マネージャー、イベントバス、翻訳ファサードを保持する。
//! 設定ファイル以外の I/O は行わず、ネットワーク呼び出しはすべてホストの
//! [`BlainkApi`] と [`LocalisationApi`] の実装を通す。

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::broadcast;

use crate::api::{
    ApiError,
    BlainkApi,
    ClientBody,
    ClientRequest,
    Device,
    TestDeviceRegisterRequest,
    UpdateUserRequest,
};
use crate::config::{
    ConfigError,
    SdkSettings,
    load_settings,
};
use crate::deeplink::{
    DeeplinkError,
    parse_udid,
};
use crate::events::{
    EventBus,
    SdkEvent,
};
use crate::localisation::{
    LocalisationApi,
    LocalisationManager,
    LocalisationStorage,
    SyncOutcome,
};
use crate::push::{
    NotificationAction,
    PushNotificationManager,
};
use crate::session::{
    SecureStore,
    UserSession,
};
use crate::storage::{
    Preferences,
    StorageError,
};
use crate::types::host_language;

/// クライアント操作のエラー
#[derive(Error, Debug)]
pub enum ClientError {
    /// プラットフォーム API の呼び出しに失敗
    #[error(transparent)]
    Api(#[from] ApiError),
    /// セッションまたはキャッシュの保存に失敗
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// 設定が不正
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// ディープリンクが不正
    #[error(transparent)]
    Deeplink(#[from] DeeplinkError),
    /// プラットフォームが `error: true` で応答した
    #[error("Request rejected by the platform: {0}")]
    Rejected(String),
    /// セッションがない
    #[error("User not authenticated")]
    NotAuthenticated,
}

/// ホストが提供するデバイス情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// 製造元（例: "Google"）
    pub manufacturer: String,
    /// モデル名（例: "Pixel 8"）
    pub model: String,
    /// プラットフォーム名（例: "Android"）
    pub platform: String,
    /// デバイスの言語（`None` ならホストのロケール）
    pub language: Option<String>,
}

impl DeviceInfo {
    /// 製造元とモデルから作るデバイス名
    ///
    /// モデル名が製造元で始まる場合は製造元を繰り返さない。
    #[must_use]
    pub fn device_name(&self) -> String {
        if self.model.to_lowercase().starts_with(&self.manufacturer.to_lowercase()) {
            capitalize(&self.model)
        } else {
            format!("{} {}", capitalize(&self.manufacturer), self.model)
        }
    }
}

/// 先頭の 1 文字を大文字にする
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| first.to_uppercase().chain(chars).collect())
}

/// Blaink SDK クライアント
pub struct Blaink<A, L, S = Preferences> {
    /// バリデーション済みの設定
    settings: SdkSettings,
    /// プラットフォーム API
    api: Arc<A>,
    /// トークンと識別子
    session: UserSession<S>,
    /// `push` と共有するイベントバス
    events: EventBus,
    /// 通知の計測
    push: PushNotificationManager<A>,
    /// 翻訳ファサード
    localisation: LocalisationManager<L>,
}

impl<A, L, S> std::fmt::Debug for Blaink<A, L, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blaink")
            .field("environment", &self.settings.environment)
            .field("session", &self.session)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl<A: BlainkApi, L: LocalisationApi> Blaink<A, L> {
    /// `settings` をバリデーションし、`storageDir` 配下の設定ファイルを開く
    ///
    /// # Errors
    /// - `settings` のバリデーションに失敗
    /// - 保存ファイルは存在するが読み込めない
    pub fn setup(
        settings: SdkSettings,
        api: Arc<A>,
        localisation_api: Arc<L>,
    ) -> Result<Self, ClientError> {
        settings.validate().map_err(ConfigError::ValidationErrors)?;
        let storage = Arc::new(LocalisationStorage::open(settings.localisation_store_path())?);
        let session_store = Arc::new(Preferences::open(settings.session_store_path())?);
        Self::with_stores(settings, api, localisation_api, storage, session_store)
    }

    /// `config_dir` の `blaink.json` を読み込んで [`Blaink::setup`] する
    ///
    /// # Errors
    /// - `blaink.json` がない、読み込めない、またはバリデーションに失敗
    /// - 保存ファイルは存在するが読み込めない
    pub fn setup_from_dir(
        config_dir: &Path,
        api: Arc<A>,
        localisation_api: Arc<L>,
    ) -> Result<Self, ClientError> {
        let settings = load_settings(config_dir)?;
        Self::setup(settings, api, localisation_api)
    }
}

impl<A: BlainkApi, L: LocalisationApi, S: SecureStore> Blaink<A, L, S> {
    /// 呼び出し側が用意したストアでクライアントを作成
    ///
    /// # Errors
    /// - `settings` のバリデーションに失敗
    /// - 設定された言語を保存できない
    pub fn with_stores(
        settings: SdkSettings,
        api: Arc<A>,
        localisation_api: Arc<L>,
        storage: Arc<LocalisationStorage>,
        session_store: Arc<S>,
    ) -> Result<Self, ClientError> {
        settings.validate().map_err(ConfigError::ValidationErrors)?;
        tracing::info!(environment = %settings.environment, "Initializing Blaink SDK");

        let events = EventBus::default();
        let localisation = LocalisationManager::new(
            localisation_api,
            storage,
            settings.sdk_key.clone(),
            settings.language.as_deref(),
        )?;
        let push = PushNotificationManager::new(Arc::clone(&api), events.clone());

        Ok(Self {
            settings,
            api,
            session: UserSession::new(session_store),
            events,
            push,
            localisation,
        })
    }

    /// 現在の設定
    #[must_use]
    pub const fn settings(&self) -> &SdkSettings {
        &self.settings
    }

    /// 現在のセッション
    #[must_use]
    pub const fn session(&self) -> &UserSession<S> {
        &self.session
    }

    /// 翻訳ファサード
    #[must_use]
    pub const fn localisation(&self) -> &LocalisationManager<L> {
        &self.localisation
    }

    /// SDK イベントの受信側（drop すると購読解除）
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SdkEvent> {
        self.events.subscribe()
    }

    /// デバイスを登録し、発行されたトークンを保存する
    ///
    /// [`SdkEvent::Registered`] を発行し、保存済みのプッシュトークンがあれば送信する。
    /// Blaink のユーザー ID を返す。
    ///
    /// # Errors
    /// - 登録 API の失敗、または拒否
    /// - 識別子またはトークンを保存できない
    pub async fn register_device(&self, device: DeviceInfo) -> Result<String, ClientError> {
        let request = ClientRequest {
            client_id: self.session.client_id()?,
            sdk_key: self.settings.sdk_key.clone(),
            device: Device {
                device_id: self.session.device_id()?,
                device_name: device.device_name(),
                platform: device.platform,
                language: Some(device.language.unwrap_or_else(host_language)),
                push_notification_token: self.session.push_token(),
                push_environment: self.settings.environment,
            },
        };

        tracing::debug!(
            platform = %request.device.platform,
            device_name = %request.device.device_name,
            "Registering device"
        );
        let response = self.api.init_sdk(&request).await.inspect_err(|e| {
            tracing::error!("Device registration failed: {e}");
        })?;
        if response.error {
            tracing::error!(reason = %response.reason, "Device registration rejected");
            return Err(ClientError::Rejected(response.reason));
        }

        self.store_tokens(&response.body)?;
        let user_id = response.body.id;
        tracing::info!(user_id = %user_id, "Device registered");
        self.events.publish(SdkEvent::Registered { user_id: user_id.clone() });

        if let Some(token) = self.session.push_token()
            && let Err(e) = self.submit_push_token(&token).await
        {
            tracing::error!("Failed to submit push token: {e}");
        }

        Ok(user_id)
    }

    /// 保存済みのリフレッシュトークンでトークンを再発行する
    ///
    /// 失敗した場合、保存済みのトークンはそのまま残る。Blaink のユーザー ID を返す。
    ///
    /// # Errors
    /// - [`ClientError::NotAuthenticated`]: リフレッシュトークンがない
    /// - API の失敗、または拒否
    /// - 新しいトークンを保存できない
    pub async fn refresh_session(&self) -> Result<String, ClientError> {
        let Some(refresh_token) = self.session.refresh_token() else {
            return Err(ClientError::NotAuthenticated);
        };

        let response = self.api.refresh(&refresh_token).await.inspect_err(|e| {
            tracing::error!("Session refresh failed: {e}");
        })?;
        if response.error {
            tracing::error!(reason = %response.reason, "Session refresh rejected");
            return Err(ClientError::Rejected(response.reason));
        }

        self.store_tokens(&response.body)?;
        tracing::debug!(user_id = %response.body.id, "Session refreshed");
        Ok(response.body.id)
    }

    /// アクセストークンとリフレッシュトークンを保存する
    fn store_tokens(&self, body: &ClientBody) -> Result<(), StorageError> {
        self.session.set_access_token(Some(&body.access_token))?;
        self.session.set_refresh_token(Some(&body.refresh_token))
    }

    /// プッシュトークンを保存し、セッションがあれば送信する
    ///
    /// 送信したかどうかを返す。
    ///
    /// # Errors
    /// - トークンを保存できない
    /// - 送信に失敗（トークンは次回の登録のために保存されたまま）
    pub async fn register_push_token(&self, token: &str) -> Result<bool, ClientError> {
        self.session.set_push_token(Some(token))?;
        if !self.session.is_authenticated() {
            tracing::debug!("Push token stored until registration completes");
            return Ok(false);
        }
        self.submit_push_token(token).await?;
        Ok(true)
    }

    /// トークンと配信環境を `PUT api/v1/client/me` で送信する
    async fn submit_push_token(&self, token: &str) -> Result<(), ApiError> {
        let request = UpdateUserRequest {
            push_notification_token: Some(token.to_string()),
            push_environment: Some(self.settings.environment),
            ..UpdateUserRequest::default()
        };
        self.api.update_user(&request).await?;
        tracing::debug!("Push token submitted");
        Ok(())
    }

    /// 通知の受信を処理する（[`PushNotificationManager::handle_received`] を参照）
    pub async fn handle_notification(&self, payload: BTreeMap<String, String>) {
        self.push.handle_received(payload).await;
    }

    /// 通知が開かれたことを処理する
    pub async fn handle_notification_opened(&self, payload: BTreeMap<String, String>) {
        self.push.handle_opened(payload).await;
    }

    /// 通知が閉じられたことを処理する
    pub async fn handle_notification_dismissed(&self, payload: BTreeMap<String, String>) {
        self.push.handle_dismissed(payload).await;
    }

    /// 通知アクションを直接記録する
    ///
    /// # Errors
    /// - API の呼び出しに失敗
    pub async fn track_notification_action(
        &self,
        notification_id: &str,
        action: NotificationAction,
    ) -> Result<(), ClientError> {
        Ok(self.push.track(notification_id, action).await?)
    }

    /// `blainks.com` のディープリンクからこのデバイスをテストデバイスとして登録する
    ///
    /// UDID を返す。
    ///
    /// # Errors
    /// - テストデバイス用のディープリンクではない
    /// - 登録 API の呼び出しに失敗
    pub async fn handle_deeplink(&self, url: &str) -> Result<String, ClientError> {
        let udid = parse_udid(url).inspect_err(|e| tracing::warn!("Ignoring deeplink: {e}"))?;
        tracing::debug!(udid = %udid, "Handling deeplink");

        self.api.register_test_device(&TestDeviceRegisterRequest { udid: udid.clone() }).await?;
        tracing::info!("Test device registered");
        Ok(udid)
    }

    /// 現在のセッションの Blaink ユーザー ID
    ///
    /// # Errors
    /// - [`ClientError::NotAuthenticated`]: セッションがない
    /// - API の呼び出しに失敗
    pub async fn current_user(&self) -> Result<String, ClientError> {
        if !self.session.is_authenticated() {
            return Err(ClientError::NotAuthenticated);
        }
        Ok(self.api.current_user().await?.body.id)
    }

    /// ログアウトしてセッションを消去する
    ///
    /// サーバー呼び出しが失敗してもローカルのセッションは消去し、エラーを返す。
    ///
    /// # Errors
    /// - ログアウト API の呼び出しに失敗
    /// - セッションを消去できない
    pub async fn logout(&self) -> Result<(), ClientError> {
        if !self.session.is_authenticated() {
            return Ok(());
        }

        let result = self.api.logout().await;
        self.session.clear()?;
        match result {
            Ok(()) => {
                self.session.set_push_token(None)?;
                tracing::info!("User logged out");
                Ok(())
            }
            Err(e) => {
                tracing::error!("Logout failed, local session cleared: {e}");
                Err(e.into())
            }
        }
    }

    /// アカウントを削除し、成功したらセッションとプッシュトークンを消去する
    ///
    /// 失敗した場合はアカウントが残っているため、セッションも残す。
    ///
    /// # Errors
    /// - [`ClientError::NotAuthenticated`]: セッションがない
    /// - 削除 API の呼び出しに失敗
    /// - セッションを消去できない
    pub async fn delete_account(&self) -> Result<(), ClientError> {
        if !self.session.is_authenticated() {
            return Err(ClientError::NotAuthenticated);
        }

        self.api.delete_account().await.inspect_err(|e| {
            tracing::error!("Account deletion failed: {e}");
        })?;
        self.session.clear()?;
        self.session.set_push_token(None)?;
        tracing::info!("Account deleted");
        Ok(())
    }

    /// 翻訳を同期し、更新があれば [`SdkEvent::LocalisationSynced`] を発行する
    pub async fn sync_localisation(&self) -> SyncOutcome {
        let outcome = self.localisation.sync().await;
        if let SyncOutcome::Updated(report) = &outcome {
            self.events.publish(SdkEvent::LocalisationSynced {
                updated: report.updated,
                version: report.version,
            });
        }
        outcome
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::atomic::Ordering;

    use googletest::prelude::*;
    use rstest::*;
    use tempfile::TempDir;

    use super::*;
    use crate::test_utils::{
        FakeBlainkApi,
        FakeLocalisationApi,
        sync_response,
    };
    use crate::types::PushEnvironment;

    type TestClient = Blaink<FakeBlainkApi, FakeLocalisationApi>;

    /// フェイク API とそれを使うクライアント
    struct Harness {
        /// プラットフォーム API
        api: Arc<FakeBlainkApi>,
        /// 翻訳 API
        localisation_api: Arc<FakeLocalisationApi>,
        /// テスト対象
        client: TestClient,
    }

    /// テスト用のデバイス情報
    fn device() -> DeviceInfo {
        DeviceInfo {
            manufacturer: "Google".to_string(),
            model: "Pixel 8".to_string(),
            platform: "Android".to_string(),
            language: Some("en".to_string()),
        }
    }

    #[fixture]
    fn harness() -> Harness {
        let api = Arc::new(FakeBlainkApi::new());
        let localisation_api = Arc::new(FakeLocalisationApi::new());
        let settings = SdkSettings {
            environment: PushEnvironment::Development,
            ..SdkSettings::new("sdk-key")
        };
        let client = Blaink::with_stores(
            settings,
            Arc::clone(&api),
            Arc::clone(&localisation_api),
            Arc::new(LocalisationStorage::in_memory("en")),
            Arc::new(Preferences::in_memory()),
        )
        .unwrap();
        Harness { api, localisation_api, client }
    }

    #[rstest]
    #[case::distinct("Google", "Pixel 8", "Google Pixel 8")]
    #[case::prefixed("samsung", "samsung SM-G991B", "Samsung SM-G991B")]
    #[case::lowercase_manufacturer("xiaomi", "Redmi Note", "Xiaomi Redmi Note")]
    fn test_device_name(#[case] manufacturer: &str, #[case] model: &str, #[case] expected: &str) {
        let info = DeviceInfo {
            manufacturer: manufacturer.to_string(),
            model: model.to_string(),
            ..device()
        };

        assert_that!(info.device_name(), eq(expected));
    }

    #[rstest]
    fn setup_rejects_invalid_settings() {
        let result = TestClient::setup(
            SdkSettings::default(),
            Arc::new(FakeBlainkApi::new()),
            Arc::new(FakeLocalisationApi::new()),
        );

        assert!(matches!(result, Err(ClientError::Config(ConfigError::ValidationErrors(_)))));
    }

    #[rstest]
    fn setup_opens_stores_under_storage_dir() {
        let temp = TempDir::new().unwrap();
        let settings = SdkSettings {
            storage_dir: temp.path().join("blaink"),
            language: Some("tr".to_string()),
            ..SdkSettings::new("sdk-key")
        };

        let client = TestClient::setup(
            settings,
            Arc::new(FakeBlainkApi::new()),
            Arc::new(FakeLocalisationApi::new()),
        )
        .unwrap();

        assert_that!(client.localisation().language(), eq("tr"));
        assert!(temp.path().join("blaink").join("localisation.json").exists());
    }

    #[rstest]
    #[tokio::test]
    async fn register_device_stores_tokens_and_publishes(harness: Harness) {
        let mut events = harness.client.subscribe();

        let user_id = harness.client.register_device(device()).await.unwrap();

        assert_that!(user_id, eq("user-1"));
        assert_that!(harness.client.session().access_token(), some(eq("access-user-1")));
        assert_that!(harness.client.session().refresh_token(), some(eq("refresh-user-1")));
        assert_eq!(
            events.recv().await.unwrap(),
            SdkEvent::Registered { user_id: "user-1".to_string() }
        );

        let requests = FakeBlainkApi::recorded(&harness.api.init_requests);
        assert_that!(requests.len(), eq(1));
        assert_that!(requests[0].sdk_key, eq("sdk-key"));
        assert_that!(requests[0].device.device_name, eq("Google Pixel 8"));
        assert_that!(requests[0].device.language, some(eq("en")));
        assert_that!(requests[0].device.push_environment, eq(PushEnvironment::Development));
        assert_that!(
            requests[0].client_id,
            eq(&harness.client.session().client_id().unwrap())
        );
    }

    #[rstest]
    #[tokio::test]
    async fn registration_defaults_language_to_host_locale(harness: Harness) {
        harness.client.register_device(DeviceInfo { language: None, ..device() }).await.unwrap();

        let requests = FakeBlainkApi::recorded(&harness.api.init_requests);
        assert_that!(requests[0].device.language, some(eq(&host_language())));
    }

    #[rstest]
    #[tokio::test]
    async fn rejected_registration_leaves_session_empty(harness: Harness) {
        harness.api.reject.store(true, Ordering::SeqCst);

        let result = harness.client.register_device(device()).await;

        assert!(matches!(result, Err(ClientError::Rejected(reason)) if reason == "invalid sdk key"));
        assert_that!(harness.client.session().is_authenticated(), eq(false));
    }

    #[rstest]
    #[tokio::test]
    async fn push_token_waits_for_registration(harness: Harness) {
        let submitted = harness.client.register_push_token("push-1").await.unwrap();
        assert_that!(submitted, eq(false));
        assert_that!(FakeBlainkApi::recorded(&harness.api.user_updates).len(), eq(0));

        harness.client.register_device(device()).await.unwrap();

        let updates = FakeBlainkApi::recorded(&harness.api.user_updates);
        assert_that!(updates.len(), eq(1));
        assert_that!(updates[0].push_notification_token, some(eq("push-1")));
        let init = FakeBlainkApi::recorded(&harness.api.init_requests);
        assert_that!(init[0].device.push_notification_token, some(eq("push-1")));
    }

    #[rstest]
    #[tokio::test]
    async fn push_token_is_submitted_when_authenticated(harness: Harness) {
        harness.client.register_device(device()).await.unwrap();

        let submitted = harness.client.register_push_token("push-2").await.unwrap();

        assert_that!(submitted, eq(true));
        let updates = FakeBlainkApi::recorded(&harness.api.user_updates);
        assert_that!(updates.len(), eq(1));
        assert_that!(updates[0].push_environment, eq(Some(PushEnvironment::Development)));
    }

    #[rstest]
    #[tokio::test]
    async fn current_user_requires_session(harness: Harness) {
        assert!(matches!(
            harness.client.current_user().await,
            Err(ClientError::NotAuthenticated)
        ));

        harness.client.register_device(device()).await.unwrap();

        assert_that!(harness.client.current_user().await, ok(eq("user-1")));
    }

    #[rstest]
    #[tokio::test]
    async fn logout_clears_session(harness: Harness) {
        harness.client.register_push_token("push-1").await.unwrap();
        harness.client.register_device(device()).await.unwrap();

        harness.client.logout().await.unwrap();

        assert_that!(harness.client.session().is_authenticated(), eq(false));
        assert_that!(harness.client.session().push_token(), none());
        assert_that!(harness.api.logout_calls.load(Ordering::SeqCst), eq(1));
    }

    #[rstest]
    #[tokio::test]
    async fn logout_clears_session_even_when_api_fails(harness: Harness) {
        harness.client.register_device(device()).await.unwrap();
        harness.api.fail_with(ApiError::Status { status: 500, body: "boom".to_string() });

        let result = harness.client.logout().await;

        assert!(matches!(result, Err(ClientError::Api(ApiError::Status { status: 500, .. }))));
        assert_that!(harness.client.session().is_authenticated(), eq(false));
    }

    #[rstest]
    #[tokio::test]
    async fn logout_without_session_skips_api(harness: Harness) {
        harness.client.logout().await.unwrap();

        assert_that!(harness.api.logout_calls.load(Ordering::SeqCst), eq(0));
    }

    #[rstest]
    #[tokio::test]
    async fn refresh_session_replaces_tokens(harness: Harness) {
        harness.client.register_device(device()).await.unwrap();

        let user_id = harness.client.refresh_session().await.unwrap();

        assert_that!(user_id, eq("user-1"));
        assert_that!(
            FakeBlainkApi::recorded(&harness.api.refresh_tokens),
            elements_are![eq("refresh-user-1")]
        );
        assert_that!(harness.client.session().access_token(), some(eq("access-renewed")));
        assert_that!(harness.client.session().refresh_token(), some(eq("refresh-renewed")));
    }

    #[rstest]
    #[tokio::test]
    async fn refresh_session_requires_refresh_token(harness: Harness) {
        let result = harness.client.refresh_session().await;

        assert!(matches!(result, Err(ClientError::NotAuthenticated)));
        assert_that!(FakeBlainkApi::recorded(&harness.api.refresh_tokens).len(), eq(0));
    }

    #[rstest]
    #[tokio::test]
    async fn failed_refresh_keeps_tokens(harness: Harness) {
        harness.client.register_device(device()).await.unwrap();
        harness.api.fail_with(ApiError::Status { status: 401, body: "expired".to_string() });

        let result = harness.client.refresh_session().await;

        assert!(matches!(result, Err(ClientError::Api(ApiError::Status { status: 401, .. }))));
        assert_that!(harness.client.session().access_token(), some(eq("access-user-1")));
        assert_that!(harness.client.session().refresh_token(), some(eq("refresh-user-1")));
    }

    #[rstest]
    #[tokio::test]
    async fn rejected_refresh_keeps_tokens(harness: Harness) {
        harness.client.register_device(device()).await.unwrap();
        harness.api.reject.store(true, Ordering::SeqCst);

        let result = harness.client.refresh_session().await;

        assert!(matches!(result, Err(ClientError::Rejected(_))));
        assert_that!(harness.client.session().access_token(), some(eq("access-user-1")));
    }

    #[rstest]
    #[tokio::test]
    async fn delete_account_clears_session(harness: Harness) {
        harness.client.register_push_token("push-1").await.unwrap();
        harness.client.register_device(device()).await.unwrap();

        harness.client.delete_account().await.unwrap();

        assert_that!(harness.api.delete_calls.load(Ordering::SeqCst), eq(1));
        assert_that!(harness.client.session().is_authenticated(), eq(false));
        assert_that!(harness.client.session().refresh_token(), none());
        assert_that!(harness.client.session().push_token(), none());
    }

    #[rstest]
    #[tokio::test]
    async fn failed_account_deletion_keeps_session(harness: Harness) {
        harness.client.register_device(device()).await.unwrap();
        harness.api.fail_with(ApiError::Transport("offline".to_string()));

        let result = harness.client.delete_account().await;

        assert!(matches!(result, Err(ClientError::Api(ApiError::Transport(_)))));
        assert_that!(harness.client.session().is_authenticated(), eq(true));
    }

    #[rstest]
    #[tokio::test]
    async fn delete_account_requires_session(harness: Harness) {
        let result = harness.client.delete_account().await;

        assert!(matches!(result, Err(ClientError::NotAuthenticated)));
        assert_that!(harness.api.delete_calls.load(Ordering::SeqCst), eq(0));
    }

    #[rstest]
    fn setup_from_dir_reads_config_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(crate::config::CONFIG_FILE_NAME),
            r#"{"sdkKey": "from-file", "environment": "development", "storageDir": "store"}"#,
        )
        .unwrap();

        let client = TestClient::setup_from_dir(
            temp.path(),
            Arc::new(FakeBlainkApi::new()),
            Arc::new(FakeLocalisationApi::new()),
        )
        .unwrap();

        assert_that!(client.settings().sdk_key, eq("from-file"));
        assert_that!(client.settings().environment, eq(PushEnvironment::Development));
        assert!(temp.path().join("store").join("localisation.json").exists());
    }

    #[rstest]
    fn setup_from_dir_requires_config_file() {
        let temp = TempDir::new().unwrap();

        let result = TestClient::setup_from_dir(
            temp.path(),
            Arc::new(FakeBlainkApi::new()),
            Arc::new(FakeLocalisationApi::new()),
        );

        assert!(matches!(result, Err(ClientError::Config(ConfigError::NotFound(_)))));
    }

    #[rstest]
    #[tokio::test]
    async fn deeplink_registers_test_device(harness: Harness) {
        let udid = harness.client.handle_deeplink("myapp://blainks.com/UDID-1").await.unwrap();

        assert_that!(udid, eq("UDID-1"));
        let registered = FakeBlainkApi::recorded(&harness.api.test_devices);
        assert_that!(registered.len(), eq(1));
        assert_that!(registered[0].udid, eq("UDID-1"));
    }

    #[rstest]
    #[tokio::test]
    async fn foreign_deeplink_is_ignored(harness: Harness) {
        let result = harness.client.handle_deeplink("myapp://example.com/UDID-1").await;

        assert!(matches!(result, Err(ClientError::Deeplink(DeeplinkError::InvalidHost(_)))));
        assert_that!(FakeBlainkApi::recorded(&harness.api.test_devices).len(), eq(0));
    }

    #[rstest]
    #[tokio::test]
    async fn notification_reaches_subscribers(harness: Harness) {
        let mut first = harness.client.subscribe();
        let mut second = harness.client.subscribe();
        let payload = BTreeMap::from([("notificationID".to_string(), "n-1".to_string())]);

        harness.client.handle_notification(payload.clone()).await;

        let expected = SdkEvent::NotificationReceived(payload);
        assert_eq!(first.recv().await.unwrap(), expected);
        assert_eq!(second.recv().await.unwrap(), expected);
        let actions = FakeBlainkApi::recorded(&harness.api.notification_actions);
        assert_that!(actions[0].action, eq("delivered"));
    }

    #[rstest]
    #[tokio::test]
    async fn explicit_action_is_tracked(harness: Harness) {
        harness.client.track_notification_action("n-9", NotificationAction::Opened).await.unwrap();

        let actions = FakeBlainkApi::recorded(&harness.api.notification_actions);
        assert_that!(actions.len(), eq(1));
        assert_that!(actions[0].action, eq("opened"));
    }

    #[rstest]
    #[tokio::test]
    async fn localisation_sync_publishes_event(harness: Harness) {
        harness
            .localisation_api
            .push_response(Ok(sync_response(5, &[("greeting", "en", "Hi")], None)));
        let mut events = harness.client.subscribe();

        let outcome = harness.client.sync_localisation().await;

        assert_that!(outcome.updated_count(), eq(Some(1)));
        assert_eq!(
            events.recv().await.unwrap(),
            SdkEvent::LocalisationSynced { updated: 1, version: 5 }
        );
        assert_that!(harness.client.localisation().string("greeting"), eq("Hi"));
    }
}
