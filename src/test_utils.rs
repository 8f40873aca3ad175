//! テスト用ユーティリティ
//!
//! 複数のテストモジュールで使用される API のフェイク実装とヘルパー関数を提供します。
#![cfg(test)]

use std::collections::{
    HashMap,
    VecDeque,
};
use std::sync::atomic::{
    AtomicBool,
    AtomicUsize,
    Ordering,
};
use std::sync::{
    Mutex,
    PoisonError,
};

use tokio::sync::Notify;

use crate::api::{
    ApiError,
    BlainkApi,
    ClientBody,
    ClientRequest,
    ClientResponse,
    NotificationActionRequest,
    TestDeviceRegisterRequest,
    UpdateUserRequest,
};
use crate::localisation::{
    LocalisationApi,
    LocalisationSyncResponse,
    SyncRequest,
};

/// テスト用の同期レスポンスを作成する
///
/// # Arguments
/// * `version` - サーバーのバージョン
/// * `entries` - `(キー, 言語, 値)` の一覧
/// * `deleted` - 削除されたキー
pub(crate) fn sync_response(
    version: u64,
    entries: &[(&str, &str, &str)],
    deleted: Option<&[&str]>,
) -> LocalisationSyncResponse {
    let mut keys: HashMap<String, HashMap<String, String>> = HashMap::new();
    for (key, lang, value) in entries {
        keys.entry((*key).to_string())
            .or_default()
            .insert((*lang).to_string(), (*value).to_string());
    }
    LocalisationSyncResponse {
        version,
        keys,
        deleted_keys: deleted.map(|keys| keys.iter().map(|key| (*key).to_string()).collect()),
    }
}

/// キューに積まれたレスポンスを順に返す `LocalisationApi`
///
/// `gated()` で作成した場合、各呼び出しは `release()` されるまで待機します。
#[derive(Default)]
pub(crate) struct FakeLocalisationApi {
    /// 返すレスポンスのキュー
    responses: Mutex<VecDeque<Result<LocalisationSyncResponse, ApiError>>>,
    /// 受け取ったリクエスト
    requests: Mutex<Vec<SyncRequest>>,
    /// 設定されている場合、各呼び出しは通知まで待機する
    gate: Option<Notify>,
    /// `sync` の呼び出し回数
    pub calls: AtomicUsize,
}

impl FakeLocalisationApi {
    /// 空のキューで作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 各呼び出しが `release()` まで待機するようにする
    pub fn gated(self) -> Self {
        Self { gate: Some(Notify::new()), ..self }
    }

    /// レスポンスをキューに積む
    pub fn push_response(&self, response: Result<LocalisationSyncResponse, ApiError>) {
        self.responses.lock().unwrap_or_else(PoisonError::into_inner).push_back(response);
    }

    /// 受け取ったリクエストの一覧
    pub fn requests(&self) -> Vec<SyncRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// 待機中（または次）の呼び出しを 1 回進める
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }
}

impl LocalisationApi for FakeLocalisationApi {
    async fn sync(&self, request: &SyncRequest) -> Result<LocalisationSyncResponse, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Transport("no queued response".to_string())))
    }
}

/// テスト用の `ClientResponse` を作成する
pub(crate) fn client_response(user_id: &str) -> ClientResponse {
    ClientResponse {
        error: false,
        body: ClientBody {
            id: user_id.to_string(),
            access_token: format!("access-{user_id}"),
            refresh_token: format!("refresh-{user_id}"),
            client_id: format!("client-{user_id}"),
            push_notification_enabled: true,
        },
        reason: String::new(),
    }
}

/// 呼び出しを記録する `BlainkApi`
#[derive(Debug, Default)]
pub(crate) struct FakeBlainkApi {
    /// `init_sdk` のリクエスト
    pub init_requests: Mutex<Vec<ClientRequest>>,
    /// `refresh` に渡されたリフレッシュトークン
    pub refresh_tokens: Mutex<Vec<String>>,
    /// `update_user` のリクエスト
    pub user_updates: Mutex<Vec<UpdateUserRequest>>,
    /// `update_notification` のリクエスト
    pub notification_actions: Mutex<Vec<NotificationActionRequest>>,
    /// `register_test_device` のリクエスト
    pub test_devices: Mutex<Vec<TestDeviceRegisterRequest>>,
    /// `logout` の呼び出し回数
    pub logout_calls: AtomicUsize,
    /// `delete_account` の呼び出し回数
    pub delete_calls: AtomicUsize,
    /// 設定されている場合、全エンドポイントがこのエラーを返す
    pub failure: Mutex<Option<ApiError>>,
    /// `init_sdk` と `refresh` が `error: true` を返す
    pub reject: AtomicBool,
}

impl FakeBlainkApi {
    /// 全エンドポイントが成功する状態で作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 以降の全呼び出しを `error` で失敗させる
    pub fn fail_with(&self, error: ApiError) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(error);
    }

    /// 失敗が設定されていればそのエラー
    fn check(&self) -> Result<(), ApiError> {
        match self.failure.lock().unwrap_or_else(PoisonError::into_inner).clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// 記録の複製
    pub fn recorded<T: Clone>(log: &Mutex<Vec<T>>) -> Vec<T> {
        log.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl BlainkApi for FakeBlainkApi {
    async fn init_sdk(&self, request: &ClientRequest) -> Result<ClientResponse, ApiError> {
        self.check()?;
        self.init_requests.lock().unwrap_or_else(PoisonError::into_inner).push(request.clone());
        let mut response = client_response("user-1");
        response.body.client_id.clone_from(&request.client_id);
        if self.reject.load(Ordering::SeqCst) {
            response.error = true;
            response.reason = "invalid sdk key".to_string();
        }
        Ok(response)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<ClientResponse, ApiError> {
        self.check()?;
        self.refresh_tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(refresh_token.to_string());
        let mut response = client_response("user-1");
        response.body.access_token = "access-renewed".to_string();
        response.body.refresh_token = "refresh-renewed".to_string();
        if self.reject.load(Ordering::SeqCst) {
            response.error = true;
            response.reason = "refresh token revoked".to_string();
        }
        Ok(response)
    }

    async fn update_user(&self, request: &UpdateUserRequest) -> Result<(), ApiError> {
        self.check()?;
        self.user_updates.lock().unwrap_or_else(PoisonError::into_inner).push(request.clone());
        Ok(())
    }

    async fn current_user(&self) -> Result<ClientResponse, ApiError> {
        self.check()?;
        Ok(client_response("user-1"))
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        self.check()
    }

    async fn delete_account(&self) -> Result<(), ApiError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.check()
    }

    async fn update_notification(&self, request: &NotificationActionRequest) -> Result<(), ApiError> {
        self.check()?;
        self.notification_actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        Ok(())
    }

    async fn register_test_device(
        &self,
        request: &TestDeviceRegisterRequest,
    ) -> Result<(), ApiError> {
        self.check()?;
        self.test_devices.lock().unwrap_or_else(PoisonError::into_inner).push(request.clone());
        Ok(())
    }
}
