//! プッシュ通知の受信処理とアクション計測

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::api::{
    ApiError,
    BlainkApi,
    NotificationActionRequest,
};
use crate::events::{
    EventBus,
    SdkEvent,
};

/// 通知 ID を格納するペイロードのキー
pub const NOTIFICATION_ID_KEY: &str = "notificationID";

/// サーバーに報告する通知アクション
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationAction {
    /// 端末に届いた
    Delivered,
    /// ユーザーが開いた
    Opened,
    /// ユーザーが破棄した
    Dismissed,
}

impl NotificationAction {
    /// API に送る文字列表現
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::Opened => "opened",
            Self::Dismissed => "dismissed",
        }
    }
}

impl std::fmt::Display for NotificationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NotificationAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "delivered" => Ok(Self::Delivered),
            "opened" => Ok(Self::Opened),
            "dismissed" | "dismiss" => Ok(Self::Dismissed),
            other => Err(format!("Unknown notification action: {other}")),
        }
    }
}

/// 通知ペイロードから通知 ID を取り出す
#[must_use]
pub fn notification_id(payload: &BTreeMap<String, String>) -> Option<&str> {
    payload.get(NOTIFICATION_ID_KEY).map(String::as_str).filter(|id| !id.is_empty())
}

/// 通知の受信・開封・破棄を処理するマネージャー
pub struct PushNotificationManager<A> {
    /// プラットフォーム API
    api: Arc<A>,
    /// 受信通知の配信先
    events: EventBus,
}

impl<A> std::fmt::Debug for PushNotificationManager<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushNotificationManager")
            .field("api", &"<BlainkApi>")
            .field("events", &self.events)
            .finish()
    }
}

impl<A: BlainkApi> PushNotificationManager<A> {
    /// API とイベントバスからマネージャーを作成する
    #[must_use]
    pub const fn new(api: Arc<A>, events: EventBus) -> Self {
        Self { api, events }
    }

    /// 通知アクションをサーバーに報告する
    ///
    /// # Errors
    /// - API 呼び出しに失敗した場合
    pub async fn track(
        &self,
        notification_id: &str,
        action: NotificationAction,
    ) -> Result<(), ApiError> {
        tracing::debug!(notification_id, %action, "Tracking notification action");
        let request = NotificationActionRequest {
            id: notification_id.to_string(),
            action: action.to_string(),
        };
        self.api.update_notification(&request).await.inspect_err(|e| {
            tracing::error!(notification_id, %action, "Failed to track notification action: {e}");
        })
    }

    /// 受信した通知を処理する
    ///
    /// 通知 ID があれば `delivered` を報告し、その成否に関わらず
    /// [`SdkEvent::NotificationReceived`] を発行します。
    pub async fn handle_received(&self, payload: BTreeMap<String, String>) {
        self.handle(payload, NotificationAction::Delivered).await;
    }

    /// 開封された通知を処理する
    pub async fn handle_opened(&self, payload: BTreeMap<String, String>) {
        self.handle(payload, NotificationAction::Opened).await;
    }

    /// 破棄された通知を処理する
    pub async fn handle_dismissed(&self, payload: BTreeMap<String, String>) {
        self.handle(payload, NotificationAction::Dismissed).await;
    }

    /// 報告してからイベントを発行する
    async fn handle(&self, payload: BTreeMap<String, String>, action: NotificationAction) {
        tracing::debug!(%action, fields = payload.len(), "Handling notification");
        if let Some(id) = notification_id(&payload) {
            // 失敗はログ済み
            let _ = self.track(id, action).await;
        } else {
            tracing::warn!(%action, "Notification payload has no {NOTIFICATION_ID_KEY}");
        }
        self.events.publish(SdkEvent::NotificationReceived(payload));
    }
}
