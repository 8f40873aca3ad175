//! SDK イベントの配信
//!
//! 購読は [`EventBus::subscribe`] で受け取る `Receiver` で行い、解除は
//! `Receiver` を drop するだけです。

use std::collections::BTreeMap;

use tokio::sync::broadcast;

/// 購読者ごとにバッファされるイベント数
pub const DEFAULT_CAPACITY: usize = 64;

/// ホストアプリに通知されるイベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdkEvent {
    /// プッシュ通知を受信した
    NotificationReceived(BTreeMap<String, String>),
    /// デバイス登録が完了した
    Registered { user_id: String },
    /// 翻訳キャッシュが同期された
    LocalisationSynced { updated: usize, version: u64 },
}

/// `tokio::sync::broadcast` 上のイベントバス
///
/// 遅い購読者はバッファ溢れ時に古いイベントを取りこぼします
/// （`RecvError::Lagged`）。
#[derive(Debug, Clone)]
pub struct EventBus {
    /// 送信側
    sender: broadcast::Sender<SdkEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    /// 指定したバッファサイズでバスを作成する
    ///
    /// `capacity` が 0 の場合は 1 に切り上げます。
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// 以降に発行されるイベントを受け取る `Receiver` を返す
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SdkEvent> {
        self.sender.subscribe()
    }

    /// イベントを発行し、受け取った購読者数を返す
    ///
    /// 購読者がいない場合は何もせず 0 を返します。
    pub fn publish(&self, event: SdkEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(event)) => {
                tracing::debug!(?event, "No subscribers for event");
                0
            }
        }
    }

    /// 現在の購読者数
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
