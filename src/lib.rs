//! blaink
//!
//! Blaink プッシュ通知プラットフォームのクライアント SDK。デバイス登録、セッション管理、
//! 通知の計測、そしてオフラインでも使える翻訳キャッシュを提供する。

/// プラットフォーム API のモデルとトランスポート境界
pub mod api;
/// SDK のエントリーポイント
pub mod client;
/// SDK 設定
pub mod config;
/// テストデバイス用ディープリンク
pub mod deeplink;
/// SDK イベントの配信
pub mod events;
/// 翻訳キャッシュ
pub mod localisation;
/// プッシュ通知の計測
pub mod push;
/// ユーザーセッション
pub mod session;
/// 永続化されたキー・バリューストア
pub mod storage;
/// 共通の型
pub mod types;

/// テスト用のフェイク
#[cfg(test)]
mod test_utils;

pub use client::{
    Blaink,
    ClientError,
    DeviceInfo,
};
