//! 同時に高々 1 つの取得だけを行う翻訳の差分同期

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;

use super::api::{
    LocalisationApi,
    SyncRequest,
};
use super::storage::LocalisationStorage;
use crate::api::ApiError;
use crate::storage::StorageError;

/// 同期が失敗した理由
#[derive(Error, Debug)]
pub enum SyncError {
    /// 取得に失敗、または成功以外のレスポンス
    #[error("Localisation fetch failed: {0}")]
    Api(#[from] ApiError),
    /// レスポンスをストアにコミットできなかった
    #[error("Failed to store localisation update: {0}")]
    Storage(#[from] StorageError),
}

/// 適用した同期レスポンスの要約
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    /// 追加・更新した `(key, lang)` エントリ数と削除キー数の合計
    pub updated: usize,
    /// 追加・更新した `(key, lang)` エントリ数
    pub upserted: usize,
    /// レスポンスの削除キー数
    pub deleted: usize,
    /// マージ後に保存されたバージョン
    pub version: u64,
}

/// [`SyncEngine::sync`] の結果
#[derive(Debug)]
pub enum SyncOutcome {
    /// レスポンスを適用した
    Updated(SyncReport),
    /// 別の同期が実行中だったため何も取得していない
    Skipped,
    /// カタログは変更されていない
    Failed(SyncError),
}

impl SyncOutcome {
    /// 更新件数（スキップまたは失敗なら `None`）
    #[must_use]
    pub const fn updated_count(&self) -> Option<usize> {
        match self {
            Self::Updated(report) => Some(report.updated),
            Self::Skipped | Self::Failed(_) => None,
        }
    }

    /// スキップされた
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    /// 失敗した
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// 翻訳の差分を取得して [`LocalisationStorage`] にマージする
///
/// 1 つのエンジンで同時に実行できる同期は 1 つだけ。並行する呼び出しは待たずに
/// すぐ [`SyncOutcome::Skipped`] を受け取る。実行中の `sync` の Future を drop すると、
/// 何もマージせずにロックが解放される。
pub struct SyncEngine<A> {
    /// 翻訳 API
    api: Arc<A>,
    /// マージ先
    storage: Arc<LocalisationStorage>,
    /// リクエストに付与する SDK キー
    sdk_key: String,
    /// 同期 1 回の間保持されるロック
    in_flight: Mutex<()>,
}

impl<A> std::fmt::Debug for SyncEngine<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("api", &"<LocalisationApi>")
            .field("storage", &self.storage)
            .field("in_flight", &self.in_flight.try_lock().is_err())
            .finish_non_exhaustive()
    }
}

impl<A: LocalisationApi> SyncEngine<A> {
    /// エンジンを作成
    #[must_use]
    pub fn new(api: Arc<A>, storage: Arc<LocalisationStorage>, sdk_key: impl Into<String>) -> Self {
        Self { api, storage, sdk_key: sdk_key.into(), in_flight: Mutex::new(()) }
    }

    /// 保存済みのバージョン以降の変更を取得して適用する
    pub async fn sync(&self) -> SyncOutcome {
        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::debug!("Localisation sync already in progress, skipping");
            return SyncOutcome::Skipped;
        };

        match self.fetch_and_apply().await {
            Ok(report) => {
                tracing::debug!(
                    upserted = report.upserted,
                    deleted = report.deleted,
                    version = report.version,
                    "Localisation synced"
                );
                SyncOutcome::Updated(report)
            }
            Err(error) => {
                tracing::error!("Localisation sync failed: {error}");
                SyncOutcome::Failed(error)
            }
        }
    }

    /// 取得とマージを 1 回行う（呼び出し側がロックを保持している）
    async fn fetch_and_apply(&self) -> Result<SyncReport, SyncError> {
        let request =
            SyncRequest { sdk_key: self.sdk_key.clone(), since_version: self.storage.version() };
        tracing::debug!(since_version = request.since_version, "Fetching localisation delta");

        let response = self.api.sync(&request).await?;

        let upserted = self.storage.apply(
            &response.keys,
            response.deleted_keys.as_deref(),
            response.version,
        )?;
        let deleted = response.deleted_count();

        Ok(SyncReport {
            updated: upserted + deleted,
            upserted,
            deleted,
            version: self.storage.version(),
        })
    }
}
