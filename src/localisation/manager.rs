//! 翻訳ストアに対するルックアップと整形のファサード

use std::collections::BTreeMap;
use std::sync::{
    Arc,
    PoisonError,
    RwLock,
};

use super::api::LocalisationApi;
use super::format::{
    CaseTransform,
    substitute,
    unescape_newlines,
};
use super::resources::{
    FallbackResources,
    resource_key,
};
use super::storage::LocalisationStorage;
use super::sync::{
    SyncEngine,
    SyncOutcome,
};
use crate::storage::StorageError;

/// 翻訳文字列を解決し、キャッシュを同期する
///
/// ルックアップは失敗しない。見つからないキーはホストのリソース、
/// 最後にキーそのものに解決される。
pub struct LocalisationManager<A> {
    /// 共有カタログ
    storage: Arc<LocalisationStorage>,
    /// 同期エンジン
    engine: SyncEngine<A>,
    /// カタログにないときに参照するホストのリソース
    fallback: RwLock<Option<Arc<dyn FallbackResources>>>,
}

impl<A> std::fmt::Debug for LocalisationManager<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let has_fallback =
            self.fallback.read().unwrap_or_else(PoisonError::into_inner).is_some();
        f.debug_struct("LocalisationManager")
            .field("storage", &self.storage)
            .field("engine", &self.engine)
            .field("fallback", &has_fallback)
            .finish()
    }
}

impl<A: LocalisationApi> LocalisationManager<A> {
    /// マネージャーを作成（`language` を指定するとそれが現在の言語になる）
    ///
    /// # Errors
    /// - `language` を保存できない
    pub fn new(
        api: Arc<A>,
        storage: Arc<LocalisationStorage>,
        sdk_key: impl Into<String>,
        language: Option<&str>,
    ) -> Result<Self, StorageError> {
        if let Some(lang) = language {
            storage.set_current_language(lang)?;
        }
        let engine = SyncEngine::new(api, Arc::clone(&storage), sdk_key);
        Ok(Self { storage, engine, fallback: RwLock::new(None) })
    }

    /// 現在の言語
    #[must_use]
    pub fn language(&self) -> String {
        self.storage.current_language()
    }

    /// 現在の言語を変更する
    pub fn set_language(&self, lang: &str) -> Result<(), StorageError> {
        self.storage.set_current_language(lang)
    }

    /// カタログにないときに参照するホストのリソースを設定する
    pub fn set_fallback_resources(&self, resources: impl FallbackResources + 'static) {
        *self.fallback.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(resources));
    }

    /// ホストのリソースを外す
    pub fn clear_fallback_resources(&self) {
        *self.fallback.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// サーバーから翻訳を同期する（[`SyncEngine::sync`] を参照）
    pub async fn sync(&self) -> SyncOutcome {
        self.engine.sync().await
    }

    /// 現在の言語での翻訳（なければフォールバック）
    #[must_use]
    pub fn string(&self, key: &str) -> String {
        self.string_in(key, &self.language())
    }

    /// `lang` での翻訳: 保存値、ホストのリソース、`key` そのものの順に解決する
    #[must_use]
    pub fn string_in(&self, key: &str, lang: &str) -> String {
        if let Some(value) = self.optional_string_in(key, lang) {
            return value;
        }

        let fallback = self.fallback.read().unwrap_or_else(PoisonError::into_inner).clone();
        if let Some(value) = fallback.and_then(|resources| resources.lookup(&resource_key(key))) {
            return unescape_newlines(&value);
        }

        tracing::debug!(key, lang, "No translation found, using key");
        key.to_string()
    }

    /// 現在の言語での保存値（フォールバックなし）
    #[must_use]
    pub fn optional_string(&self, key: &str) -> Option<String> {
        self.optional_string_in(key, &self.language())
    }

    /// `lang` での保存値（フォールバックなし）
    #[must_use]
    pub fn optional_string_in(&self, key: &str, lang: &str) -> Option<String> {
        self.storage.get(key, lang).map(|value| unescape_newlines(&value))
    }

    /// `key` の保存済みの全翻訳（言語ごと）
    #[must_use]
    pub fn all_translations(&self, key: &str) -> BTreeMap<String, String> {
        self.storage.translations(key)
    }

    /// `key` を解決し、`{1}`, `{2}`, … を `args` で置換する
    #[must_use]
    pub fn format<S: AsRef<str>>(&self, key: &str, args: &[S]) -> String {
        substitute(&self.string(key), args)
    }

    /// `lang` で `key` を解決し、`args` で置換する
    #[must_use]
    pub fn format_in<S: AsRef<str>>(&self, key: &str, lang: &str, args: &[S]) -> String {
        substitute(&self.string_in(key, lang), args)
    }

    /// `key` を解決し、現在の言語の規則で `transform` を適用する
    #[must_use]
    pub fn transformed(&self, key: &str, transform: CaseTransform) -> String {
        let lang = self.language();
        transform.apply(&self.string_in(key, &lang), &lang)
    }

    /// 最後に適用したサーバーのバージョン
    #[must_use]
    pub fn cached_version(&self) -> u64 {
        self.storage.version()
    }

    /// キャッシュに含まれる言語
    #[must_use]
    pub fn available_languages(&self) -> Vec<String> {
        self.storage.languages()
    }

    /// キャッシュを消去する
    pub fn clear_cache(&self) -> Result<(), StorageError> {
        self.storage.clear()
    }

    /// 直接 1 件ずつ編集するためのストア
    #[must_use]
    pub const fn storage(&self) -> &Arc<LocalisationStorage> {
        &self.storage
    }
}
