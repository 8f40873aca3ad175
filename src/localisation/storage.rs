//! フラットな設定ファイルを使う翻訳ストア
//!
//! エントリは `"{lang}.{key}"` に平坦化されるため、ルックアップは 1 回のマップ読み取りで済む。
//! 管理情報はエントリと衝突しない予約キーに保存する:
//!
//! | キー               | 値                                 |
//! |--------------------|------------------------------------|
//! | `_version`         | 最後に適用したサーバーのバージョン |
//! | `_languages`       | カタログに現れた言語               |
//! | `_currentLanguage` | 言語指定なしのルックアップの言語   |

use std::collections::{
    BTreeMap,
    HashMap,
};
use std::path::PathBuf;

use crate::storage::{
    Batch,
    Preferences,
    StorageError,
};
use crate::types::host_language;

/// バージョンの予約キー
const VERSION_KEY: &str = "_version";
/// 言語一覧の予約キー
const LANGUAGES_KEY: &str = "_languages";
/// 現在の言語の予約キー
const CURRENT_LANGUAGE_KEY: &str = "_currentLanguage";

/// 翻訳エントリの保存キー
fn flat_key(key: &str, lang: &str) -> String {
    format!("{lang}.{key}")
}

/// 翻訳カタログ、そのバージョン、言語の選択を永続化するストア
#[derive(Debug)]
pub struct LocalisationStorage {
    /// 保存先
    prefs: Preferences,
    /// 言語が保存されるまで [`Self::current_language`] が返す言語
    default_language: String,
}

impl LocalisationStorage {
    /// `path` のストアを開く（現在の言語の既定値はホストのロケール）
    ///
    /// # Errors
    /// - 既存のファイルを読み込めない、またはパースできない
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        Ok(Self { prefs: Preferences::open(path)?, default_language: host_language() })
    }

    /// 既定の言語を指定して永続化しないストアを作成
    #[must_use]
    pub fn in_memory(default_language: impl Into<String>) -> Self {
        Self { prefs: Preferences::in_memory(), default_language: default_language.into() }
    }

    /// 言語が未選択のときに使う言語を上書きする
    #[must_use]
    pub fn with_default_language(mut self, default_language: impl Into<String>) -> Self {
        self.default_language = default_language.into();
        self
    }

    /// 最後に適用したサーバーのバージョン（未同期なら 0）
    #[must_use]
    pub fn version(&self) -> u64 {
        self.prefs.get_integer(VERSION_KEY).unwrap_or(0)
    }

    /// カタログに含まれる言語（ソート済み）
    #[must_use]
    pub fn languages(&self) -> Vec<String> {
        self.prefs.get_set(LANGUAGES_KEY).into_iter().collect()
    }

    /// 言語指定なしのルックアップに使う言語
    #[must_use]
    pub fn current_language(&self) -> String {
        self.prefs.get_string(CURRENT_LANGUAGE_KEY).unwrap_or_else(|| self.default_language.clone())
    }

    /// 現在の言語を保存する
    pub fn set_current_language(&self, lang: &str) -> Result<(), StorageError> {
        tracing::debug!(lang, "Setting current language");
        self.prefs.edit(|batch| batch.put_string(CURRENT_LANGUAGE_KEY, lang))
    }

    /// `lang` での `key` の翻訳
    #[must_use]
    pub fn get(&self, key: &str, lang: &str) -> Option<String> {
        self.prefs.get_string(&flat_key(key, lang))
    }

    /// 既知の全言語での `key` の翻訳（翻訳のない言語は含めない）
    #[must_use]
    pub fn translations(&self, key: &str) -> BTreeMap<String, String> {
        self.languages()
            .into_iter()
            .filter_map(|lang| self.get(key, &lang).map(|value| (lang, value)))
            .collect()
    }

    /// 翻訳を 1 件追加・更新し、新しい `lang` なら言語一覧に加える
    pub fn set(&self, key: &str, lang: &str, value: &str) -> Result<(), StorageError> {
        self.prefs.edit(|batch| {
            batch.put_string(flat_key(key, lang), value);
            track_languages(batch, [lang]);
        })
    }

    /// 1 つのキーの `lang -> value` をまとめて追加・更新する
    #[allow(clippy::implicit_hasher)]
    pub fn set_translations(
        &self,
        key: &str,
        translations: &HashMap<String, String>,
    ) -> Result<(), StorageError> {
        self.prefs.edit(|batch| {
            for (lang, value) in translations {
                batch.put_string(flat_key(key, lang), value.as_str());
            }
            track_languages(batch, translations.keys().map(String::as_str));
        })
    }

    /// `lang` での `key` の翻訳を削除する（存在しなければ何もしない）
    pub fn remove(&self, key: &str, lang: &str) -> Result<(), StorageError> {
        self.prefs.edit(|batch| {
            batch.remove(&flat_key(key, lang));
        })
    }

    /// 既知の全言語から `key` を削除する
    pub fn remove_all(&self, key: &str) -> Result<(), StorageError> {
        self.prefs.edit(|batch| {
            for lang in batch.get_set(LANGUAGES_KEY) {
                batch.remove(&flat_key(key, &lang));
            }
        })
    }

    /// 同期レスポンスを 1 回のコミットでマージする
    ///
    /// 全 `key -> lang -> value` を追加・更新して新しい言語を記録し、
    /// `deleted_keys` を既知の全言語（このレスポンスで増えた言語を含む）から削除し、
    /// バージョンを `max(current, new_version)` に進める。追加・更新したエントリ数を返す。
    #[allow(clippy::implicit_hasher)]
    pub fn apply(
        &self,
        keys: &HashMap<String, HashMap<String, String>>,
        deleted_keys: Option<&[String]>,
        new_version: u64,
    ) -> Result<usize, StorageError> {
        self.prefs.edit(|batch| {
            let mut upserted = 0;
            for (key, translations) in keys {
                for (lang, value) in translations {
                    batch.put_string(flat_key(key, lang), value.as_str());
                    upserted += 1;
                }
            }
            track_languages(batch, keys.values().flat_map(|t| t.keys().map(String::as_str)));

            if let Some(deleted_keys) = deleted_keys {
                let languages = batch.get_set(LANGUAGES_KEY);
                for key in deleted_keys {
                    for lang in &languages {
                        batch.remove(&flat_key(key, lang));
                    }
                }
            }

            let current = batch.get_integer(VERSION_KEY).unwrap_or(0);
            if new_version < current {
                tracing::warn!(current, new_version, "Ignoring version regression from sync");
            }
            batch.put_integer(VERSION_KEY, current.max(new_version));

            upserted
        })
    }

    /// カタログ、バージョン、言語一覧、言語の選択をすべて消去する
    pub fn clear(&self) -> Result<(), StorageError> {
        tracing::debug!("Clearing localisation cache");
        self.prefs.edit(|batch| batch.clear())
    }
}

/// 未知の `languages` を言語一覧に加える（書き込みは高々 1 回）
fn track_languages<'a>(batch: &mut Batch<'_>, languages: impl IntoIterator<Item = &'a str>) {
    let mut known = batch.get_set(LANGUAGES_KEY);
    let before = known.len();
    known.extend(languages.into_iter().map(str::to_string));
    if known.len() != before {
        batch.put_set(LANGUAGES_KEY, known);
    }
}
