//! SDK 全体で使うコア型

use serde::{
    Deserialize,
    Serialize,
};
use unic_langid::LanguageIdentifier;

/// ホストのロケールが取得できないときの言語
pub const DEFAULT_LANGUAGE: &str = "en";

/// デバイストークンが属するプッシュ配信環境
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PushEnvironment {
    /// 開発環境
    Development,
    /// 本番環境
    #[default]
    Production,
}

impl PushEnvironment {
    /// ワイヤー上の値
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl std::fmt::Display for PushEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// BCP 47 タグから主言語サブタグを取り出す（`"tr-TR"` → `"tr"`）
///
/// POSIX 形式のアンダースコア（`"en_US"`）も受け付ける。解析できないタグは `None`。
#[must_use]
pub fn language_subtag(tag: &str) -> Option<String> {
    let normalized = tag.split('.').next().unwrap_or(tag).replace('_', "-");
    normalized.parse::<LanguageIdentifier>().ok().map(|id| id.language.as_str().to_string())
}

/// ホストのロケールの言語（取得できなければ [`DEFAULT_LANGUAGE`]）
#[must_use]
pub fn host_language() -> String {
    sys_locale::get_locale()
        .and_then(|locale| language_subtag(&locale))
        .filter(|lang| lang != "und")
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
}
