//! カタログに値がないときに使うホスト提供の文字列リソース

/// 組み込み先アプリが提供する静的な文字列テーブル
///
/// キーは翻訳キーの `.` を `_` に置き換えたもの（`onboarding.title` は `onboarding_title`）。
pub trait FallbackResources: Send + Sync {
    /// `resource_key` の文字列
    fn lookup(&self, resource_key: &str) -> Option<String>;
}

impl<F> FallbackResources for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn lookup(&self, resource_key: &str) -> Option<String> {
        self(resource_key)
    }
}

/// 翻訳キーに対応するリソースキー
#[must_use]
pub fn resource_key(key: &str) -> String {
    key.replace('.', "_")
}
