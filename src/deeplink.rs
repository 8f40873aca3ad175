//! `{scheme}://blainks.com/{UDID}` 形式のテストデバイス用ディープリンク

use thiserror::Error;
use url::Url;

/// テストデバイス用ディープリンクのホスト
pub const DEEPLINK_HOST: &str = "blainks.com";

/// ディープリンクの解析エラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeeplinkError {
    /// URL として解析できない
    #[error("Invalid deeplink '{url}': {reason}")]
    InvalidUrl {
        /// 受け取った文字列
        url: String,
        /// パーサーが報告した理由
        reason: String,
    },
    /// ホストが blainks.com ではない
    #[error("Deeplink host is not blainks.com: {0}")]
    InvalidHost(String),
    /// パスに UDID が含まれていない
    #[error("Deeplink carries no UDID: {0}")]
    MissingUdid(String),
}

/// ディープリンクからテストデバイスの UDID を取り出す
///
/// UDID は空でない最後のパスセグメント。クエリとフラグメントは無視する。
///
/// # Errors
/// - URL として解析できない
/// - ホストが [`DEEPLINK_HOST`] またはそのサブドメインではない
/// - パスにセグメントがない
pub fn parse_udid(url: &str) -> Result<String, DeeplinkError> {
    let parsed = Url::parse(url)
        .map_err(|err| DeeplinkError::InvalidUrl { url: url.to_string(), reason: err.to_string() })?;

    if !parsed.host_str().is_some_and(is_deeplink_host) {
        return Err(DeeplinkError::InvalidHost(url.to_string()));
    }

    parsed
        .path_segments()
        .and_then(|mut segments| segments.rfind(|segment| !segment.is_empty()))
        .map(str::to_string)
        .ok_or_else(|| DeeplinkError::MissingUdid(url.to_string()))
}

/// `blainks.com` またはそのサブドメイン
///
/// 独自スキームのホストは小文字化されないため大文字小文字を区別しない。
fn is_deeplink_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host == DEEPLINK_HOST
        || host.strip_suffix(DEEPLINK_HOST).is_some_and(|prefix| prefix.ends_with('.'))
}
