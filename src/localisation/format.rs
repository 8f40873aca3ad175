//! 解決済みの翻訳に適用する表示用ヘルパー
//!
//! # プレースホルダー
//!
//! `{1}`, `{2}`, … を 1 始まりの位置で 1 パスで置換する:
//!
//! | ケース                         | 動作                     |
//! |--------------------------------|--------------------------|
//! | `n <= args.len()` の `{n}`     | `args[n - 1]` に置換     |
//! | 対応する引数がない `{n}`、`{0}` | そのまま残す             |
//! | 余った引数                     | 無視                     |
//! | 引数に含まれる `{`             | 再走査しない             |

/// JSON で運ばれてきたリテラルの `\n` を改行に変換する
#[must_use]
pub fn unescape_newlines(value: &str) -> String {
    value.replace("\\n", "\n")
}

/// `template` の `{1}`, `{2}`, … を `args` で置換する
///
/// # Examples
/// ```
/// use blaink::localisation::format::substitute;
///
/// let text = substitute("Hello {1}, welcome to {2}!", &["John", "Blaink"]);
/// assert_eq!(text, "Hello John, welcome to Blaink!");
/// ```
#[must_use]
pub fn substitute<S: AsRef<str>>(template: &str, args: &[S]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let (literal, tail) = rest.split_at(open);
        result.push_str(literal);
        let after_brace = tail.strip_prefix('{').unwrap_or(tail);

        let argument = after_brace.split_once('}').and_then(|(inside, remaining)| {
            placeholder_index(inside)
                .and_then(|index| args.get(index))
                .map(|arg| (arg.as_ref(), remaining))
        });

        if let Some((arg, remaining)) = argument {
            result.push_str(arg);
            rest = remaining;
        } else {
            result.push('{');
            rest = after_brace;
        }
    }

    result.push_str(rest);
    result
}

/// `"2"` のようなプレースホルダー本体に対応する 0 始まりの引数位置
fn placeholder_index(inside: &str) -> Option<usize> {
    if inside.is_empty() || !inside.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    inside.parse::<usize>().ok()?.checked_sub(1)
}

/// 言語ごとの規則で適用する大文字・小文字変換
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseTransform {
    /// すべて大文字
    Upper,
    /// すべて小文字
    Lower,
    /// 空白区切りの各単語の先頭を大文字、残りを小文字
    Title,
}

impl CaseTransform {
    /// `lang` の規則で `text` を変換する
    ///
    /// トルコ語とアゼルバイジャン語は `i` ↔ `İ`、`ı` ↔ `I` を対応させる。
    /// それ以外の言語は Unicode の既定の規則に従う。
    #[must_use]
    pub fn apply(self, text: &str, lang: &str) -> String {
        let turkic = is_turkic(lang);
        match self {
            Self::Upper => to_upper(text, turkic),
            Self::Lower => to_lower(text, turkic),
            Self::Title => title_case(text, turkic),
        }
    }
}

/// 主言語サブタグがトルコ語またはアゼルバイジャン語
fn is_turkic(lang: &str) -> bool {
    let primary = lang.split(['-', '_']).next().unwrap_or(lang);
    primary.eq_ignore_ascii_case("tr") || primary.eq_ignore_ascii_case("az")
}

/// 文字列全体を大文字にする
fn to_upper(text: &str, turkic: bool) -> String {
    if turkic { text.replace('i', "İ").to_uppercase() } else { text.to_uppercase() }
}

/// 文字列全体を小文字にする（語末のシグマなど文脈依存の規則を保つ）
fn to_lower(text: &str, turkic: bool) -> String {
    if turkic {
        text.replace('I', "ı").replace('İ', "i").to_lowercase()
    } else {
        text.to_lowercase()
    }
}

/// 空白区切りの各単語の先頭を大文字にし、残りを単語単位で小文字にする
fn title_case(text: &str, turkic: bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(|c: char| !c.is_whitespace()) {
        let (space, word_and_tail) = rest.split_at(start);
        out.push_str(space);
        let end = word_and_tail.find(char::is_whitespace).unwrap_or(word_and_tail.len());
        let (word, tail) = word_and_tail.split_at(end);

        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.push_str(&to_upper(first.encode_utf8(&mut [0; 4]), turkic));
            out.push_str(&to_lower(chars.as_str(), turkic));
        }
        rest = tail;
    }
    out.push_str(rest);
    out
}
