/// テキスト処理ユーティリティ。
///
/// 顧客名から検索名を導出する正規化と、検索API応答のマークアップ除去を提供します。
use once_cell::sync::Lazy;
use regex::Regex;

/// 括弧書きの補足（例: `(주)`, `(대구)`）。
static PARENTHETICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\([^)]*\)").expect("parenthetical pattern is valid"));

/// 括弧除去後に残る法人格表記。長いものから順に除去する。
const LEGAL_ENTITY_MARKERS: &[&str] = &[
    "주식회사",
    "유한회사",
    "㈜",
    "Co., Ltd.",
    "Co.,Ltd.",
    "Co., Ltd",
    "Inc.",
    "Corp.",
];

/// 検索名として有効な最小文字数（バイトではなく文字数）。
pub(crate) const MIN_SEARCH_NAME_CHARS: usize = 2;

/// 顧客名から括弧書きと法人格表記を取り除き、検索用の名前を返す。
#[must_use]
pub(crate) fn clean_company_name(raw: &str) -> String {
    let mut name = PARENTHETICAL.replace_all(raw, "").into_owned();
    for marker in LEGAL_ENTITY_MARKERS {
        if name.contains(marker) {
            name = name.replace(marker, "");
        }
    }
    name.trim_matches(|c: char| c.is_whitespace() || c == ',')
        .to_string()
}

/// 検索名がクエリ対象になる長さかどうか。
#[must_use]
pub(crate) fn is_searchable_name(search_name: &str) -> bool {
    search_name.chars().count() >= MIN_SEARCH_NAME_CHARS
}

/// 検索APIがヒット箇所に付ける `<b>` 強調タグを除去する。
#[must_use]
pub(crate) fn strip_emphasis(raw: &str) -> String {
    raw.replace("<b>", "").replace("</b>", "")
}

/// 強調タグを除去してからHTMLエンティティをデコードする。
#[must_use]
pub(crate) fn clean_snippet(raw: &str) -> String {
    let stripped = strip_emphasis(raw);
    html_escape::decode_html_entities(&stripped).into_owned()
}

/// 先頭 `max_chars` 文字だけを残す。
#[must_use]
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
