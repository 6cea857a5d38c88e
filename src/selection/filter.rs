//! Keyword view filter over the result store.

use aho_corasick::AhoCorasick;
use tracing::debug;

use crate::store::{Article, ArticleKey, ResultStore};

/// カンマ区切りのキーワードによるOR条件の絞り込み。
///
/// 大文字小文字は区別する。空のキーワードは無視し、キーワードが一つも
/// 残らなければすべての記事を通す。
#[derive(Debug, Clone, Default)]
pub struct KeywordFilter {
    keywords: Vec<String>,
    matcher: Option<AhoCorasick>,
}

impl KeywordFilter {
    #[must_use]
    pub fn parse(csv: &str) -> Self {
        let keywords: Vec<String> = csv
            .split(',')
            .map(str::trim)
            .filter(|keyword| !keyword.is_empty())
            .map(str::to_string)
            .collect();

        let matcher = if keywords.is_empty() {
            None
        } else {
            match AhoCorasick::new(&keywords) {
                Ok(matcher) => Some(matcher),
                Err(error) => {
                    debug!(%error, "falling back to substring scan for keyword filter");
                    None
                }
            }
        };

        Self { keywords, matcher }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// タイトルか本文のどちらかにキーワードを一つでも含めば真。
    #[must_use]
    pub fn matches(&self, title: &str, description: &str) -> bool {
        if self.keywords.is_empty() {
            return true;
        }
        match &self.matcher {
            Some(matcher) => matcher.is_match(title) || matcher.is_match(description),
            None => self
                .keywords
                .iter()
                .any(|keyword| title.contains(keyword.as_str()) || description.contains(keyword.as_str())),
        }
    }

    #[must_use]
    pub fn matches_article(&self, article: &Article) -> bool {
        self.matches(&article.title, &article.description)
    }
}

/// 表示中の1記事。ストア上のキーを持ち回る。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewEntry<'a> {
    pub key: ArticleKey,
    pub article: &'a Article,
}

/// 表示中の顧客グループ。記事はストアと同じ相対順。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewGroup<'a> {
    pub customer: &'a str,
    pub entries: Vec<ViewEntry<'a>>,
}

/// ストアを変更せずに表示用の部分集合を導出する。
///
/// 通過する記事が一件もない顧客は結果に含めない。
#[must_use]
pub fn apply<'a>(store: &'a ResultStore, filter: &KeywordFilter) -> Vec<ViewGroup<'a>> {
    store
        .groups()
        .filter_map(|(customer, articles)| {
            let entries: Vec<ViewEntry<'a>> = articles
                .iter()
                .enumerate()
                .filter(|(_, article)| filter.matches_article(article))
                .map(|(ordinal, article)| ViewEntry {
                    key: ArticleKey::new(customer, ordinal),
                    article,
                })
                .collect();
            (!entries.is_empty()).then_some(ViewGroup { customer, entries })
        })
        .collect()
}
