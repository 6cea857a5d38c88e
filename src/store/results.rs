//! Per-customer result store of the latest collection run.

use rustc_hash::FxHashMap;
use tracing::debug;

use super::key::ArticleKey;
use super::models::Article;

#[derive(Debug, Clone, PartialEq, Eq)]
struct CustomerResults {
    customer: String,
    articles: Vec<Article>,
}

/// 収集結果ストア。
///
/// 収集ランごとに丸ごと置き換えられ、部分的な更新APIは持たない。
/// 置き換えのたびに `generation` が増える。
#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    generation: u64,
    entries: Vec<CustomerResults>,
    index: FxHashMap<String, usize>,
    total: usize,
}

impl ResultStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 顧客順を保ったままストア全体を差し替える。
    ///
    /// 記事のない顧客は格納しない。同じ顧客名が複数回現れた場合は
    /// 最初の位置を保ったまま後の結果で上書きする。
    pub fn replace(&mut self, results: Vec<(String, Vec<Article>)>) -> u64 {
        let mut entries: Vec<CustomerResults> = Vec::with_capacity(results.len());
        let mut index: FxHashMap<String, usize> = FxHashMap::default();

        for (customer, articles) in results {
            if articles.is_empty() {
                continue;
            }
            if let Some(&position) = index.get(&customer) {
                debug!(%customer, "duplicate customer in collection results, keeping latest");
                entries[position].articles = articles;
                continue;
            }
            index.insert(customer.clone(), entries.len());
            entries.push(CustomerResults { customer, articles });
        }

        self.total = entries.iter().map(|entry| entry.articles.len()).sum();
        self.entries = entries;
        self.index = index;
        self.generation += 1;
        self.generation
    }

    /// 顧客の未絞り込みの記事列。未知の顧客なら空。
    #[must_use]
    pub fn get(&self, customer: &str) -> &[Article] {
        match self.index.get(customer) {
            Some(&position) => &self.entries[position].articles,
            None => &[],
        }
    }

    #[must_use]
    pub fn total_count(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn contains_customer(&self, customer: &str) -> bool {
        self.index.contains_key(customer)
    }

    /// 収集順の顧客名。
    pub fn customers(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.customer.as_str())
    }

    /// 収集順の (顧客名, 記事列)。
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[Article])> {
        self.entries
            .iter()
            .map(|entry| (entry.customer.as_str(), entry.articles.as_slice()))
    }

    /// 顧客の全記事のキー。絞り込み状態には依存しない。
    #[must_use]
    pub fn keys(&self, customer: &str) -> Vec<ArticleKey> {
        (0..self.get(customer).len())
            .map(|ordinal| ArticleKey::new(customer, ordinal))
            .collect()
    }

    /// ストア全体のキー。
    pub fn all_keys(&self) -> impl Iterator<Item = ArticleKey> + '_ {
        self.groups().flat_map(|(customer, articles)| {
            (0..articles.len()).map(move |ordinal| ArticleKey::new(customer, ordinal))
        })
    }

    /// キーを現在のストアの記事に解決する。範囲外なら `None`。
    #[must_use]
    pub fn resolve(&self, key: &ArticleKey) -> Option<&Article> {
        self.get(&key.customer).get(key.ordinal)
    }

    #[must_use]
    pub fn contains(&self, key: &ArticleKey) -> bool {
        self.resolve(key).is_some()
    }
}
