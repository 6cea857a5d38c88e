//! Dashboard session: the result store and the selection set, owned together.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::selection::{
    KeywordFilter, PublishGroup, SelectionError, SelectionSet, filter, reconcile,
    resolve_for_publish,
};
use crate::store::{Article, ArticleKey, ResultStore};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error("no articles are selected")]
    EmptySelection,
}

/// ダッシュボード1画面分の状態。
///
/// ストアの置き換えと選択のクリアを同じ操作で行うため、両者を直接触らせない。
#[derive(Debug, Default)]
pub struct DashboardSession {
    store: ResultStore,
    selection: SelectionSet,
}

/// 送信前に確定させた計画。`generation` は計画時点のストア世代。
#[derive(Debug, Clone)]
pub struct PublishPlan {
    pub generation: u64,
    pub groups: Vec<PublishGroup>,
    pub misses: Vec<ArticleKey>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub filter: Vec<String>,
    pub global_checked: bool,
    pub selected_count: usize,
    pub total_count: usize,
    pub visible_count: usize,
    pub companies: Vec<CompanyView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyView {
    pub customer: String,
    pub checked: bool,
    pub total_count: usize,
    pub visible_count: usize,
    pub selected_count: usize,
    pub articles: Vec<ArticleCard>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleCard {
    pub ordinal: usize,
    pub title: String,
    pub link: String,
    pub date: String,
    pub selected: bool,
}

impl ArticleCard {
    fn new(key: &ArticleKey, article: &Article, selected: bool) -> Self {
        Self {
            ordinal: key.ordinal,
            title: article.title.clone(),
            link: article.link.clone(),
            date: article.display_date.clone(),
            selected,
        }
    }
}

impl DashboardSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    #[must_use]
    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// 収集結果でストアを差し替え、選択を空にする。新しい世代番号を返す。
    pub fn replace_results(&mut self, results: Vec<(String, Vec<Article>)>) -> u64 {
        let generation = self.store.replace(results);
        self.selection.clear();
        info!(
            generation,
            customers = self.store.customers().count(),
            total_articles = self.store.total_count(),
            "result store replaced"
        );
        generation
    }

    /// # Errors
    /// キーが現在のストアで解決できない場合は [`SessionError::Selection`]。
    pub fn toggle_item(&mut self, key: ArticleKey) -> Result<bool, SessionError> {
        Ok(self.selection.toggle_item(&self.store, key)?)
    }

    pub fn toggle_company(&mut self, customer: &str, checked: bool) {
        self.selection.toggle_company(&self.store, customer, checked);
    }

    pub fn toggle_global(&mut self, checked: bool) {
        self.selection.toggle_global(&self.store, checked);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    #[must_use]
    pub fn is_globally_checked(&self) -> bool {
        reconcile::is_globally_checked(&self.store, &self.selection)
    }

    #[must_use]
    pub fn is_company_checked(&self, customer: &str) -> bool {
        reconcile::is_company_checked(&self.store, &self.selection, customer)
    }

    #[must_use]
    pub fn selected_count(&self) -> usize {
        reconcile::selected_count(&self.selection)
    }

    /// 絞り込み後の表示内容とチェックボックスの状態を組み立てる。
    #[must_use]
    pub fn view(&self, keyword_filter: &KeywordFilter) -> DashboardView {
        let groups = filter::apply(&self.store, keyword_filter);

        let companies: Vec<CompanyView> = groups
            .into_iter()
            .map(|group| {
                let keys = self.store.keys(group.customer);
                let articles: Vec<ArticleCard> = group
                    .entries
                    .iter()
                    .map(|entry| {
                        ArticleCard::new(&entry.key, entry.article, self.selection.contains(&entry.key))
                    })
                    .collect();
                CompanyView {
                    customer: group.customer.to_string(),
                    checked: self.is_company_checked(group.customer),
                    total_count: keys.len(),
                    visible_count: articles.len(),
                    selected_count: keys.iter().filter(|key| self.selection.contains(key)).count(),
                    articles,
                }
            })
            .collect();

        DashboardView {
            filter: keyword_filter.keywords().to_vec(),
            global_checked: self.is_globally_checked(),
            selected_count: self.selected_count(),
            total_count: self.store.total_count(),
            visible_count: companies.iter().map(|company| company.visible_count).sum(),
            companies,
        }
    }

    /// 現在の選択を送信計画に解決する。
    ///
    /// # Errors
    /// 何も選択されていない場合は [`SessionError::EmptySelection`]。
    pub fn publish_plan(&self) -> Result<PublishPlan, SessionError> {
        if self.selection.is_empty() {
            return Err(SessionError::EmptySelection);
        }
        let resolution = resolve_for_publish(&self.store, &self.selection);
        Ok(PublishPlan {
            generation: self.store.generation(),
            groups: resolution.groups,
            misses: resolution.misses,
        })
    }

    /// 送信に成功したキーを選択から外す。
    ///
    /// 計画後にストアが差し替わっていれば選択はすでに空なので何もしない。
    /// 反映したかどうかを返す。
    pub fn apply_publish_outcome(&mut self, generation: u64, delivered: &[ArticleKey]) -> bool {
        if generation != self.store.generation() {
            debug!(
                planned = generation,
                current = self.store.generation(),
                "discarding publish outcome for replaced result store"
            );
            return false;
        }
        self.selection.remove_all(delivered);
        true
    }
}
