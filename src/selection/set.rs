use std::collections::BTreeSet;

use thiserror::Error;

use crate::store::{ArticleKey, ResultStore};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("article {0} does not exist in the current results")]
    UnknownArticle(ArticleKey),
}

/// 送信対象として選択された記事キーの集合。
///
/// 含まれるキーはすべて現在のストアで解決できる。ストアが置き換わった
/// ときは所有者が `clear` する。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    keys: BTreeSet<ArticleKey>,
}

impl SelectionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[must_use]
    pub fn contains(&self, key: &ArticleKey) -> bool {
        self.keys.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArticleKey> {
        self.keys.iter()
    }

    /// 1記事の選択を反転し、反転後に選択されているかを返す。
    ///
    /// # Errors
    /// キーが現在のストアで解決できない場合は [`SelectionError::UnknownArticle`]。
    pub fn toggle_item(
        &mut self,
        store: &ResultStore,
        key: ArticleKey,
    ) -> Result<bool, SelectionError> {
        if self.keys.remove(&key) {
            return Ok(false);
        }
        if !store.contains(&key) {
            return Err(SelectionError::UnknownArticle(key));
        }
        self.keys.insert(key);
        Ok(true)
    }

    /// 顧客の全記事（絞り込みで隠れているものも含む）をまとめて選択／解除する。
    pub fn toggle_company(&mut self, store: &ResultStore, customer: &str, checked: bool) {
        for key in store.keys(customer) {
            if checked {
                self.keys.insert(key);
            } else {
                self.keys.remove(&key);
            }
        }
    }

    /// ストア全体を選択する、または選択をすべて外す。
    pub fn toggle_global(&mut self, store: &ResultStore, checked: bool) {
        if checked {
            self.keys = store.all_keys().collect();
        } else {
            self.keys.clear();
        }
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// 送信済みのキーを取り除く。
    pub fn remove_all<'a>(&mut self, keys: impl IntoIterator<Item = &'a ArticleKey>) {
        for key in keys {
            self.keys.remove(key);
        }
    }
}
