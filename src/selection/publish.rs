use tracing::warn;

use super::set::SelectionSet;
use crate::store::{Article, ArticleKey, ResultStore};

/// 1顧客分の送信対象。記事はストア上の順に並ぶ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishGroup {
    pub customer: String,
    pub entries: Vec<(ArticleKey, Article)>,
}

/// 選択集合をストアに解決した結果。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishResolution {
    pub groups: Vec<PublishGroup>,
    /// 現在のストアで解決できなかったキー。
    pub misses: Vec<ArticleKey>,
}

impl PublishResolution {
    #[must_use]
    pub fn article_count(&self) -> usize {
        self.groups.iter().map(|group| group.entries.len()).sum()
    }
}

/// 選択キーを現在のストアで解決し、顧客ごとにまとめる。
///
/// 解決できないキーは落として警告ログに残す。顧客の並びと記事の並びは
/// ストアの順序に従う。
#[must_use]
pub fn resolve_for_publish(store: &ResultStore, selection: &SelectionSet) -> PublishResolution {
    let misses: Vec<ArticleKey> = selection
        .iter()
        .filter(|key| !store.contains(key))
        .cloned()
        .collect();

    for key in &misses {
        warn!(%key, "selected article no longer resolves against the result store");
    }

    let groups = store
        .groups()
        .filter_map(|(customer, articles)| {
            let entries: Vec<(ArticleKey, Article)> = articles
                .iter()
                .enumerate()
                .map(|(ordinal, article)| (ArticleKey::new(customer, ordinal), article))
                .filter(|(key, _)| selection.contains(key))
                .map(|(key, article)| (key, article.clone()))
                .collect();
            (!entries.is_empty()).then(|| PublishGroup {
                customer: customer.to_string(),
                entries,
            })
        })
        .collect();

    PublishResolution { groups, misses }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::results::fixtures::acme_globex;

    #[test]
    fn groups_follow_store_order() {
        let store = acme_globex();
        let mut selection = SelectionSet::new();
        selection
            .toggle_item(&store, ArticleKey::new("Globex", 0))
            .expect("known key");
        selection
            .toggle_item(&store, ArticleKey::new("Acme", 1))
            .expect("known key");
        selection
            .toggle_item(&store, ArticleKey::new("Acme", 0))
            .expect("known key");

        let resolution = resolve_for_publish(&store, &selection);

        let customers: Vec<&str> = resolution
            .groups
            .iter()
            .map(|group| group.customer.as_str())
            .collect();
        assert_eq!(customers, vec!["Acme", "Globex"]);
        let acme_links: Vec<&str> = resolution.groups[0]
            .entries
            .iter()
            .map(|(_, article)| article.link.as_str())
            .collect();
        assert_eq!(acme_links, vec!["u0", "u1"]);
        assert_eq!(resolution.article_count(), 3);
        assert!(resolution.misses.is_empty());
    }

    #[test]
    fn stale_keys_are_dropped_and_reported() {
        let store = acme_globex();
        let mut selection = SelectionSet::new();
        selection.toggle_global(&store, true);

        let mut replaced = store.clone();
        replaced.replace(vec![("Acme".to_string(), store.get("Acme")[..1].to_vec())]);

        let resolution = resolve_for_publish(&replaced, &selection);

        assert_eq!(resolution.article_count(), 1);
        assert_eq!(
            resolution.misses,
            vec![ArticleKey::new("Acme", 1), ArticleKey::new("Globex", 0)]
        );
    }

    #[test]
    fn empty_selection_resolves_to_nothing() {
        let store = acme_globex();
        let resolution = resolve_for_publish(&store, &SelectionSet::new());
        assert!(resolution.groups.is_empty());
    }
}
