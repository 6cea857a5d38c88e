//! Aggregate checkbox states, derived on every render and never stored.

use super::set::SelectionSet;
use crate::store::ResultStore;

/// 全体の「すべて選択」の状態。
///
/// 選択集合には現在のストアで解決できるキーしか入らないため、件数の一致で判定できる。
#[must_use]
pub fn is_globally_checked(store: &ResultStore, selection: &SelectionSet) -> bool {
    let total = store.total_count();
    total > 0 && selection.len() == total
}

/// 顧客の「すべて選択」の状態。絞り込みに関係なく全記事で判定する。
#[must_use]
pub fn is_company_checked(store: &ResultStore, selection: &SelectionSet, customer: &str) -> bool {
    let keys = store.keys(customer);
    !keys.is_empty() && keys.iter().all(|key| selection.contains(key))
}

#[must_use]
pub fn selected_count(selection: &SelectionSet) -> usize {
    selection.len()
}
