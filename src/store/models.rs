use serde::{Deserialize, Serialize};

use crate::util::text::{clean_company_name, is_searchable_name};

/// 監視対象の顧客。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Customer {
    name: String,
    search_name: String,
    usage: f64,
}

impl Customer {
    #[must_use]
    pub fn new(name: impl Into<String>, usage: f64) -> Self {
        let name = name.into();
        let search_name = clean_company_name(&name);
        Self {
            name,
            search_name,
            usage,
        }
    }

    /// 元データどおりの顧客名。結果ストアのキーにもなる。
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 括弧書きと法人格表記を除いた検索用の名前。
    #[must_use]
    pub fn search_name(&self) -> &str {
        &self.search_name
    }

    #[must_use]
    pub fn usage(&self) -> f64 {
        self.usage
    }

    /// 検索名が短すぎる顧客はクエリしない。
    #[must_use]
    pub fn is_searchable(&self) -> bool {
        is_searchable_name(&self.search_name)
    }
}

/// 顧客ごとの検索結果に含まれる1件の記事。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub link: String,
    /// カード表示用に切り詰めた日付。
    pub display_date: String,
    /// 検索APIが返した元の日時文字列。送信メッセージの整形にだけ使う。
    pub origin_date: String,
    /// 絞り込みの照合対象。カードには表示しない。
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_derives_search_name() {
        let customer = Customer::new("대성에너지(주)", 1200.0);
        assert_eq!(customer.name(), "대성에너지(주)");
        assert_eq!(customer.search_name(), "대성에너지");
        assert!(customer.is_searchable());
    }

    #[test]
    fn customer_with_one_character_search_name_is_not_searchable() {
        let customer = Customer::new("(주)가", 10.0);
        assert_eq!(customer.search_name(), "가");
        assert!(!customer.is_searchable());
    }
}
