//! Collection run: one news search per eligible customer, strictly in rank order.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::preprocess::normalize_item;
use crate::clients::NewsSearch;
use crate::observability::metrics::Metrics;
use crate::selection::KeywordFilter;
use crate::store::{Article, Customer};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionSummary {
    pub customers_targeted: usize,
    pub customers_queried: usize,
    pub customers_skipped: usize,
    pub customers_with_results: usize,
    pub search_failures: usize,
    pub total_articles: usize,
}

#[derive(Debug, Clone)]
pub struct CollectionOutcome {
    pub run_id: Uuid,
    /// 記事が1件以上残った顧客だけを収集順に並べたもの。
    pub results: Vec<(String, Vec<Article>)>,
    pub summary: CollectionSummary,
}

pub struct Collector {
    search: Arc<dyn NewsSearch>,
    delay: Duration,
    metrics: Arc<Metrics>,
}

impl Collector {
    pub fn new(search: Arc<dyn NewsSearch>, delay: Duration, metrics: Arc<Metrics>) -> Self {
        Self {
            search,
            delay,
            metrics,
        }
    }

    /// 顧客を順番に検索し、収集時キーワードを通過した記事を集める。
    ///
    /// 検索の失敗はその顧客の結果を空とみなして続行する。
    pub async fn run(&self, customers: &[Customer], keywords: &KeywordFilter) -> CollectionOutcome {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        let mut summary = CollectionSummary {
            customers_targeted: customers.len(),
            ..CollectionSummary::default()
        };
        let mut results = Vec::new();

        info!(
            %run_id,
            customers = customers.len(),
            keywords = ?keywords.keywords(),
            "collection run started"
        );

        for customer in customers {
            if customer.is_searchable() {
                summary.customers_queried += 1;
                let articles = self.collect_one(run_id, customer, keywords, &mut summary).await;
                if !articles.is_empty() {
                    summary.customers_with_results += 1;
                    summary.total_articles += articles.len();
                    results.push((customer.name().to_string(), articles));
                }
            } else {
                summary.customers_skipped += 1;
                self.metrics.customers_skipped.inc();
                debug!(
                    %run_id,
                    customer = customer.name(),
                    search_name = customer.search_name(),
                    "skipping customer with short search name"
                );
            }

            tokio::time::sleep(self.delay).await;
        }

        self.metrics
            .articles_collected
            .inc_by(summary.total_articles as f64);
        self.metrics
            .collection_duration
            .observe(started.elapsed().as_secs_f64());

        info!(
            %run_id,
            queried = summary.customers_queried,
            skipped = summary.customers_skipped,
            with_results = summary.customers_with_results,
            total_articles = summary.total_articles,
            "collection run completed"
        );

        CollectionOutcome {
            run_id,
            results,
            summary,
        }
    }

    async fn collect_one(
        &self,
        run_id: Uuid,
        customer: &Customer,
        keywords: &KeywordFilter,
        summary: &mut CollectionSummary,
    ) -> Vec<Article> {
        self.metrics.searches_total.inc();

        let items = match self.search.search(customer.search_name()).await {
            Ok(items) => items,
            Err(err) => {
                summary.search_failures += 1;
                self.metrics.search_failures.inc();
                warn!(
                    %run_id,
                    customer = customer.name(),
                    error = ?err,
                    "news search failed, continuing with no results"
                );
                Vec::new()
            }
        };

        items
            .into_iter()
            .map(normalize_item)
            .filter(|article| keywords.matches_article(article))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use anyhow::{Result, bail};
    use async_trait::async_trait;
    use rustc_hash::FxHashMap;
    use tokio::sync::Mutex;

    use crate::clients::{NewsSearch, SearchItem};

    /// クエリごとに決まった結果を返す検索。未登録のクエリは失敗する。
    #[derive(Default)]
    pub(crate) struct ScriptedSearch {
        responses: FxHashMap<String, Vec<SearchItem>>,
        pub(crate) queries: Mutex<Vec<String>>,
    }

    impl ScriptedSearch {
        pub(crate) fn with(mut self, query: &str, titles: &[&str]) -> Self {
            let items = titles
                .iter()
                .enumerate()
                .map(|(n, title)| SearchItem {
                    title: (*title).to_string(),
                    originallink: format!("https://{query}.example.com/{n}"),
                    link: String::new(),
                    description: format!("{title} snippet"),
                    pub_date: "Sun, 18 Oct 2026 09:30:00 +0900".to_string(),
                })
                .collect();
            self.responses.insert(query.to_string(), items);
            self
        }
    }

    #[async_trait]
    impl NewsSearch for ScriptedSearch {
        async fn search(&self, query: &str) -> Result<Vec<SearchItem>> {
            self.queries.lock().await.push(query.to_string());
            match self.responses.get(query) {
                Some(items) => Ok(items.clone()),
                None => bail!("upstream unavailable for {query}"),
            }
        }
    }
}
