/// Prometheusメトリクス定義。
use prometheus::{
    Counter, Gauge, Histogram, Registry, register_counter_with_registry,
    register_gauge_with_registry, register_histogram_with_registry,
};
use std::sync::Arc;

/// メトリクスコレクター。
#[derive(Debug, Clone)]
pub struct Metrics {
    // カウンター
    pub searches_total: Counter,
    pub search_failures: Counter,
    pub articles_collected: Counter,
    pub customers_skipped: Counter,
    pub messages_published: Counter,
    pub messages_failed: Counter,
    pub selection_resolution_misses: Counter,

    // ヒストグラム
    pub collection_duration: Histogram,
    pub publish_duration: Histogram,

    // ゲージ
    pub stored_articles: Gauge,
}

impl Metrics {
    /// 新しいメトリクスコレクターを作成する。
    ///
    /// # Errors
    /// 同じ名前のメトリクスがレジストリに登録済みの場合はエラーを返す。
    pub fn new(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        Ok(Self {
            searches_total: register_counter_with_registry!(
                "news_monitor_searches_total",
                "Total number of news search calls issued",
                registry
            )?,
            search_failures: register_counter_with_registry!(
                "news_monitor_search_failures_total",
                "News search calls that failed and yielded no results",
                registry
            )?,
            articles_collected: register_counter_with_registry!(
                "news_monitor_articles_collected_total",
                "Articles stored by collection runs",
                registry
            )?,
            customers_skipped: register_counter_with_registry!(
                "news_monitor_customers_skipped_total",
                "Customers skipped because their search name is too short",
                registry
            )?,
            messages_published: register_counter_with_registry!(
                "news_monitor_messages_published_total",
                "Chat messages delivered",
                registry
            )?,
            messages_failed: register_counter_with_registry!(
                "news_monitor_messages_failed_total",
                "Chat messages that could not be delivered",
                registry
            )?,
            selection_resolution_misses: register_counter_with_registry!(
                "news_monitor_selection_resolution_misses_total",
                "Selected keys that no longer resolved at publish time",
                registry
            )?,
            collection_duration: register_histogram_with_registry!(
                "news_monitor_collection_duration_seconds",
                "Duration of an entire collection run",
                registry
            )?,
            publish_duration: register_histogram_with_registry!(
                "news_monitor_publish_duration_seconds",
                "Duration of an entire publish run",
                registry
            )?,
            stored_articles: register_gauge_with_registry!(
                "news_monitor_stored_articles",
                "Articles held by the current result store",
                registry
            )?,
        })
    }
}
