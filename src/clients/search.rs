/// ニュース検索APIクライアント。
///
/// 顧客名ごとに最新記事を数件だけ取得します。タイムアウトと再試行をサポートします。
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

use crate::util::retry::{RetryConfig, retry_with_backoff};

const CLIENT_ID_HEADER: &str = "X-Naver-Client-Id";
const CLIENT_SECRET_HEADER: &str = "X-Naver-Client-Secret";

/// 検索APIが返す1件分の生データ。
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub originallink: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "pubDate")]
    pub pub_date: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

/// 顧客名でニュースを検索する。
#[async_trait]
pub trait NewsSearch: Send + Sync {
    /// 新しい順に最大 `display` 件を返す。
    async fn search(&self, query: &str) -> Result<Vec<SearchItem>>;
}

#[derive(Debug, Clone)]
pub struct NaverNewsConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub display: usize,
    pub sort: String,
    pub connect_timeout: Duration,
    pub total_timeout: Duration,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone)]
pub struct NaverNewsClient {
    client: Client,
    base_url: Url,
    client_id: String,
    client_secret: String,
    display: usize,
    sort: String,
    retry: RetryConfig,
}

impl NaverNewsClient {
    /// # Errors
    /// URLのパースまたはHTTPクライアントの構築に失敗した場合はエラーを返します。
    pub fn new(config: NaverNewsConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.total_timeout)
            .build()
            .context("failed to build news search HTTP client")?;

        let base_url = Url::parse(&config.base_url).context("invalid news search base URL")?;

        Ok(Self {
            client,
            base_url,
            client_id: config.client_id,
            client_secret: config.client_secret,
            display: config.display,
            sort: config.sort,
            retry: config.retry,
        })
    }

    async fn request(&self, query: &str) -> Result<Vec<SearchItem>> {
        let mut url = self
            .base_url
            .join("v1/search/news.json")
            .context("failed to build news search URL")?;
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("display", &self.display.to_string())
            .append_pair("sort", &self.sort);

        let response = self
            .client
            .get(url)
            .header(CLIENT_ID_HEADER, self.client_id.as_str())
            .header(CLIENT_SECRET_HEADER, self.client_secret.as_str())
            .send()
            .await
            .context("news search request failed")?
            .error_for_status()
            .context("news search returned error status")?;

        let body = response
            .json::<SearchResponse>()
            .await
            .context("failed to deserialize news search response")?;

        Ok(body.items)
    }
}

#[async_trait]
impl NewsSearch for NaverNewsClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchItem>> {
        let mut items = retry_with_backoff(&self.retry, "news_search", || self.request(query))
            .await
            .with_context(|| format!("news search for {query} failed"))?;

        items.truncate(self.display);
        debug!(query, items = items.len(), "news search completed");
        Ok(items)
    }
}
