/// チャットWebhookへの送信クライアント。
///
/// 顧客ごとに1通のBlock Kitメッセージを組み立てて投稿します。
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::{Client, Url};
use serde::Serialize;
use tracing::debug;

use crate::store::Article;
use crate::util::retry::{RetryConfig, retry_with_backoff};

const PUBLISH_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// 顧客1社分の記事をチャットへ送る。
#[async_trait]
pub trait ChatPublisher: Send + Sync {
    async fn publish(&self, customer: &str, articles: &[Article]) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct SlackMessage {
    text: String,
    blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Block {
    Header { text: TextObject },
    Divider,
    Section { text: TextObject },
    Context { elements: Vec<TextObject> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
enum TextObject {
    #[serde(rename = "plain_text")]
    PlainText { text: String, emoji: bool },
    #[serde(rename = "mrkdwn")]
    Mrkdwn { text: String },
}

impl SlackMessage {
    /// 先頭 `max_articles` 件だけでメッセージを組み立てる。
    pub(crate) fn build(
        customer: &str,
        articles: &[Article],
        footer: &str,
        max_articles: usize,
    ) -> Self {
        let mut blocks = Vec::with_capacity(articles.len().min(max_articles) + 3);
        blocks.push(Block::Header {
            text: TextObject::PlainText {
                text: format!("🏢 {customer} 주요 소식"),
                emoji: true,
            },
        });
        blocks.push(Block::Divider);

        for article in articles.iter().take(max_articles) {
            blocks.push(Block::Section {
                text: TextObject::Mrkdwn {
                    text: format!(
                        "*<{}|{}>*\n📅 {}",
                        escape_mrkdwn(&article.link),
                        escape_mrkdwn(&article.title),
                        publish_date(article)
                    ),
                },
            });
        }

        blocks.push(Block::Context {
            elements: vec![TextObject::Mrkdwn {
                text: footer.to_string(),
            }],
        });

        Self {
            text: format!("{customer} 관련 뉴스 모음"),
            blocks,
        }
    }
}

/// 元の日時がRFC 2822として読めれば分単位に整形し、読めなければ表示用の日付を使う。
fn publish_date(article: &Article) -> String {
    DateTime::parse_from_rfc2822(&article.origin_date).map_or_else(
        |_| article.display_date.clone(),
        |parsed| parsed.format(PUBLISH_DATE_FORMAT).to_string(),
    )
}

/// mrkdwnの制御文字だけをエスケープする。
fn escape_mrkdwn(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[derive(Debug, Clone)]
pub struct SlackWebhookConfig {
    pub webhook_url: String,
    pub footer: String,
    pub max_articles: usize,
    pub connect_timeout: Duration,
    pub total_timeout: Duration,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone)]
pub struct SlackWebhookClient {
    client: Client,
    webhook_url: Url,
    footer: String,
    max_articles: usize,
    retry: RetryConfig,
}

impl SlackWebhookClient {
    /// # Errors
    /// URLのパースまたはHTTPクライアントの構築に失敗した場合はエラーを返します。
    pub fn new(config: SlackWebhookConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.total_timeout)
            .build()
            .context("failed to build chat webhook HTTP client")?;

        let webhook_url = Url::parse(&config.webhook_url).context("invalid chat webhook URL")?;

        Ok(Self {
            client,
            webhook_url,
            footer: config.footer,
            max_articles: config.max_articles,
            retry: config.retry,
        })
    }

    async fn post(&self, message: &SlackMessage) -> Result<()> {
        self.client
            .post(self.webhook_url.clone())
            .json(message)
            .send()
            .await
            .context("chat webhook request failed")?
            .error_for_status()
            .context("chat webhook returned error status")?;
        Ok(())
    }
}

#[async_trait]
impl ChatPublisher for SlackWebhookClient {
    async fn publish(&self, customer: &str, articles: &[Article]) -> Result<()> {
        let message = SlackMessage::build(customer, articles, &self.footer, self.max_articles);

        retry_with_backoff(&self.retry, "chat_publish", || self.post(&message))
            .await
            .with_context(|| format!("failed to publish news for {customer}"))?;

        debug!(
            customer,
            articles = articles.len().min(self.max_articles),
            "published customer news"
        );
        Ok(())
    }
}
