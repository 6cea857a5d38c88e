//! Publish run: one chat message per customer group, sent sequentially.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::clients::ChatPublisher;
use crate::observability::metrics::Metrics;
use crate::selection::PublishGroup;
use crate::store::{Article, ArticleKey};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveredGroup {
    pub customer: String,
    pub article_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedGroup {
    pub customer: String,
    pub error: String,
}

/// 送信結果の内訳。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    pub run_id: Uuid,
    pub delivered: Vec<DeliveredGroup>,
    pub failed: Vec<FailedGroup>,
}

impl PublishReport {
    /// 全グループの送信に成功したか。
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct PublishOutcome {
    pub report: PublishReport,
    /// 送信に成功したグループに含まれていたキー。
    pub delivered_keys: Vec<ArticleKey>,
}

pub struct Publisher {
    chat: Arc<dyn ChatPublisher>,
    delay: Duration,
    metrics: Arc<Metrics>,
}

impl Publisher {
    pub fn new(chat: Arc<dyn ChatPublisher>, delay: Duration, metrics: Arc<Metrics>) -> Self {
        Self {
            chat,
            delay,
            metrics,
        }
    }

    /// 顧客グループを順番に送る。失敗したグループがあっても残りは送り続ける。
    pub async fn run(&self, groups: Vec<PublishGroup>) -> PublishOutcome {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        let mut delivered = Vec::new();
        let mut failed = Vec::new();
        let mut delivered_keys = Vec::new();

        info!(%run_id, groups = groups.len(), "publish run started");

        for group in groups {
            let (keys, articles): (Vec<ArticleKey>, Vec<Article>) =
                group.entries.into_iter().unzip();

            match self.chat.publish(&group.customer, &articles).await {
                Ok(()) => {
                    self.metrics.messages_published.inc();
                    delivered.push(DeliveredGroup {
                        customer: group.customer,
                        article_count: articles.len(),
                    });
                    delivered_keys.extend(keys);
                }
                Err(err) => {
                    self.metrics.messages_failed.inc();
                    warn!(
                        %run_id,
                        customer = %group.customer,
                        error = ?err,
                        "failed to publish customer group"
                    );
                    failed.push(FailedGroup {
                        customer: group.customer,
                        error: format!("{err:#}"),
                    });
                }
            }

            tokio::time::sleep(self.delay).await;
        }

        self.metrics
            .publish_duration
            .observe(started.elapsed().as_secs_f64());
        info!(
            %run_id,
            delivered = delivered.len(),
            failed = failed.len(),
            "publish run completed"
        );

        PublishOutcome {
            report: PublishReport {
                run_id,
                delivered,
                failed,
            },
            delivered_keys,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use anyhow::{Result, bail};
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use crate::clients::ChatPublisher;
    use crate::store::Article;

    /// 送信内容を記録するチャット。`failing` に含まれる顧客は失敗させる。
    #[derive(Default)]
    pub(crate) struct RecordingChat {
        failing: Vec<String>,
        pub(crate) sent: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl RecordingChat {
        pub(crate) fn failing_for(customers: &[&str]) -> Self {
            Self {
                failing: customers.iter().map(|c| (*c).to_string()).collect(),
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatPublisher for RecordingChat {
        async fn publish(&self, customer: &str, articles: &[Article]) -> Result<()> {
            if self.failing.iter().any(|c| c == customer) {
                bail!("webhook rejected message for {customer}");
            }
            self.sent.lock().await.push((
                customer.to_string(),
                articles.iter().map(|a| a.link.clone()).collect(),
            ));
            Ok(())
        }
    }
}
