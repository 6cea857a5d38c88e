use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

use crate::{
    api,
    clients::{
        CachedCustomerSource, ChatPublisher, CustomerSource, NaverNewsClient, NaverNewsConfig,
        NewsSearch, SlackWebhookClient, SlackWebhookConfig, StaticCustomerSource,
    },
    config::Config,
    observability::Telemetry,
    pipeline::{Collector, Publisher},
    session::DashboardSession,
    util::RetryConfig,
};

#[derive(Clone)]
pub(crate) struct AppState {
    registry: Arc<ComponentRegistry>,
}

pub struct ComponentRegistry {
    config: Arc<Config>,
    telemetry: Telemetry,
    customers: Arc<CachedCustomerSource>,
    collector: Collector,
    publisher: Publisher,
    session: Mutex<DashboardSession>,
    /// 収集ランと送信ランを直列化する。
    run_guard: Mutex<()>,
}

impl AppState {
    pub(crate) fn new(registry: ComponentRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub(crate) fn telemetry(&self) -> &Telemetry {
        &self.registry.telemetry
    }

    pub(crate) fn config(&self) -> &Config {
        &self.registry.config
    }

    pub(crate) fn customers(&self) -> &CachedCustomerSource {
        &self.registry.customers
    }

    pub(crate) fn collector(&self) -> &Collector {
        &self.registry.collector
    }

    pub(crate) fn publisher(&self) -> &Publisher {
        &self.registry.publisher
    }

    pub(crate) fn session(&self) -> &Mutex<DashboardSession> {
        &self.registry.session
    }

    pub(crate) fn run_guard(&self) -> &Mutex<()> {
        &self.registry.run_guard
    }
}

fn retry_config(config: &Config) -> RetryConfig {
    RetryConfig::new(
        config.http_max_attempts(),
        config.http_backoff_base_ms(),
        config.http_backoff_cap_ms(),
    )
}

impl ComponentRegistry {
    /// 構成情報から外部クライアントを組み立て、アプリケーションの共有レジストリを構築する。
    ///
    /// # Errors
    /// メトリクスの登録や HTTP クライアント構築が失敗した場合はエラーを返す。
    pub fn build(config: Config) -> Result<Self> {
        let retry = retry_config(&config);

        let search = NaverNewsClient::new(NaverNewsConfig {
            base_url: config.search_api_base_url().to_string(),
            client_id: config.search_client_id().to_string(),
            client_secret: config.search_client_secret().to_string(),
            display: config.search_display().get(),
            sort: config.search_sort().to_string(),
            connect_timeout: config.http_connect_timeout(),
            total_timeout: config.http_total_timeout(),
            retry,
        })
        .context("failed to build news search client")?;

        let chat = SlackWebhookClient::new(SlackWebhookConfig {
            webhook_url: config.chat_webhook_url().to_string(),
            footer: config.publish_footer().to_string(),
            max_articles: config.publish_max_articles().get(),
            connect_timeout: config.http_connect_timeout(),
            total_timeout: config.http_total_timeout(),
            retry,
        })
        .context("failed to build chat webhook client")?;

        let customers = StaticCustomerSource::new(config.customer_list().to_vec());

        Self::from_parts(
            config,
            Arc::new(customers),
            Arc::new(search),
            Arc::new(chat),
        )
    }

    /// 外部クライアントを差し替えてレジストリを構築する。
    ///
    /// # Errors
    /// メトリクスの登録に失敗した場合はエラーを返す。
    pub fn from_parts(
        config: Config,
        customer_source: Arc<dyn CustomerSource>,
        search: Arc<dyn NewsSearch>,
        chat: Arc<dyn ChatPublisher>,
    ) -> Result<Self> {
        let config = Arc::new(config);
        let telemetry = Telemetry::new()?;
        let customers = Arc::new(CachedCustomerSource::new(
            customer_source,
            config.customer_cache_ttl(),
            config.customer_fallback(),
        ));
        let collector = Collector::new(search, config.collect_delay(), telemetry.shared_metrics());
        let publisher = Publisher::new(chat, config.publish_delay(), telemetry.shared_metrics());

        Ok(Self {
            config,
            telemetry,
            customers,
            collector,
            publisher,
            session: Mutex::new(DashboardSession::new()),
            run_guard: Mutex::new(()),
        })
    }

    #[must_use]
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }
}

pub fn build_router(registry: ComponentRegistry) -> Router {
    let state = AppState::new(registry);
    api::router(state).layer(TraceLayer::new_for_http())
}
