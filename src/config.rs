use std::{env, net::SocketAddr, num::NonZeroUsize, time::Duration};

use thiserror::Error;

#[cfg(test)]
use once_cell::sync::Lazy;
#[cfg(test)]
pub(crate) static ENV_MUTEX: Lazy<std::sync::Mutex<()>> = Lazy::new(|| std::sync::Mutex::new(()));

const DEFAULT_SEARCH_API_BASE_URL: &str = "https://openapi.naver.com/";
const DEFAULT_CUSTOMER_FALLBACK: &str = "한국제지;대성에너지";
const DEFAULT_PUBLISH_FOOTER: &str = "From 대성에너지 수요개발팀 뉴스 에이전트";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    http_bind: SocketAddr,
    search_client_id: String,
    search_client_secret: String,
    search_api_base_url: String,
    search_display: NonZeroUsize,
    search_sort: String,
    chat_webhook_url: String,
    http_connect_timeout: Duration,
    http_total_timeout: Duration,
    http_max_attempts: usize,
    http_backoff_base_ms: u64,
    http_backoff_cap_ms: u64,
    collect_delay: Duration,
    publish_delay: Duration,
    publish_max_articles: NonZeroUsize,
    publish_footer: String,
    customer_list: Vec<String>,
    customer_fallback: Vec<String>,
    customer_cache_ttl: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {source}")]
    Invalid {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl Config {
    /// 環境変数からモニターの設定値を読み込み、検証する。
    ///
    /// 検索APIの認証情報とチャットWebhookは必須で、欠けている場合は起動を中止する。
    ///
    /// # Errors
    /// 必須の環境変数が未設定、もしくは各種値のパースに失敗した場合は [`ConfigError`] を返す。
    pub fn from_env() -> Result<Self, ConfigError> {
        let search_client_id = required("SEARCH_CLIENT_ID")?;
        let search_client_secret = required("SEARCH_CLIENT_SECRET")?;
        let chat_webhook_url = required("CHAT_WEBHOOK_URL")?;

        let http_bind = parse_socket_addr("HTTP_BIND", "0.0.0.0:9010")?;
        let search_api_base_url = env::var("SEARCH_API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_SEARCH_API_BASE_URL.to_string());
        let search_display = parse_non_zero_usize("SEARCH_DISPLAY", 3)?;
        let search_sort = env::var("SEARCH_SORT").unwrap_or_else(|_| "date".to_string());

        let http_connect_timeout = parse_duration_ms("HTTP_CONNECT_TIMEOUT_MS", 3000)?;
        let http_total_timeout = parse_duration_ms("HTTP_TOTAL_TIMEOUT_MS", 10000)?;

        // One retry on transient failures.
        let http_max_attempts = parse_usize("HTTP_MAX_ATTEMPTS", 2)?;
        let http_backoff_base_ms = parse_u64("HTTP_BACKOFF_BASE_MS", 250)?;
        let http_backoff_cap_ms = parse_u64("HTTP_BACKOFF_CAP_MS", 2000)?;

        let collect_delay = parse_duration_ms("COLLECT_DELAY_MS", 50)?;
        let publish_delay = parse_duration_ms("PUBLISH_DELAY_MS", 100)?;
        let publish_max_articles = parse_non_zero_usize("PUBLISH_MAX_ARTICLES", 5)?;
        let publish_footer =
            env::var("PUBLISH_FOOTER").unwrap_or_else(|_| DEFAULT_PUBLISH_FOOTER.to_string());

        let customer_list = parse_list("CUSTOMER_LIST", "");
        let customer_fallback = parse_list("CUSTOMER_FALLBACK", DEFAULT_CUSTOMER_FALLBACK);
        if customer_fallback.is_empty() {
            return Err(ConfigError::Invalid {
                name: "CUSTOMER_FALLBACK",
                source: anyhow::anyhow!("fallback customer list must not be empty"),
            });
        }
        let customer_cache_ttl = parse_duration_secs("CUSTOMER_CACHE_TTL_SECS", 600)?;

        Ok(Self {
            http_bind,
            search_client_id,
            search_client_secret,
            search_api_base_url,
            search_display,
            search_sort,
            chat_webhook_url,
            http_connect_timeout,
            http_total_timeout,
            http_max_attempts,
            http_backoff_base_ms,
            http_backoff_cap_ms,
            collect_delay,
            publish_delay,
            publish_max_articles,
            publish_footer,
            customer_list,
            customer_fallback,
            customer_cache_ttl,
        })
    }

    #[must_use]
    pub fn http_bind(&self) -> SocketAddr {
        self.http_bind
    }

    #[must_use]
    pub fn search_client_id(&self) -> &str {
        &self.search_client_id
    }

    #[must_use]
    pub fn search_client_secret(&self) -> &str {
        &self.search_client_secret
    }

    #[must_use]
    pub fn search_api_base_url(&self) -> &str {
        &self.search_api_base_url
    }

    #[must_use]
    pub fn search_display(&self) -> NonZeroUsize {
        self.search_display
    }

    #[must_use]
    pub fn search_sort(&self) -> &str {
        &self.search_sort
    }

    #[must_use]
    pub fn chat_webhook_url(&self) -> &str {
        &self.chat_webhook_url
    }

    #[must_use]
    pub fn http_connect_timeout(&self) -> Duration {
        self.http_connect_timeout
    }

    #[must_use]
    pub fn http_total_timeout(&self) -> Duration {
        self.http_total_timeout
    }

    #[must_use]
    pub fn http_max_attempts(&self) -> usize {
        self.http_max_attempts
    }

    #[must_use]
    pub fn http_backoff_base_ms(&self) -> u64 {
        self.http_backoff_base_ms
    }

    #[must_use]
    pub fn http_backoff_cap_ms(&self) -> u64 {
        self.http_backoff_cap_ms
    }

    #[must_use]
    pub fn collect_delay(&self) -> Duration {
        self.collect_delay
    }

    #[must_use]
    pub fn publish_delay(&self) -> Duration {
        self.publish_delay
    }

    #[must_use]
    pub fn publish_max_articles(&self) -> NonZeroUsize {
        self.publish_max_articles
    }

    #[must_use]
    pub fn publish_footer(&self) -> &str {
        &self.publish_footer
    }

    #[must_use]
    pub fn customer_list(&self) -> &[String] {
        &self.customer_list
    }

    #[must_use]
    pub fn customer_fallback(&self) -> &[String] {
        &self.customer_fallback
    }

    #[must_use]
    pub fn customer_cache_ttl(&self) -> Duration {
        self.customer_cache_ttl
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn parse_socket_addr(name: &'static str, default: &str) -> Result<SocketAddr, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());

    raw.parse().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_non_zero_usize(name: &'static str, default: usize) -> Result<NonZeroUsize, ConfigError> {
    let parsed = parse_usize(name, default)?;
    NonZeroUsize::new(parsed).ok_or_else(|| ConfigError::Invalid {
        name,
        source: anyhow::anyhow!("must be greater than zero"),
    })
}

fn parse_duration_secs(name: &'static str, default_secs: u64) -> Result<Duration, ConfigError> {
    let value = parse_u64(name, default_secs)?;
    Ok(Duration::from_secs(value))
}

fn parse_duration_ms(name: &'static str, default_ms: u64) -> Result<Duration, ConfigError> {
    let value = parse_u64(name, default_ms)?;
    Ok(Duration::from_millis(value))
}

fn parse_usize(name: &'static str, default: usize) -> Result<usize, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse::<usize>()
        .map_err(|error| ConfigError::Invalid {
            name,
            source: anyhow::Error::new(error),
        })
}

fn parse_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse::<u64>()
        .map_err(|error| ConfigError::Invalid {
            name,
            source: anyhow::Error::new(error),
        })
}

/// 顧客名は "Co., Ltd." のようにカンマを含むため、`;` か改行で区切る。
fn parse_list(name: &'static str, default: &str) -> Vec<String> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.split([';', '\n'])
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::{ENV_MUTEX, env};

    pub(crate) const ALL_KEYS: &[&str] = &[
        "SEARCH_CLIENT_ID",
        "SEARCH_CLIENT_SECRET",
        "CHAT_WEBHOOK_URL",
        "HTTP_BIND",
        "SEARCH_API_BASE_URL",
        "SEARCH_DISPLAY",
        "SEARCH_SORT",
        "HTTP_CONNECT_TIMEOUT_MS",
        "HTTP_TOTAL_TIMEOUT_MS",
        "HTTP_MAX_ATTEMPTS",
        "HTTP_BACKOFF_BASE_MS",
        "HTTP_BACKOFF_CAP_MS",
        "COLLECT_DELAY_MS",
        "PUBLISH_DELAY_MS",
        "PUBLISH_MAX_ARTICLES",
        "PUBLISH_FOOTER",
        "CUSTOMER_LIST",
        "CUSTOMER_FALLBACK",
        "CUSTOMER_CACHE_TTL_SECS",
    ];

    pub(crate) fn set_env(name: &str, value: &str) {
        // SAFETY: callers hold ENV_MUTEX and assign valid UTF-8 values.
        unsafe {
            env::set_var(name, value);
        }
    }

    pub(crate) fn remove_env(name: &str) {
        // SAFETY: callers hold ENV_MUTEX and clean up deterministic keys.
        unsafe {
            env::remove_var(name);
        }
    }

    pub(crate) fn reset_env() {
        for key in ALL_KEYS {
            remove_env(key);
        }
    }

    /// 必須キーだけを設定した状態で `Config` を読み込む。
    pub(crate) fn load_with(overrides: &[(&str, &str)]) -> super::Config {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        reset_env();
        set_env("SEARCH_CLIENT_ID", "client-id");
        set_env("SEARCH_CLIENT_SECRET", "client-secret");
        set_env("CHAT_WEBHOOK_URL", "http://localhost:18080/hook");
        for (name, value) in overrides {
            set_env(name, value);
        }
        let config = super::Config::from_env().expect("config should load");
        reset_env();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{load_with, remove_env, reset_env, set_env};
    use super::*;

    #[test]
    fn from_env_uses_defaults_when_optional_missing() {
        let config = load_with(&[]);

        assert_eq!(config.search_client_id(), "client-id");
        assert_eq!(config.search_client_secret(), "client-secret");
        assert_eq!(config.chat_webhook_url(), "http://localhost:18080/hook");
        assert_eq!(config.http_bind(), "0.0.0.0:9010".parse().unwrap());
        assert_eq!(config.search_api_base_url(), DEFAULT_SEARCH_API_BASE_URL);
        assert_eq!(config.search_display().get(), 3);
        assert_eq!(config.search_sort(), "date");
        assert_eq!(config.http_connect_timeout(), Duration::from_millis(3000));
        assert_eq!(config.http_total_timeout(), Duration::from_millis(10000));
        assert_eq!(config.http_max_attempts(), 2);
        assert_eq!(config.http_backoff_base_ms(), 250);
        assert_eq!(config.http_backoff_cap_ms(), 2000);
        assert_eq!(config.collect_delay(), Duration::from_millis(50));
        assert_eq!(config.publish_delay(), Duration::from_millis(100));
        assert_eq!(config.publish_max_articles().get(), 5);
        assert_eq!(config.publish_footer(), DEFAULT_PUBLISH_FOOTER);
        assert!(config.customer_list().is_empty());
        assert_eq!(
            config.customer_fallback(),
            &["한국제지".to_string(), "대성에너지".to_string()]
        );
        assert_eq!(config.customer_cache_ttl(), Duration::from_secs(600));
    }

    #[test]
    fn from_env_overrides_values() {
        let config = load_with(&[
            ("HTTP_BIND", "127.0.0.1:7000"),
            ("SEARCH_DISPLAY", "10"),
            ("COLLECT_DELAY_MS", "0"),
            ("CUSTOMER_LIST", " Acme=10 ; Globex=5 ;; "),
            ("CUSTOMER_CACHE_TTL_SECS", "30"),
        ]);

        assert_eq!(config.http_bind(), "127.0.0.1:7000".parse().unwrap());
        assert_eq!(config.search_display().get(), 10);
        assert_eq!(config.collect_delay(), Duration::ZERO);
        assert_eq!(
            config.customer_list(),
            &["Acme=10".to_string(), "Globex=5".to_string()]
        );
        assert_eq!(config.customer_cache_ttl(), Duration::from_secs(30));
    }

    #[test]
    fn customer_list_keeps_commas_inside_names() {
        let config = load_with(&[
            ("CUSTOMER_LIST", "Acme Co., Ltd.=10;Globex=5\n(주)한국제지=3"),
            ("CUSTOMER_FALLBACK", "Initech, Inc."),
        ]);

        assert_eq!(
            config.customer_list(),
            &[
                "Acme Co., Ltd.=10".to_string(),
                "Globex=5".to_string(),
                "(주)한국제지=3".to_string()
            ]
        );
        assert_eq!(config.customer_fallback(), &["Initech, Inc.".to_string()]);
    }

    #[test]
    fn from_env_rejects_empty_fallback() {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        reset_env();
        set_env("SEARCH_CLIENT_ID", "client-id");
        set_env("SEARCH_CLIENT_SECRET", "client-secret");
        set_env("CHAT_WEBHOOK_URL", "http://localhost:18080/hook");
        set_env("CUSTOMER_FALLBACK", " ; ");

        let error = Config::from_env().expect_err("empty fallback should fail");
        assert!(matches!(
            error,
            ConfigError::Invalid {
                name: "CUSTOMER_FALLBACK",
                ..
            }
        ));
        reset_env();
    }

    #[test]
    fn from_env_errors_when_secret_missing() {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        reset_env();
        set_env("SEARCH_CLIENT_ID", "client-id");
        set_env("CHAT_WEBHOOK_URL", "http://localhost:18080/hook");

        let error = Config::from_env().expect_err("missing secret should fail");
        assert!(matches!(error, ConfigError::Missing("SEARCH_CLIENT_SECRET")));
        reset_env();
    }

    #[test]
    fn from_env_treats_blank_webhook_as_missing() {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        reset_env();
        set_env("SEARCH_CLIENT_ID", "client-id");
        set_env("SEARCH_CLIENT_SECRET", "client-secret");
        set_env("CHAT_WEBHOOK_URL", "   ");

        let error = Config::from_env().expect_err("blank webhook should fail");
        assert!(matches!(error, ConfigError::Missing("CHAT_WEBHOOK_URL")));
        remove_env("CHAT_WEBHOOK_URL");
        reset_env();
    }

    #[test]
    fn from_env_rejects_zero_display() {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        reset_env();
        set_env("SEARCH_CLIENT_ID", "client-id");
        set_env("SEARCH_CLIENT_SECRET", "client-secret");
        set_env("CHAT_WEBHOOK_URL", "http://localhost:18080/hook");
        set_env("SEARCH_DISPLAY", "0");

        let error = Config::from_env().expect_err("zero display should fail");
        assert!(matches!(
            error,
            ConfigError::Invalid {
                name: "SEARCH_DISPLAY",
                ..
            }
        ));
        reset_env();
    }
}
