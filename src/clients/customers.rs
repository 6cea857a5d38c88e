//! Customer list sources and the TTL cache in front of them.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Result, ensure};
use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::store::Customer;

/// 使用量の多い順に並んだ顧客一覧を返す。
#[async_trait]
pub trait CustomerSource: Send + Sync {
    async fn load(&self) -> Result<Vec<Customer>>;
}

/// 設定値の `name` / `name=usage` 一覧から顧客を作る。
#[derive(Debug, Clone)]
pub struct StaticCustomerSource {
    entries: Vec<String>,
}

impl StaticCustomerSource {
    #[must_use]
    pub fn new(entries: Vec<String>) -> Self {
        Self { entries }
    }
}

/// `name=usage` を分解する。使用量が数値でなければ全体を顧客名として扱う。
fn parse_entry(entry: &str) -> Customer {
    match entry.rsplit_once('=') {
        Some((name, usage)) if !name.trim().is_empty() => match usage.trim().parse::<f64>() {
            Ok(usage) if usage.is_finite() => Customer::new(name.trim(), usage),
            _ => Customer::new(entry.trim(), 0.0),
        },
        _ => Customer::new(entry.trim(), 0.0),
    }
}

/// 使用量の降順。同じ使用量なら元の順序を保つ。
fn rank_by_usage(customers: &mut [Customer]) {
    customers.sort_by(|a, b| b.usage().total_cmp(&a.usage()));
}

#[async_trait]
impl CustomerSource for StaticCustomerSource {
    async fn load(&self) -> Result<Vec<Customer>> {
        let mut customers: Vec<Customer> = self
            .entries
            .iter()
            .filter(|entry| !entry.trim().is_empty())
            .map(|entry| parse_entry(entry))
            .collect();
        ensure!(!customers.is_empty(), "customer list is empty");

        rank_by_usage(&mut customers);
        Ok(customers)
    }
}

struct CustomerState {
    customers: Arc<Vec<Customer>>,
    loaded_at: Option<Instant>,
}

impl CustomerState {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.loaded_at.is_some_and(|instant| instant.elapsed() < ttl)
    }
}

/// 顧客一覧のキャッシュ。
///
/// TTL内は前回の一覧を返す。再読込に失敗した場合、以前に成功していれば古い一覧を、
/// 一度も成功していなければ固定の代替一覧を返す。
pub struct CachedCustomerSource {
    inner: Arc<dyn CustomerSource>,
    ttl: Duration,
    fallback: Arc<Vec<Customer>>,
    state: RwLock<CustomerState>,
    refresh_mutex: Mutex<()>,
}

impl CachedCustomerSource {
    pub fn new(inner: Arc<dyn CustomerSource>, ttl: Duration, fallback: &[String]) -> Self {
        let fallback: Vec<Customer> = fallback
            .iter()
            .map(|name| Customer::new(name.as_str(), 0.0))
            .collect();
        Self {
            inner,
            ttl,
            fallback: Arc::new(fallback),
            state: RwLock::new(CustomerState {
                customers: Arc::new(Vec::new()),
                loaded_at: None,
            }),
            refresh_mutex: Mutex::new(()),
        }
    }

    /// 現在の顧客一覧。失敗時も代替一覧を返すため、エラーにはならない。
    pub async fn customers(&self) -> Arc<Vec<Customer>> {
        {
            let guard = self.state.read().await;
            if guard.is_fresh(self.ttl) {
                return Arc::clone(&guard.customers);
            }
        }

        let _refresh_guard = self.refresh_mutex.lock().await;

        {
            let guard = self.state.read().await;
            if guard.is_fresh(self.ttl) {
                return Arc::clone(&guard.customers);
            }
        }

        match self.refresh().await {
            Ok(customers) => customers,
            Err(err) => {
                let guard = self.state.read().await;
                if guard.loaded_at.is_some() {
                    warn!(error = ?err, "serving stale customer list after refresh failure");
                    return Arc::clone(&guard.customers);
                }
                warn!(
                    error = ?err,
                    fallback = self.fallback.len(),
                    "customer list unavailable, using fallback"
                );
                Arc::clone(&self.fallback)
            }
        }
    }

    /// 一度でも読み込みに成功しているか。未読込なら読み込みを試みる。
    ///
    /// # Errors
    /// 読み込みに失敗した場合はエラーを返す。
    pub async fn ensure_loaded(&self) -> Result<()> {
        if self.state.read().await.loaded_at.is_some() {
            return Ok(());
        }
        let _refresh_guard = self.refresh_mutex.lock().await;
        if self.state.read().await.loaded_at.is_some() {
            return Ok(());
        }
        self.refresh().await.map(|_| ())
    }

    async fn refresh(&self) -> Result<Arc<Vec<Customer>>> {
        let customers = Arc::new(self.inner.load().await?);
        info!(customers = customers.len(), "loaded customer list");

        let mut guard = self.state.write().await;
        guard.customers = Arc::clone(&customers);
        guard.loaded_at = Some(Instant::now());
        Ok(customers)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// 常に同じ一覧を返すソース。
    pub(crate) struct FixedCustomerSource {
        customers: Vec<Customer>,
    }

    impl FixedCustomerSource {
        pub(crate) fn new(names: &[&str]) -> Self {
            let count = names.len();
            let customers = names
                .iter()
                .enumerate()
                .map(|(rank, name)| Customer::new(*name, (count - rank) as f64))
                .collect();
            Self { customers }
        }
    }

    #[async_trait]
    impl CustomerSource for FixedCustomerSource {
        async fn load(&self) -> Result<Vec<Customer>> {
            Ok(self.customers.clone())
        }
    }

    pub(crate) fn cached(names: &[&str]) -> CachedCustomerSource {
        CachedCustomerSource::new(
            Arc::new(FixedCustomerSource::new(names)),
            Duration::from_secs(600),
            &["한국제지".to_string(), "대성에너지".to_string()],
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use rstest::rstest;

    struct FlakySource {
        calls: AtomicUsize,
        succeed_first: usize,
    }

    #[async_trait]
    impl CustomerSource for FlakySource {
        async fn load(&self) -> Result<Vec<Customer>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            ensure!(call < self.succeed_first, "sheet unavailable");
            Ok(vec![Customer::new("Acme", 10.0)])
        }
    }

    fn names(customers: &[Customer]) -> Vec<&str> {
        customers.iter().map(Customer::name).collect()
    }

    #[rstest]
    #[case("Acme=12.5", "Acme", 12.5)]
    #[case("Acme", "Acme", 0.0)]
    #[case(" 대성에너지(주) = 300 ", "대성에너지(주)", 300.0)]
    #[case("A=B Co.", "A=B Co.", 0.0)]
    #[case("=5", "=5", 0.0)]
    fn parse_entry_reads_optional_usage(
        #[case] raw: &str,
        #[case] name: &str,
        #[case] usage: f64,
    ) {
        let customer = parse_entry(raw);
        assert_eq!(customer.name(), name);
        assert!((customer.usage() - usage).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn static_source_ranks_by_usage_descending() {
        let source = StaticCustomerSource::new(vec![
            "Small=1".to_string(),
            "Big=100".to_string(),
            "Mid=50".to_string(),
            "AlsoMid=50".to_string(),
        ]);

        let customers = source.load().await.expect("list loads");

        assert_eq!(names(&customers), vec!["Big", "Mid", "AlsoMid", "Small"]);
    }

    #[tokio::test]
    async fn configured_list_with_legal_suffix_yields_one_customer() {
        let config =
            crate::config::test_support::load_with(&[("CUSTOMER_LIST", "Acme Co., Ltd.=10;Globex=5")]);
        let source = StaticCustomerSource::new(config.customer_list().to_vec());

        let customers = source.load().await.expect("list loads");

        assert_eq!(names(&customers), vec!["Acme Co., Ltd.", "Globex"]);
        assert_eq!(customers[0].search_name(), "Acme");
        assert!((customers[0].usage() - 10.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn static_source_errors_on_empty_list() {
        let source = StaticCustomerSource::new(vec!["  ".to_string()]);
        assert!(source.load().await.is_err());
    }

    #[tokio::test]
    async fn cache_serves_fresh_list_without_reloading() {
        let inner = Arc::new(FlakySource {
            calls: AtomicUsize::new(0),
            succeed_first: 1,
        });
        let cache = CachedCustomerSource::new(inner.clone(), Duration::from_secs(600), &[]);

        assert_eq!(names(&cache.customers().await), vec!["Acme"]);
        assert_eq!(names(&cache.customers().await), vec!["Acme"]);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cache_serves_stale_list_after_refresh_failure() {
        let inner = Arc::new(FlakySource {
            calls: AtomicUsize::new(0),
            succeed_first: 1,
        });
        let cache = CachedCustomerSource::new(inner.clone(), Duration::ZERO, &[]);

        assert_eq!(names(&cache.customers().await), vec!["Acme"]);
        assert_eq!(names(&cache.customers().await), vec!["Acme"]);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cache_falls_back_when_never_loaded() {
        let inner = Arc::new(FlakySource {
            calls: AtomicUsize::new(0),
            succeed_first: 0,
        });
        let cache = CachedCustomerSource::new(
            inner,
            Duration::from_secs(600),
            &["한국제지".to_string(), "대성에너지".to_string()],
        );

        assert_eq!(names(&cache.customers().await), vec!["한국제지", "대성에너지"]);
        assert!(cache.ensure_loaded().await.is_err());
    }
}
