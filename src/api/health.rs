use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use tracing::error;

use crate::app::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) struct HealthReport {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl HealthReport {
    fn ready() -> Self {
        Self {
            status: "ready",
            detail: None,
        }
    }

    fn degraded(detail: impl Into<String>) -> Self {
        Self {
            status: "degraded",
            detail: Some(detail.into()),
        }
    }
}

/// 顧客一覧を一度でも読み込めていれば準備完了とみなす。
pub(crate) async fn ready(
    State(state): State<AppState>,
) -> Result<Json<HealthReport>, (StatusCode, Json<HealthReport>)> {
    if let Err(error) = state.customers().ensure_loaded().await {
        error!(error = ?error, "customer source readiness check failed");
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthReport::degraded(format!("customer_source: {error:#}"))),
        ));
    }

    Ok(Json(HealthReport::ready()))
}

pub(crate) async fn live(State(state): State<AppState>) -> Json<HealthReport> {
    state.telemetry().record_live_probe();
    Json(HealthReport {
        status: "live",
        detail: None,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;

    use crate::api::test_support::send;
    use crate::app::{ComponentRegistry, build_router, test_support::registry};
    use crate::clients::StaticCustomerSource;
    use crate::config::test_support::load_with;
    use crate::pipeline::collect::fixtures::ScriptedSearch;
    use crate::pipeline::publish::fixtures::RecordingChat;

    #[tokio::test]
    async fn live_and_ready_report_status() {
        let app = build_router(registry(
            &["Acme"],
            Arc::new(ScriptedSearch::default()),
            Arc::new(RecordingChat::default()),
        ));

        let (status, body) = send(&app, "GET", "/health/live", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "live");

        let (status, body) = send(&app, "GET", "/health/ready", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
    }

    #[tokio::test]
    async fn ready_is_degraded_when_customer_source_fails() {
        let registry = ComponentRegistry::from_parts(
            load_with(&[]),
            Arc::new(StaticCustomerSource::new(Vec::new())),
            Arc::new(ScriptedSearch::default()),
            Arc::new(RecordingChat::default()),
        )
        .expect("registry builds");
        let app = build_router(registry);

        let (status, body) = send(&app, "GET", "/health/ready", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "degraded");
        assert!(body["detail"].as_str().is_some_and(|d| d.starts_with("customer_source")));
    }
}
