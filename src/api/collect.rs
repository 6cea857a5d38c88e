use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::error_response;
use crate::app::AppState;
use crate::pipeline::CollectionSummary;
use crate::selection::KeywordFilter;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CollectRequest {
    /// 上位何社を対象にするか。省略時は全社。
    #[serde(default)]
    top_n: Option<usize>,
    /// 収集時のキーワード（カンマ区切り）。
    #[serde(default)]
    keywords: Option<String>,
}

#[derive(Debug, Serialize)]
struct CollectResponse {
    run_id: Uuid,
    generation: u64,
    summary: CollectionSummary,
}

/// POST /v1/collect
///
/// 収集ランを実行し、結果ストアを差し替える。選択は空になる。
pub(crate) async fn run_collection(
    State(state): State<AppState>,
    payload: Option<Json<CollectRequest>>,
) -> impl IntoResponse {
    let payload = payload.map(|Json(request)| request).unwrap_or_default();
    let customers = state.customers().customers().await;
    let count = customers.len();
    let top_n = payload.top_n.unwrap_or(count);

    if top_n == 0 || top_n > count {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("top_n must be between 1 and {count}"),
        );
    }

    let keywords = KeywordFilter::parse(payload.keywords.as_deref().unwrap_or_default());

    let _run = state.run_guard().lock().await;
    let outcome = state.collector().run(&customers[..top_n], &keywords).await;

    let generation = {
        let mut session = state.session().lock().await;
        let generation = session.replace_results(outcome.results);
        state
            .telemetry()
            .metrics()
            .stored_articles
            .set(session.store().total_count() as f64);
        generation
    };

    info!(run_id = %outcome.run_id, generation, top_n, "collection results stored");

    (
        StatusCode::OK,
        Json(CollectResponse {
            run_id: outcome.run_id,
            generation,
            summary: outcome.summary,
        }),
    )
        .into_response()
}
