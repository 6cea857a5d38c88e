use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::error_response;
use crate::app::AppState;
use crate::pipeline::publish::{DeliveredGroup, FailedGroup};

#[derive(Debug, Serialize)]
struct PublishResponse {
    run_id: Uuid,
    complete: bool,
    delivered: Vec<DeliveredGroup>,
    failed: Vec<FailedGroup>,
    resolution_misses: usize,
    remaining_selected: usize,
}

/// POST /v1/publish
///
/// 選択中の記事を顧客ごとにチャットへ送る。送信できたグループの記事だけを選択から外す。
pub(crate) async fn publish_selection(State(state): State<AppState>) -> impl IntoResponse {
    let _run = state.run_guard().lock().await;

    let plan = match state.session().lock().await.publish_plan() {
        Ok(plan) => plan,
        Err(error) => return error_response(StatusCode::BAD_REQUEST, error.to_string()),
    };

    if !plan.misses.is_empty() {
        state
            .telemetry()
            .metrics()
            .selection_resolution_misses
            .inc_by(plan.misses.len() as f64);
    }

    let outcome = state.publisher().run(plan.groups).await;

    let remaining_selected = {
        let mut session = state.session().lock().await;
        if !session.apply_publish_outcome(plan.generation, &outcome.delivered_keys) {
            warn!(
                run_id = %outcome.report.run_id,
                "result store was replaced during publish, outcome not applied"
            );
        }
        session.selected_count()
    };

    let report = outcome.report;
    let complete = report.is_complete();
    info!(
        run_id = %report.run_id,
        complete,
        delivered = report.delivered.len(),
        failed = report.failed.len(),
        "publish request finished"
    );

    let status = if complete {
        StatusCode::OK
    } else {
        StatusCode::MULTI_STATUS
    };

    (
        status,
        Json(PublishResponse {
            run_id: report.run_id,
            complete,
            delivered: report.delivered,
            failed: report.failed,
            resolution_misses: plan.misses.len(),
            remaining_selected,
        }),
    )
        .into_response()
}
