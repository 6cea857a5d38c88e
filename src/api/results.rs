use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::app::AppState;
use crate::selection::KeywordFilter;
use crate::session::DashboardView;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ResultsQuery {
    #[serde(default)]
    filter: Option<String>,
}

/// GET /v1/results?filter=
///
/// 表示時の絞り込みを適用したカード一覧とチェックボックスの状態。
pub(crate) async fn get_results(
    State(state): State<AppState>,
    Query(query): Query<ResultsQuery>,
) -> Json<DashboardView> {
    let filter = KeywordFilter::parse(query.filter.as_deref().unwrap_or_default());
    let session = state.session().lock().await;
    Json(session.view(&filter))
}
