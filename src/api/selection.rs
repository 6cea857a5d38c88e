use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error_response;
use crate::app::AppState;
use crate::session::{DashboardSession, SessionError};
use crate::store::ArticleKey;

#[derive(Debug, Deserialize)]
pub(crate) struct ItemToggleRequest {
    customer: String,
    ordinal: usize,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompanyToggleRequest {
    customer: String,
    checked: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GlobalToggleRequest {
    checked: bool,
}

#[derive(Debug, Serialize)]
struct SelectionResponse {
    selected_count: usize,
    total_count: usize,
    global_checked: bool,
    keys: Vec<ArticleKey>,
}

impl SelectionResponse {
    fn from_session(session: &DashboardSession) -> Self {
        Self {
            selected_count: session.selected_count(),
            total_count: session.store().total_count(),
            global_checked: session.is_globally_checked(),
            keys: session.selection().iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ItemToggleResponse {
    selected: bool,
    company_checked: bool,
    #[serde(flatten)]
    selection: SelectionResponse,
}

#[derive(Debug, Serialize)]
struct CompanyToggleResponse {
    customer: String,
    company_checked: bool,
    #[serde(flatten)]
    selection: SelectionResponse,
}

/// GET /v1/selection
pub(crate) async fn get_selection(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session().lock().await;
    Json(SelectionResponse::from_session(&session))
}

/// DELETE /v1/selection
pub(crate) async fn clear_selection(State(state): State<AppState>) -> impl IntoResponse {
    let mut session = state.session().lock().await;
    session.clear_selection();
    debug!("selection cleared");
    Json(SelectionResponse::from_session(&session))
}

/// POST /v1/selection/item
pub(crate) async fn toggle_item(
    State(state): State<AppState>,
    Json(payload): Json<ItemToggleRequest>,
) -> impl IntoResponse {
    let mut session = state.session().lock().await;
    let key = ArticleKey::new(payload.customer, payload.ordinal);

    match session.toggle_item(key.clone()) {
        Ok(selected) => {
            debug!(%key, selected, "article selection toggled");
            let body = ItemToggleResponse {
                selected,
                company_checked: session.is_company_checked(&key.customer),
                selection: SelectionResponse::from_session(&session),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(error @ SessionError::Selection(_)) => {
            error_response(StatusCode::NOT_FOUND, error.to_string())
        }
        Err(error) => error_response(StatusCode::BAD_REQUEST, error.to_string()),
    }
}

/// POST /v1/selection/company
///
/// 絞り込みで隠れている記事も含めて、その顧客の全記事を対象にする。
pub(crate) async fn toggle_company(
    State(state): State<AppState>,
    Json(payload): Json<CompanyToggleRequest>,
) -> impl IntoResponse {
    let mut session = state.session().lock().await;
    session.toggle_company(&payload.customer, payload.checked);
    debug!(customer = %payload.customer, checked = payload.checked, "company selection toggled");

    Json(CompanyToggleResponse {
        company_checked: session.is_company_checked(&payload.customer),
        customer: payload.customer,
        selection: SelectionResponse::from_session(&session),
    })
}

/// POST /v1/selection/global
pub(crate) async fn toggle_global(
    State(state): State<AppState>,
    Json(payload): Json<GlobalToggleRequest>,
) -> impl IntoResponse {
    let mut session = state.session().lock().await;
    session.toggle_global(payload.checked);
    debug!(checked = payload.checked, "global selection toggled");
    Json(SelectionResponse::from_session(&session))
}
