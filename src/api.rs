pub(crate) mod collect;
pub(crate) mod customers;
pub(crate) mod health;
pub(crate) mod metrics;
pub(crate) mod publish;
pub(crate) mod results;
pub(crate) mod selection;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;

use crate::app::AppState;

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    error: String,
}

pub(crate) fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/health/ready", get(health::ready))
        .route("/health/live", get(health::live))
        .route("/metrics", get(metrics::exporter))
        .route("/v1/customers", get(customers::list_customers))
        .route("/v1/collect", post(collect::run_collection))
        .route("/v1/results", get(results::get_results))
        .route(
            "/v1/selection",
            get(selection::get_selection).delete(selection::clear_selection),
        )
        .route("/v1/selection/item", post(selection::toggle_item))
        .route("/v1/selection/company", post(selection::toggle_company))
        .route("/v1/selection/global", post(selection::toggle_global))
        .route("/v1/publish", post(publish::publish_selection))
        .with_state(state)
}
