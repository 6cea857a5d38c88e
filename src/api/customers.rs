use axum::{Json, extract::State};
use serde::Serialize;

use crate::app::AppState;

#[derive(Debug, Serialize)]
pub(crate) struct CustomerEntry {
    rank: usize,
    name: String,
    search_name: String,
    usage: f64,
    searchable: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct CustomersResponse {
    /// 収集対象数スライダーの上限。
    count: usize,
    customers: Vec<CustomerEntry>,
}

/// GET /v1/customers
pub(crate) async fn list_customers(State(state): State<AppState>) -> Json<CustomersResponse> {
    let customers = state.customers().customers().await;

    let entries = customers
        .iter()
        .enumerate()
        .map(|(index, customer)| CustomerEntry {
            rank: index + 1,
            name: customer.name().to_string(),
            search_name: customer.search_name().to_string(),
            usage: customer.usage(),
            searchable: customer.is_searchable(),
        })
        .collect();

    Json(CustomersResponse {
        count: customers.len(),
        customers: entries,
    })
}
