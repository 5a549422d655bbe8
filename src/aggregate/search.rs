//! Global search across the caller's lists and the item catalog.

use std::time::Instant;

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Extension,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::aggregate::{caller_headers, expect_array, fetch_data, record_outcome};
use crate::auth::CallerContext;
use crate::error::GatewayError;
use crate::http::request::X_REQUEST_ID;
use crate::http::response::ApiResponse;
use crate::http::server::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub lists: Vec<Value>,
    pub items: Vec<Value>,
}

/// Keep lists whose name or description contains `query`, ignoring case.
pub fn filter_lists(lists: Vec<Value>, query: &str) -> Vec<Value> {
    let needle = query.to_lowercase();
    lists
        .into_iter()
        .filter(|list| {
            ["name", "description"].iter().any(|field| {
                list.get(field)
                    .and_then(Value::as_str)
                    .map(|text| text.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
        })
        .collect()
}

fn encode_query(q: &str) -> String {
    url::form_urlencoded::byte_serialize(q.as_bytes()).collect()
}

/// `GET /api/search?q=`
pub async fn search(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Query(params): Query<SearchQuery>,
    headers: HeaderMap,
) -> Result<ApiResponse<SearchResults>, GatewayError> {
    let start_time = Instant::now();
    let result = match params.q.map(|q| q.trim().to_string()).filter(|q| !q.is_empty()) {
        None => Err(GatewayError::Validation("Query parameter 'q' is required".to_string())),
        Some(query) => run_search(&state, &caller, &headers, query).await.map_err(|e| {
            tracing::error!(error = %e, "Search aggregation failed");
            GatewayError::Aggregation("Failed to perform search".to_string())
        }),
    };
    record_outcome("search", &result, start_time);
    result.map(ApiResponse::ok)
}

async fn run_search(
    state: &AppState,
    caller: &CallerContext,
    headers: &HeaderMap,
    query: String,
) -> Result<SearchResults, GatewayError> {
    let cfg = &state.aggregation;
    let call_headers = caller_headers(caller, headers.get(X_REQUEST_ID));
    let search_path = format!("{}?q={}", cfg.search_path, encode_query(&query));

    let (lists, items) = tokio::try_join!(
        fetch_data(&state.forwarder, &cfg.list_service, cfg.lists_path.clone(), call_headers.clone()),
        fetch_data(&state.forwarder, &cfg.item_service, search_path, call_headers),
    )?;

    let lists = filter_lists(expect_array(&cfg.list_service, lists)?, &query);
    let items = expect_array(&cfg.item_service, items)?;

    Ok(SearchResults { query, lists, items })
}
