//! Per-caller dashboard combining profile, lists and catalog.

use std::time::Instant;

use axum::{
    extract::State,
    http::HeaderMap,
    Extension,
};
use serde::Serialize;
use serde_json::Value;

use crate::aggregate::{caller_headers, expect_array, fetch_data, record_outcome};
use crate::auth::CallerContext;
use crate::error::GatewayError;
use crate::http::request::X_REQUEST_ID;
use crate::http::response::ApiResponse;
use crate::http::server::AppState;

/// Totals derived from the caller's lists and the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_lists: usize,
    pub total_items_in_lists: usize,
    pub total_purchased: usize,
    pub total_estimated: f64,
    pub total_catalog_items: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub user: Value,
    pub lists: Vec<Value>,
    pub summary: DashboardSummary,
}

/// Read one field as a count. Absent or mistyped fields yield `None`.
fn count_field(list: &Value, field: &str) -> Option<usize> {
    list.get(field).and_then(Value::as_u64).map(|n| n as usize)
}

/// Money amounts arrive as numbers or numeric strings ("42.50").
fn amount_field(list: &Value, field: &str) -> Option<f64> {
    match list.get(field)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Compute dashboard totals.
///
/// Lists may carry precomputed counts; otherwise they are derived from
/// `items`. Each field is read on its own, so one malformed field only
/// drops that field's contribution.
pub fn summarize(lists: &[Value], catalog: &[Value]) -> DashboardSummary {
    let mut summary = DashboardSummary {
        total_lists: lists.len(),
        total_catalog_items: catalog.len(),
        ..DashboardSummary::default()
    };

    for list in lists {
        let items = list
            .get("items")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        summary.total_items_in_lists += count_field(list, "itemCount").unwrap_or(items.len());
        summary.total_purchased += count_field(list, "purchasedCount").unwrap_or_else(|| {
            items
                .iter()
                .filter(|item| item.get("purchased").and_then(Value::as_bool).unwrap_or(false))
                .count()
        });
        match amount_field(list, "estimatedTotal") {
            Some(amount) => summary.total_estimated += amount,
            None if list.get("estimatedTotal").is_some_and(|v| !v.is_null()) => {
                tracing::warn!(list = %list.get("id").unwrap_or(&serde_json::Value::Null), "Ignoring unreadable estimatedTotal");
            }
            None => {}
        }
    }
    summary.total_estimated = (summary.total_estimated * 100.0).round() / 100.0;
    summary
}

/// `GET /api/dashboard`
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    headers: HeaderMap,
) -> Result<ApiResponse<Dashboard>, GatewayError> {
    let start_time = Instant::now();
    let result = load_dashboard(&state, &caller, &headers).await.map_err(|e| {
        tracing::error!(error = %e, "Dashboard aggregation failed");
        GatewayError::Aggregation("Failed to load dashboard".to_string())
    });
    record_outcome("dashboard", &result, start_time);
    result.map(ApiResponse::ok)
}

async fn load_dashboard(
    state: &AppState,
    caller: &CallerContext,
    headers: &HeaderMap,
) -> Result<Dashboard, GatewayError> {
    let cfg = &state.aggregation;
    let call_headers = caller_headers(caller, headers.get(X_REQUEST_ID));

    let (user, lists, catalog) = tokio::try_join!(
        fetch_data(&state.forwarder, &cfg.user_service, cfg.profile_path.clone(), call_headers.clone()),
        fetch_data(&state.forwarder, &cfg.list_service, cfg.lists_path.clone(), call_headers.clone()),
        fetch_data(&state.forwarder, &cfg.item_service, cfg.catalog_path.clone(), call_headers),
    )?;

    let lists = expect_array(&cfg.list_service, lists)?;
    let catalog = expect_array(&cfg.item_service, catalog)?;
    let summary = summarize(&lists, &catalog);

    tracing::debug!(
        lists = summary.total_lists,
        catalog = summary.total_catalog_items,
        "Dashboard assembled"
    );
    Ok(Dashboard { user, lists, summary })
}
