use crate::aggregates;
use crate::db_storage::CustomerStore;
use crate::deadline::{Deadline, Deadlines};
use crate::errors::{AppError, ResultExt};
use crate::models::*;
use crate::query_builder::CustomerListQuery;
use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Read-only store over the injected connection pool.
    pub store: CustomerStore,
    /// Per-endpoint read budgets.
    pub deadlines: Deadlines,
}

impl AppState {
    pub fn new(store: CustomerStore, deadlines: Deadlines) -> Self {
        Self { store, deadlines }
    }
}

/// GET /health
///
/// Liveness probe including a storage ping. Returns 503 when the database cannot be reached
/// within the health budget.
pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>, AppError> {
    let deadline = Deadline::after(state.deadlines.health);

    state
        .store
        .ping(&deadline)
        .await
        .map_err(|e| AppError::UpstreamUnavailable(e.to_string()))
        .context("database ping failed")?;

    Ok(Json(HealthResponse {
        status: "ok",
        db: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /customers
///
/// Paginated, filterable, sortable customer list. The total is best-effort: a failing or slow
/// count query only drops `total` from the response.
pub async fn list_customers(
    State(state): State<Arc<AppState>>,
    pairs: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<ListCustomersResponse>, AppError> {
    let Query(pairs) = pairs?;
    let query = CustomerListQuery::from_params(&CustomerListParams::from_pairs(pairs));
    tracing::info!(
        limit = query.limit,
        offset = query.offset,
        filters = query.filters.len(),
        sort = query.sort_column.as_sql(),
        "GET /customers"
    );

    let deadline = Deadline::after(state.deadlines.list);
    let count_deadline = deadline.within(state.deadlines.list_count);

    let total = aggregates::BestEffort::from_result(
        "customers_total",
        state.store.count_customers(&query, &count_deadline).await,
    )
    .available();

    let customers = state
        .store
        .list_customers(&query, &deadline)
        .await
        .context("query customers failed")?;

    Ok(Json(ListCustomersResponse {
        customers,
        limit: query.limit,
        offset: query.offset,
        total,
    }))
}

/// GET /customers/:customer_id/profile
///
/// 360° view of one customer: detail row, credit applications, vehicle ownership and summary.
pub async fn get_customer_profile(
    State(state): State<Arc<AppState>>,
    customer_id: Result<Path<String>, PathRejection>,
) -> Result<Json<CustomerProfileResponse>, AppError> {
    let Path(customer_id) = customer_id?;
    let customer_id = customer_id.trim();
    if customer_id.is_empty() {
        return Err(AppError::BadRequest("customer_id is required".to_string()));
    }
    tracing::info!("GET /customers/{}/profile", customer_id);

    let deadline = Deadline::after(state.deadlines.profile);
    let profile = aggregates::customer_profile(&state.store, customer_id, &deadline).await?;

    tracing::debug!(
        applications = profile.summary.total_credit_applications,
        vehicles = profile.summary.total_vehicle_ownership,
        "profile assembled"
    );

    Ok(Json(profile))
}

/// GET /stats/kpi
pub async fn get_kpi(State(state): State<Arc<AppState>>) -> Result<Json<KpiResponse>, AppError> {
    tracing::info!("GET /stats/kpi");
    let deadline = Deadline::after(state.deadlines.kpi);
    Ok(Json(aggregates::kpi(&state.store, &deadline).await?))
}

/// GET /sync/health
///
/// Status of the external replication job, derived from the latest `sync_audit` row.
pub async fn get_sync_health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SyncHealthResponse>, AppError> {
    let deadline = Deadline::after(state.deadlines.sync_health);
    let resp = aggregates::sync_health(&state.store, &deadline).await?;
    tracing::debug!(status = ?resp.status, lag = ?resp.lag_seconds, "sync health");
    Ok(Json(resp))
}
