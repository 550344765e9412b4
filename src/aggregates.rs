//! Derived summaries: customer profile, KPI counters and replication health.
//!
//! Failure policy differs per aggregate. Profile extras (latest application, loan totals) are
//! best-effort and degrade to absent fields. KPI counters are all-or-nothing. Sync health treats a
//! missing audit row as the normal `warn` state.

use std::collections::BTreeMap;

use crate::db_storage::CustomerStore;
use crate::deadline::Deadline;
use crate::errors::{AppError, ResultExt};
use crate::models::{
    CustomerProfileResponse, GroupCount, KpiResponse, LatestApplication, LoanTotals,
    ProfileSummary, SyncAuditRecord, SyncHealthResponse, SyncStatus,
};

/// Replication lag above which sync health reports `warn`.
pub const SYNC_SLA_TARGET_SECONDS: i64 = 10;

/// Label used for NULL or empty grouping keys.
pub const UNKNOWN_GROUP: &str = "Unknown";

/// Outcome of a secondary aggregate whose failure must not fail the request.
#[derive(Debug)]
pub enum BestEffort<T> {
    Available(T),
    Unavailable(String),
}

impl<T> BestEffort<T> {
    /// Wraps a read result, logging the failure if there is one.
    pub fn from_result(aggregate: &str, result: Result<T, AppError>) -> Self {
        match result {
            Ok(value) => BestEffort::Available(value),
            Err(e) => {
                tracing::warn!(aggregate, error = %e, "aggregate unavailable");
                BestEffort::Unavailable(e.to_string())
            }
        }
    }

    pub fn available(self) -> Option<T> {
        match self {
            BestEffort::Available(value) => Some(value),
            BestEffort::Unavailable(_) => None,
        }
    }
}

/// Builds the profile summary. Counts always come from the fetched sets; the optional extras only
/// fill in when their queries succeeded.
pub fn summarize_profile(
    application_count: usize,
    vehicle_count: usize,
    latest: BestEffort<Option<LatestApplication>>,
    totals: BestEffort<LoanTotals>,
) -> ProfileSummary {
    let latest = latest.available().flatten();
    let totals = totals.available().unwrap_or_default();

    ProfileSummary {
        total_credit_applications: application_count,
        latest_application_date: latest.as_ref().map(|l| l.application_date),
        latest_application_status: latest.map(|l| l.application_status),
        total_vehicle_ownership: vehicle_count,
        sum_loan_amount: totals.sum_loan_amount,
        avg_interest_rate: totals.avg_interest_rate,
    }
}

/// Loads the 360° view of one customer.
///
/// Returns `NotFound` when the customer row does not exist. Application and vehicle reads are
/// mandatory; the summary extras are best-effort.
pub async fn customer_profile(
    store: &CustomerStore,
    customer_id: &str,
    deadline: &Deadline,
) -> Result<CustomerProfileResponse, AppError> {
    let customer = store
        .find_customer(customer_id, deadline)
        .await
        .context("query customer failed")?
        .ok_or_else(|| AppError::NotFound("customer not found".to_string()))?;

    let credit_applications = store
        .credit_applications(customer_id, deadline)
        .await
        .context("query credit_applications failed")?;

    let vehicle_ownership = store
        .vehicle_ownership(customer_id, deadline)
        .await
        .context("query vehicle_ownership failed")?;

    let latest = BestEffort::from_result(
        "latest_application",
        store.latest_application(customer_id, deadline).await,
    );
    let totals = BestEffort::from_result(
        "loan_totals",
        store.loan_totals(customer_id, deadline).await,
    );

    let summary = summarize_profile(
        credit_applications.len(),
        vehicle_ownership.len(),
        latest,
        totals,
    );

    Ok(CustomerProfileResponse {
        customer,
        credit_applications,
        vehicle_ownership,
        summary,
    })
}

/// Folds grouped counts into a map, collapsing NULL and empty keys into `"Unknown"`.
pub fn group_counts_to_map(rows: Vec<GroupCount>) -> BTreeMap<String, i64> {
    let mut map = BTreeMap::new();
    for row in rows {
        let key = row
            .key
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| UNKNOWN_GROUP.to_string());
        *map.entry(key).or_insert(0) += row.count;
    }
    map
}

/// Computes the KPI counters. The first failing query fails the whole call.
pub async fn kpi(store: &CustomerStore, deadline: &Deadline) -> Result<KpiResponse, AppError> {
    let mut resp = KpiResponse::default();

    resp.customers.total = store
        .count_all_customers(deadline)
        .await
        .context("count customers failed")?;
    resp.customers.active = store
        .count_customers_with_status("Active", deadline)
        .await
        .context("count active customers failed")?;
    resp.customers.by_gender = group_counts_to_map(
        store
            .customers_by_gender(deadline)
            .await
            .context("query customers by_gender failed")?,
    );
    resp.customers.by_segment = group_counts_to_map(
        store
            .customers_by_segment(deadline)
            .await
            .context("query customers by_segment failed")?,
    );

    resp.credit_applications.total = store
        .count_credit_applications(deadline)
        .await
        .context("count credit_applications failed")?;
    resp.credit_applications.by_status = group_counts_to_map(
        store
            .credit_applications_by_status(deadline)
            .await
            .context("query credit_applications by_status failed")?,
    );

    resp.vehicle_ownership.total = store
        .count_vehicle_ownership(deadline)
        .await
        .context("count vehicle_ownership failed")?;

    Ok(resp)
}

/// Derives replication health from the latest audit row.
///
/// A non-empty `last_error` wins over lag; lag above the SLA is `warn`; anything else is `ok`.
pub fn derive_sync_status(last_error: Option<&str>, lag_seconds: Option<i64>) -> SyncStatus {
    if last_error.is_some_and(|e| !e.is_empty()) {
        SyncStatus::Error
    } else if lag_seconds.is_some_and(|lag| lag > SYNC_SLA_TARGET_SECONDS) {
        SyncStatus::Warn
    } else {
        SyncStatus::Ok
    }
}

/// Shapes the sync-health response. No audit row yet is the default `warn` state.
pub fn sync_health_from_record(record: Option<SyncAuditRecord>) -> SyncHealthResponse {
    let Some(record) = record else {
        return SyncHealthResponse {
            status: SyncStatus::Warn,
            sla_target_seconds: SYNC_SLA_TARGET_SECONDS,
            ..Default::default()
        };
    };

    SyncHealthResponse {
        status: derive_sync_status(record.last_error.as_deref(), record.lag_seconds),
        tool_name: Some(record.tool_name),
        source_name: Some(record.source_name),
        target_name: Some(record.target_name),
        last_source_ts: record.last_source_ts,
        last_target_ts: record.last_target_ts,
        lag_seconds: record.lag_seconds,
        last_success_at: record.last_success_at,
        last_error: record.last_error,
        sla_target_seconds: SYNC_SLA_TARGET_SECONDS,
    }
}

pub async fn sync_health(
    store: &CustomerStore,
    deadline: &Deadline,
) -> Result<SyncHealthResponse, AppError> {
    let record = store
        .latest_sync_audit(deadline)
        .await
        .context("query sync_audit failed")?;
    Ok(sync_health_from_record(record))
}
