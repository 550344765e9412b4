use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;
use std::collections::BTreeMap;

// ============ Database Models ============

/// Row shape of the customer list endpoint.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CustomerSummary {
    pub customer_id: String,
    /// National identity number.
    pub nik: String,
    pub full_name: String,
    pub gender: String,
    pub city: String,
    pub province: String,
    pub customer_segment: String,
    pub status: String,
    pub registration_date: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// Full customer record as served by the profile endpoint.
///
/// Nullable columns are `Option` and serialize as `null`, never as an empty value. NUMERIC
/// columns are selected as text and passed through exactly as the database prints them.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CustomerDetail {
    pub customer_id: String,
    pub nik: String,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub marital_status: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub address: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub occupation: String,
    pub employer_name: Option<String>,
    pub monthly_income: String,
    pub employment_status: String,
    pub years_of_employment: Option<i32>,
    pub education_level: String,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
    pub emergency_contact_relation: String,
    pub credit_score: Option<i32>,
    pub customer_segment: String,
    pub registration_date: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub status: String,
}

/// One loan application.
///
/// The optional fields are filled in as the application moves through its lifecycle
/// (approval, disbursement, repayment). Amounts and rates are the database's own decimal text.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CreditApplication {
    pub application_id: String,
    pub customer_id: String,
    pub application_date: DateTime<Utc>,
    pub vehicle_type: String,
    pub vehicle_brand: String,
    pub vehicle_model: String,
    pub vehicle_year: i32,
    pub vehicle_price: String,
    pub down_payment: String,
    pub loan_amount: String,
    pub tenor_months: i32,
    pub interest_rate: String,
    pub monthly_installment: String,
    pub application_status: String,
    pub approval_date: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub disbursement_date: Option<NaiveDate>,
    pub first_installment_date: Option<NaiveDate>,
    pub last_payment_date: Option<NaiveDate>,
    pub outstanding_amount: Option<String>,
    pub payment_status: Option<String>,
    pub collateral_status: Option<String>,
    pub notes: Option<String>,
    pub processed_by: Option<String>,
    pub approved_by: Option<String>,
    pub created_date: DateTime<Utc>,
}

/// One vehicle ownership history entry.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VehicleOwnership {
    pub ownership_id: String,
    pub customer_id: String,
    pub vehicle_type: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub vehicle_price: String,
    pub purchase_date: NaiveDate,
    pub ownership_status: String,
    pub registration_number: Option<String>,
    pub chassis_number: Option<String>,
    pub engine_number: Option<String>,
    pub created_date: DateTime<Utc>,
}

/// Latest row of the externally written `sync_audit` log.
#[derive(Debug, Clone, FromRow)]
pub struct SyncAuditRecord {
    pub tool_name: String,
    pub source_name: String,
    pub target_name: String,
    pub last_source_ts: Option<DateTime<Utc>>,
    pub last_target_ts: Option<DateTime<Utc>>,
    pub lag_seconds: Option<i64>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Most recent application of a customer, used for the profile summary.
#[derive(Debug, Clone, FromRow)]
pub struct LatestApplication {
    pub application_date: DateTime<Utc>,
    pub application_status: String,
}

/// Loan totals of a customer. Both columns are NULL when the customer has no applications.
#[derive(Debug, Clone, Default, FromRow)]
pub struct LoanTotals {
    pub sum_loan_amount: Option<String>,
    pub avg_interest_rate: Option<String>,
}

/// One row of a `GROUP BY` count.
#[derive(Debug, Clone, FromRow)]
pub struct GroupCount {
    pub key: Option<String>,
    pub count: i64,
}

// ============ Request Models ============

/// Raw query string of `GET /customers`.
///
/// Everything is taken as text so that malformed numbers fall back to defaults instead of
/// rejecting the request.
#[derive(Debug, Clone, Default)]
pub struct CustomerListParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub q: Option<String>,
    pub status: Option<String>,
    pub segment: Option<String>,
    pub province: Option<String>,
    pub city: Option<String>,
    pub gender: Option<String>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
}

impl CustomerListParams {
    /// Builds the params from decoded query pairs. A repeated key keeps its first value and
    /// unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "limit" => &mut params.limit,
                "offset" => &mut params.offset,
                "q" => &mut params.q,
                "status" => &mut params.status,
                "segment" => &mut params.segment,
                "province" => &mut params.province,
                "city" => &mut params.city,
                "gender" => &mut params.gender,
                "sort_by" => &mut params.sort_by,
                "sort_dir" => &mut params.sort_dir,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        params
    }
}

// ============ Response Models ============

#[derive(Debug, Serialize)]
pub struct ListCustomersResponse {
    pub customers: Vec<CustomerSummary>,
    pub limit: i64,
    pub offset: i64,
    /// Omitted when the count query failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
}

/// Derived, request-time summary of a customer's applications and vehicles.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileSummary {
    pub total_credit_applications: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_application_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_application_status: Option<String>,
    pub total_vehicle_ownership: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sum_loan_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_interest_rate: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CustomerProfileResponse {
    pub customer: CustomerDetail,
    pub credit_applications: Vec<CreditApplication>,
    pub vehicle_ownership: Vec<VehicleOwnership>,
    pub summary: ProfileSummary,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CustomerKpi {
    pub total: i64,
    pub active: i64,
    pub by_gender: BTreeMap<String, i64>,
    pub by_segment: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreditApplicationKpi {
    pub total: i64,
    pub by_status: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VehicleOwnershipKpi {
    pub total: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct KpiResponse {
    pub customers: CustomerKpi,
    pub credit_applications: CreditApplicationKpi,
    pub vehicle_ownership: VehicleOwnershipKpi,
}

/// Replication health derived from the latest audit row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Ok,
    /// Also the state reported before any audit row exists.
    #[default]
    Warn,
    Error,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncHealthResponse {
    pub status: SyncStatus,
    pub tool_name: Option<String>,
    pub source_name: Option<String>,
    pub target_name: Option<String>,
    pub last_source_ts: Option<DateTime<Utc>>,
    pub last_target_ts: Option<DateTime<Utc>>,
    pub lag_seconds: Option<i64>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub sla_target_seconds: i64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub db: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}
