use sqlx::{Connection, PgPool};

use crate::deadline::Deadline;
use crate::errors::AppError;
use crate::models::{
    CreditApplication, CustomerDetail, CustomerSummary, GroupCount, LatestApplication, LoanTotals,
    SyncAuditRecord, VehicleOwnership,
};
use crate::query_builder::CustomerListQuery;

const CUSTOMER_DETAIL_SQL: &str = r#"
    SELECT customer_id, nik, full_name, date_of_birth, gender, marital_status, phone_number, email,
           address, city, province, postal_code, occupation, employer_name,
           monthly_income::text AS monthly_income, employment_status, years_of_employment,
           education_level,
           emergency_contact_name, emergency_contact_phone, emergency_contact_relation,
           credit_score, customer_segment, registration_date, last_updated, status
    FROM customers
    WHERE customer_id = $1
"#;

const CREDIT_APPLICATIONS_SQL: &str = r#"
    SELECT application_id, customer_id, application_date, vehicle_type, vehicle_brand, vehicle_model,
           vehicle_year, vehicle_price::text AS vehicle_price, down_payment::text AS down_payment,
           loan_amount::text AS loan_amount, tenor_months, interest_rate::text AS interest_rate,
           monthly_installment::text AS monthly_installment, application_status, approval_date,
           rejection_reason, disbursement_date, first_installment_date, last_payment_date,
           outstanding_amount::text AS outstanding_amount, payment_status, collateral_status, notes,
           processed_by, approved_by, created_date
    FROM credit_applications
    WHERE customer_id = $1
    ORDER BY application_date DESC
"#;

const VEHICLE_OWNERSHIP_SQL: &str = r#"
    SELECT ownership_id, customer_id, vehicle_type, brand, model, year,
           vehicle_price::text AS vehicle_price, purchase_date, ownership_status, registration_number,
           chassis_number, engine_number, created_date
    FROM vehicle_ownership
    WHERE customer_id = $1
    ORDER BY created_date DESC
"#;

const LATEST_SYNC_AUDIT_SQL: &str = r#"
    SELECT tool_name, source_name, target_name, last_source_ts, last_target_ts,
           lag_seconds::bigint AS lag_seconds, last_success_at, last_error
    FROM sync_audit
    ORDER BY created_at DESC
    LIMIT 1
"#;

/// Read-only access to the customer schema.
///
/// Every method takes the request's [`Deadline`]; no method holds a connection or transaction
/// beyond its own statement.
#[derive(Clone)]
pub struct CustomerStore {
    pool: PgPool,
}

impl CustomerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Pings the server and runs a trivial statement.
    pub async fn ping(&self, deadline: &Deadline) -> Result<(), AppError> {
        deadline
            .run(async {
                let mut conn = self.pool.acquire().await?;
                conn.ping().await?;
                sqlx::query_scalar::<_, i32>("SELECT 1")
                    .fetch_one(&mut *conn)
                    .await?;
                Ok::<_, sqlx::Error>(())
            })
            .await
    }

    // ============ Listing ============

    pub async fn count_customers(
        &self,
        query: &CustomerListQuery,
        deadline: &Deadline,
    ) -> Result<i64, AppError> {
        let mut builder = query.count_query();
        deadline
            .run(builder.build_query_scalar::<i64>().fetch_one(&self.pool))
            .await
    }

    pub async fn list_customers(
        &self,
        query: &CustomerListQuery,
        deadline: &Deadline,
    ) -> Result<Vec<CustomerSummary>, AppError> {
        let mut builder = query.select_query();
        deadline
            .run(builder.build_query_as::<CustomerSummary>().fetch_all(&self.pool))
            .await
    }

    // ============ Profile ============

    pub async fn find_customer(
        &self,
        customer_id: &str,
        deadline: &Deadline,
    ) -> Result<Option<CustomerDetail>, AppError> {
        deadline
            .run(
                sqlx::query_as::<_, CustomerDetail>(CUSTOMER_DETAIL_SQL)
                    .bind(customer_id)
                    .fetch_optional(&self.pool),
            )
            .await
    }

    pub async fn credit_applications(
        &self,
        customer_id: &str,
        deadline: &Deadline,
    ) -> Result<Vec<CreditApplication>, AppError> {
        deadline
            .run(
                sqlx::query_as::<_, CreditApplication>(CREDIT_APPLICATIONS_SQL)
                    .bind(customer_id)
                    .fetch_all(&self.pool),
            )
            .await
    }

    pub async fn vehicle_ownership(
        &self,
        customer_id: &str,
        deadline: &Deadline,
    ) -> Result<Vec<VehicleOwnership>, AppError> {
        deadline
            .run(
                sqlx::query_as::<_, VehicleOwnership>(VEHICLE_OWNERSHIP_SQL)
                    .bind(customer_id)
                    .fetch_all(&self.pool),
            )
            .await
    }

    pub async fn latest_application(
        &self,
        customer_id: &str,
        deadline: &Deadline,
    ) -> Result<Option<LatestApplication>, AppError> {
        deadline
            .run(
                sqlx::query_as::<_, LatestApplication>(
                    r#"
                    SELECT application_date, application_status
                    FROM credit_applications
                    WHERE customer_id = $1
                    ORDER BY application_date DESC
                    LIMIT 1
                    "#,
                )
                .bind(customer_id)
                .fetch_optional(&self.pool),
            )
            .await
    }

    pub async fn loan_totals(
        &self,
        customer_id: &str,
        deadline: &Deadline,
    ) -> Result<LoanTotals, AppError> {
        deadline
            .run(
                sqlx::query_as::<_, LoanTotals>(
                    r#"
                    SELECT SUM(loan_amount)::text AS sum_loan_amount,
                           AVG(interest_rate)::text AS avg_interest_rate
                    FROM credit_applications
                    WHERE customer_id = $1
                    "#,
                )
                .bind(customer_id)
                .fetch_one(&self.pool),
            )
            .await
    }

    // ============ KPI ============

    pub async fn count_all_customers(&self, deadline: &Deadline) -> Result<i64, AppError> {
        self.scalar_count("SELECT COUNT(*) FROM customers", deadline)
            .await
    }

    pub async fn count_customers_with_status(
        &self,
        status: &str,
        deadline: &Deadline,
    ) -> Result<i64, AppError> {
        deadline
            .run(
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers WHERE status = $1")
                    .bind(status)
                    .fetch_one(&self.pool),
            )
            .await
    }

    pub async fn customers_by_gender(&self, deadline: &Deadline) -> Result<Vec<GroupCount>, AppError> {
        self.group_counts(
            "SELECT gender AS key, COUNT(*) AS count FROM customers GROUP BY gender",
            deadline,
        )
        .await
    }

    pub async fn customers_by_segment(
        &self,
        deadline: &Deadline,
    ) -> Result<Vec<GroupCount>, AppError> {
        self.group_counts(
            "SELECT customer_segment AS key, COUNT(*) AS count FROM customers GROUP BY customer_segment",
            deadline,
        )
        .await
    }

    pub async fn count_credit_applications(&self, deadline: &Deadline) -> Result<i64, AppError> {
        self.scalar_count("SELECT COUNT(*) FROM credit_applications", deadline)
            .await
    }

    pub async fn credit_applications_by_status(
        &self,
        deadline: &Deadline,
    ) -> Result<Vec<GroupCount>, AppError> {
        self.group_counts(
            "SELECT application_status AS key, COUNT(*) AS count \
             FROM credit_applications GROUP BY application_status",
            deadline,
        )
        .await
    }

    pub async fn count_vehicle_ownership(&self, deadline: &Deadline) -> Result<i64, AppError> {
        self.scalar_count("SELECT COUNT(*) FROM vehicle_ownership", deadline)
            .await
    }

    // ============ Sync audit ============

    pub async fn latest_sync_audit(
        &self,
        deadline: &Deadline,
    ) -> Result<Option<SyncAuditRecord>, AppError> {
        deadline
            .run(sqlx::query_as::<_, SyncAuditRecord>(LATEST_SYNC_AUDIT_SQL).fetch_optional(&self.pool))
            .await
    }

    async fn scalar_count(&self, sql: &'static str, deadline: &Deadline) -> Result<i64, AppError> {
        deadline
            .run(sqlx::query_scalar::<_, i64>(sql).fetch_one(&self.pool))
            .await
    }

    async fn group_counts(
        &self,
        sql: &'static str,
        deadline: &Deadline,
    ) -> Result<Vec<GroupCount>, AppError> {
        deadline
            .run(sqlx::query_as::<_, GroupCount>(sql).fetch_all(&self.pool))
            .await
    }
}
