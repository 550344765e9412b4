/// Database-backed scenario tests.
/// Marked ignored so they never run without a database; set TEST_DATABASE_URL to run.
/// Each test works inside its own throwaway schema.
mod common;

use axum::http::StatusCode;
use common::{app, app_with_deadlines, get_json, NewCustomer, TestDb};
use customer360_api::deadline::Deadlines;
use std::time::Duration;
use serde_json::{json, Value};

fn names(body: &Value) -> Vec<String> {
    body["customers"]
        .as_array()
        .expect("customers array")
        .iter()
        .map(|c| c["full_name"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
#[ignore]
async fn active_customers_sorted_by_name_first_page() -> anyhow::Result<()> {
    let db = TestDb::new().await?;
    db.insert_customer(NewCustomer::active("C-003", "Citra")).await?;
    db.insert_customer(NewCustomer::active("C-001", "Amir")).await?;
    db.insert_customer(NewCustomer::active("C-002", "Budi")).await?;
    db.insert_customer(NewCustomer {
        status: "Inactive",
        ..NewCustomer::active("C-004", "Aaron")
    })
    .await?;

    let (status, body) = get_json(
        app(db.pool.clone()),
        "/customers?status=Active&sort_by=full_name&sort_dir=asc&limit=2&offset=0",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["Amir", "Budi"]);
    assert_eq!(body["limit"], 2);
    assert_eq!(body["offset"], 0);
    assert_eq!(body["total"], 3);

    db.teardown().await
}

#[tokio::test]
#[ignore]
async fn list_is_served_without_total_when_count_fails() -> anyhow::Result<()> {
    let db = TestDb::new().await?;
    db.insert_customer(NewCustomer::active("C-001", "Amir")).await?;
    db.insert_customer(NewCustomer::active("C-002", "Budi")).await?;

    // A zero count budget makes the count read time out before it can answer.
    let deadlines = Deadlines {
        list_count: Duration::ZERO,
        ..Deadlines::default()
    };
    let (status, body) = get_json(
        app_with_deadlines(db.pool.clone(), deadlines),
        "/customers?sort_by=full_name&sort_dir=asc",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["Amir", "Budi"]);
    assert_eq!(body["limit"], 20);
    assert_eq!(body["offset"], 0);
    assert!(body.get("total").is_none());

    db.teardown().await
}

#[tokio::test]
#[ignore]
async fn repeated_limit_uses_first_value() -> anyhow::Result<()> {
    let db = TestDb::new().await?;
    db.insert_customer(NewCustomer::active("C-001", "Amir")).await?;
    db.insert_customer(NewCustomer::active("C-002", "Budi")).await?;

    let (status, body) = get_json(app(db.pool.clone()), "/customers?limit=1&limit=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["limit"], 1);
    assert_eq!(body["customers"].as_array().unwrap().len(), 1);
    assert_eq!(body["total"], 2);

    db.teardown().await
}

#[tokio::test]
#[ignore]
async fn default_order_is_most_recently_updated_first() -> anyhow::Result<()> {
    let db = TestDb::new().await?;
    db.insert_customer(NewCustomer {
        updated_minutes_ago: 30,
        ..NewCustomer::active("C-001", "Old")
    })
    .await?;
    db.insert_customer(NewCustomer {
        updated_minutes_ago: 1,
        ..NewCustomer::active("C-002", "Fresh")
    })
    .await?;

    let (status, body) = get_json(app(db.pool.clone()), "/customers?sort_by=bogus&limit=0").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["Fresh", "Old"]);
    assert_eq!(body["limit"], 20);
    assert_eq!(body["total"], 2);

    db.teardown().await
}

#[tokio::test]
#[ignore]
async fn search_matches_substrings_literally() -> anyhow::Result<()> {
    let db = TestDb::new().await?;
    db.insert_customer(NewCustomer::active("C-001", "Budi Santoso")).await?;
    db.insert_customer(NewCustomer::active("C-002", "Citra 100%")).await?;
    db.insert_customer(NewCustomer {
        city: "Surabaya",
        ..NewCustomer::active("C-003", "Budiman")
    })
    .await?;

    let (_, body) = get_json(app(db.pool.clone()), "/customers?q=udi&sort_by=full_name&sort_dir=asc").await;
    assert_eq!(names(&body), vec!["Budi Santoso", "Budiman"]);

    let (_, body) = get_json(app(db.pool.clone()), "/customers?q=udi&city=Surabaya").await;
    assert_eq!(names(&body), vec!["Budiman"]);

    // '%' must not act as a wildcard
    let (_, body) = get_json(app(db.pool.clone()), "/customers?q=0%25").await;
    assert_eq!(names(&body), vec!["Citra 100%"]);

    let (_, body) = get_json(app(db.pool.clone()), "/customers?q=C-00").await;
    assert_eq!(body["total"], 3);

    db.teardown().await
}

#[tokio::test]
#[ignore]
async fn unknown_customer_profile_is_404() -> anyhow::Result<()> {
    let db = TestDb::new().await?;

    let (status, body) = get_json(app(db.pool.clone()), "/customers/NOPE/profile").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "customer not found" }));

    db.teardown().await
}

#[tokio::test]
#[ignore]
async fn profile_assembles_applications_vehicles_and_summary() -> anyhow::Result<()> {
    let db = TestDb::new().await?;
    db.insert_customer(NewCustomer::active("C-001", "Amir")).await?;
    db.insert_application("APP-1", "C-001", 40, "Rejected", "100000000.00", "9.000")
        .await?;
    db.insert_application("APP-2", "C-001", 2, "Approved", "150000000.50", "8.000")
        .await?;
    db.insert_vehicle("V-1", "C-001").await?;

    let (status, body) = get_json(app(db.pool.clone()), "/api/v1/customers/C-001/profile").await;
    assert_eq!(status, StatusCode::OK);

    // NULL columns stay null, never ""
    assert_eq!(body["customer"]["email"], Value::Null);
    assert_eq!(body["customer"]["employer_name"], Value::Null);
    assert_eq!(body["customer"]["monthly_income"], "12500000.50");

    let apps = body["credit_applications"].as_array().unwrap();
    assert_eq!(apps.len(), 2);
    assert_eq!(apps[0]["application_id"], "APP-2");
    assert_eq!(apps[0]["approval_date"], Value::Null);
    assert_eq!(apps[0]["loan_amount"], "150000000.50");
    assert_eq!(apps[0]["interest_rate"], "8.000");
    // Trailing zeros are the column's scale and must survive
    assert_eq!(apps[1]["loan_amount"], "100000000.00");
    assert_eq!(apps[1]["interest_rate"], "9.000");
    assert_eq!(apps[1]["vehicle_price"], "250000000.00");
    assert_eq!(apps[1]["outstanding_amount"], Value::Null);

    let summary = &body["summary"];
    assert_eq!(summary["total_credit_applications"], apps.len());
    assert_eq!(summary["total_vehicle_ownership"], 1);
    assert_eq!(summary["latest_application_status"], "Approved");
    assert_eq!(summary["sum_loan_amount"], "250000000.50");
    assert!(summary["avg_interest_rate"].as_str().unwrap().starts_with("8.5000"));

    assert_eq!(body["vehicle_ownership"][0]["registration_number"], Value::Null);
    assert_eq!(body["vehicle_ownership"][0]["vehicle_price"], "27500000.00");

    db.teardown().await
}

#[tokio::test]
#[ignore]
async fn profile_without_applications_omits_aggregates() -> anyhow::Result<()> {
    let db = TestDb::new().await?;
    db.insert_customer(NewCustomer {
        email: Some(""),
        ..NewCustomer::active("C-001", "Amir")
    })
    .await?;

    let (status, body) = get_json(app(db.pool.clone()), "/customers/C-001/profile").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["customer"]["email"], "");
    assert_eq!(
        body["summary"],
        json!({ "total_credit_applications": 0, "total_vehicle_ownership": 0 })
    );
    assert_eq!(body["credit_applications"], json!([]));

    db.teardown().await
}

#[tokio::test]
#[ignore]
async fn kpi_counts_and_unknown_groups() -> anyhow::Result<()> {
    let db = TestDb::new().await?;
    db.insert_customer(NewCustomer::active("C-001", "Amir")).await?;
    db.insert_customer(NewCustomer {
        gender: "Female",
        segment: "Premium",
        ..NewCustomer::active("C-002", "Citra")
    })
    .await?;
    db.insert_customer(NewCustomer {
        gender: "",
        segment: "",
        status: "Inactive",
        ..NewCustomer::active("C-003", "Anon")
    })
    .await?;
    db.insert_application("APP-1", "C-001", 1, "Approved", "1000.00", "7.5")
        .await?;
    db.insert_application("APP-2", "C-002", 1, "Pending", "2000.00", "8.5")
        .await?;
    db.insert_vehicle("V-1", "C-001").await?;

    let (status, body) = get_json(app(db.pool.clone()), "/stats/kpi").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "customers": {
                "total": 3,
                "active": 2,
                "by_gender": { "Female": 1, "Male": 1, "Unknown": 1 },
                "by_segment": { "Premium": 1, "Retail": 1, "Unknown": 1 }
            },
            "credit_applications": {
                "total": 2,
                "by_status": { "Approved": 1, "Pending": 1 }
            },
            "vehicle_ownership": { "total": 1 }
        })
    );

    db.teardown().await
}

#[tokio::test]
#[ignore]
async fn sync_health_follows_latest_audit_row() -> anyhow::Result<()> {
    let db = TestDb::new().await?;

    let (status, body) = get_json(app(db.pool.clone()), "/sync/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "warn");
    assert_eq!(body["sla_target_seconds"], 10);
    assert_eq!(body["lag_seconds"], Value::Null);
    assert_eq!(body["last_error"], Value::Null);

    db.insert_sync_audit(Some(15), Some(""), 30).await?;
    let (_, body) = get_json(app(db.pool.clone()), "/sync/health").await;
    assert_eq!(body["status"], "warn");
    assert_eq!(body["lag_seconds"], 15);
    assert_eq!(body["tool_name"], "debezium");

    db.insert_sync_audit(Some(5), None, 20).await?;
    let (_, body) = get_json(app(db.pool.clone()), "/sync/health").await;
    assert_eq!(body["status"], "ok");

    db.insert_sync_audit(Some(1), Some("connector task failed"), 10).await?;
    let (_, body) = get_json(app(db.pool.clone()), "/sync/health").await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["last_error"], "connector task failed");

    db.teardown().await
}

#[tokio::test]
#[ignore]
async fn health_is_ok_against_live_database() -> anyhow::Result<()> {
    let db = TestDb::new().await?;

    let (status, body) = get_json(app(db.pool.clone()), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["db"], "ok");

    db.teardown().await
}
