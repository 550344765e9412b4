//! Utility to inspect the database schema and print the structure of the tables the API reads.

use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::env;

const API_TABLES: [&str; 4] = [
    "customers",
    "credit_applications",
    "vehicle_ownership",
    "sync_audit",
];

/// Main entry point for the schema inspection utility.
///
/// Connects to the database and lists the columns of every table the API depends on, flagging
/// tables that are missing from the current search path.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let database_url = env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await?;

    for table in API_TABLES {
        let columns: Vec<(String, String, String)> = sqlx::query_as(
            "SELECT column_name::text, data_type::text, is_nullable::text \
             FROM information_schema.columns \
             WHERE table_name = $1 AND table_schema = ANY(current_schemas(false)) \
             ORDER BY ordinal_position",
        )
        .bind(table)
        .fetch_all(&pool)
        .await?;

        if columns.is_empty() {
            println!("- {} (missing)", table);
            println!();
            continue;
        }

        println!("- {}", table);
        for (col, type_, nullable) in columns {
            let marker = if nullable == "YES" { " NULL" } else { "" };
            println!("  - {}: {}{}", col, type_, marker);
        }
        println!();
    }

    Ok(())
}
