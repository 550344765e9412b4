use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

use crate::config::Config;

pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .min_connections(config.db_min_connections)
            .max_lifetime(config.conn_max_lifetime())
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await?;

        // Fail startup early if the server accepts connections but not statements
        sqlx::query("SELECT 1").execute(&pool).await?;

        Ok(Self { pool })
    }
}
