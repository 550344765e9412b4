//! Per-request deadlines for storage reads.
//!
//! A handler creates one [`Deadline`] when it starts and hands it to every store call, so all
//! reads of a request share the same absolute cut-off instead of each getting a fresh budget.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

use crate::errors::AppError;

/// Per-endpoint read budgets.
#[derive(Debug, Clone, Copy)]
pub struct Deadlines {
    pub health: Duration,
    pub list: Duration,
    /// Cap for the best-effort total of the list, inside the list budget.
    pub list_count: Duration,
    pub profile: Duration,
    pub kpi: Duration,
    pub sync_health: Duration,
}

impl Default for Deadlines {
    fn default() -> Self {
        Self {
            health: Duration::from_secs(2),
            list: Duration::from_secs(5),
            list_count: Duration::from_secs(2),
            profile: Duration::from_secs(8),
            kpi: Duration::from_secs(5),
            sync_health: Duration::from_secs(3),
        }
    }
}

/// Absolute cut-off shared by all reads of one request.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
            budget,
        }
    }

    /// A tighter deadline for a secondary read. Never extends past `self`.
    pub fn within(&self, budget: Duration) -> Self {
        Self {
            at: self.at.min(Instant::now() + budget),
            budget: self.budget.min(budget),
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.at
    }

    /// Runs a read under the deadline.
    ///
    /// On expiry the query future is dropped, which hands its connection back to the pool
    /// (or closes it if it was mid-statement).
    pub async fn run<T, F>(&self, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout_at(self.at, fut).await {
            Ok(result) => result.map_err(AppError::DatabaseError),
            Err(_) => Err(AppError::DeadlineExceeded(self.budget)),
        }
    }
}
