//! Database connection pools, migrations, and health check.
//!
//! [`Db`] owns the process's own Postgres database: the work queue, the
//! report log and tracking events. [`NexusDatabase`] is a separate,
//! read-only connection to the Nexus replica.

pub mod employees;
pub mod queue;
pub mod reporting;
pub mod tracking;

use crate::error::Result;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub use employees::{EmployeeLookup, EmployeeRow, NexusDatabase};
pub use queue::{SubmitResult, WorkQueue};
pub use reporting::{Report, ReportSink};
pub use tracking::{Tracker, TrackingOutcome};

/// Database handle. Owns the connection pool shared across all modules.
pub struct Db {
    pool: PgPool,
}

impl Db {
    /// Connect to Postgres and create a connection pool.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    /// Run all pending migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| crate::error::Error::Other(format!("migration failed: {e}")))?;
        Ok(())
    }

    /// Run `SELECT 1` against the pool.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }
}
