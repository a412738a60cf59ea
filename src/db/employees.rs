//! Employee lookup against the Nexus database replica.
//!
//! Professional references in a pathway only carry an activity id. The
//! replica maps that id to the professional's primary identifier (their
//! initials), which the REST API can search on.

use crate::error::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct EmployeeRow {
    pub primary_identifier: String,
}

#[async_trait]
pub trait EmployeeLookup: Send + Sync {
    async fn find_employee_by_activity_id(&self, activity_id: &str) -> Result<Vec<EmployeeRow>>;
}

/// Read-only handle on the Nexus replica.
pub struct NexusDatabase {
    pool: PgPool,
}

impl NexusDatabase {
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl EmployeeLookup for NexusDatabase {
    async fn find_employee_by_activity_id(&self, activity_id: &str) -> Result<Vec<EmployeeRow>> {
        let rows = sqlx::query_as::<_, EmployeeRow>(
            "SELECT p.primary_identifier
             FROM professional p
             JOIN activity_identifier a ON a.professional_id = p.id
             WHERE a.activity_id = $1 AND p.primary_identifier IS NOT NULL",
        )
        .bind(activity_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
