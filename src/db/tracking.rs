//! Tracking sink: counts handled citizens per process for the automation dashboard.

use crate::error::Result;
use crate::telemetry::metrics;
use async_trait::async_trait;
use opentelemetry::KeyValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingOutcome {
    /// The citizen was fully handled: a task was created.
    FullSuccess,
    /// The citizen was reported but needs manual handling.
    PartialOutcome,
}

impl TrackingOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            TrackingOutcome::FullSuccess => "task",
            TrackingOutcome::PartialOutcome => "partial_task",
        }
    }
}

#[async_trait]
pub trait Tracker: Send + Sync {
    async fn track(&self, process_name: &str, outcome: TrackingOutcome) -> Result<()>;

    async fn track_full_success(&self, process_name: &str) -> Result<()> {
        self.track(process_name, TrackingOutcome::FullSuccess).await
    }

    async fn track_partial_outcome(&self, process_name: &str) -> Result<()> {
        self.track(process_name, TrackingOutcome::PartialOutcome).await
    }
}

#[async_trait]
impl Tracker for super::Db {
    async fn track(&self, process_name: &str, outcome: TrackingOutcome) -> Result<()> {
        sqlx::query("INSERT INTO tracking_events (process_name, outcome) VALUES ($1, $2)")
            .bind(process_name)
            .bind(outcome.as_str())
            .execute(self.pool())
            .await?;
        metrics::tracking_events().add(
            1,
            &[
                KeyValue::new("process", process_name.to_string()),
                KeyValue::new("outcome", outcome.as_str()),
            ],
        );
        Ok(())
    }
}
