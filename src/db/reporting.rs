//! Report sink: one structured record per handled citizen.

use crate::error::Result;
use crate::telemetry::metrics;
use async_trait::async_trait;
use opentelemetry::KeyValue;
use serde_json::json;

pub const REPORT_ID: &str = "kontrol_af_betalings_og_handlekommune";
pub const REPORT_GROUP: &str = "Borgere";

/// A diagnostic record for the process report.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub report_id: String,
    pub group: String,
    pub payload: serde_json::Value,
}

impl Report {
    /// Citizen report row: national ID plus the action taken or the reason none was.
    pub fn citizen(identifier: &str, handling: &str) -> Self {
        Self {
            report_id: REPORT_ID.to_string(),
            group: REPORT_GROUP.to_string(),
            payload: json!({
                "Cpr": identifier,
                "Handling": handling,
            }),
        }
    }

    pub fn handling(&self) -> Option<&str> {
        self.payload.get("Handling").and_then(|v| v.as_str())
    }
}

#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn report(&self, report: Report) -> Result<()>;
}

#[async_trait]
impl ReportSink for super::Db {
    async fn report(&self, report: Report) -> Result<()> {
        sqlx::query("INSERT INTO reports (report_id, report_group, payload) VALUES ($1, $2, $3)")
            .bind(&report.report_id)
            .bind(&report.group)
            .bind(&report.payload)
            .execute(self.pool())
            .await?;
        metrics::reports_emitted().add(1, &[KeyValue::new("report_id", report.report_id)]);
        Ok(())
    }
}
