//! Task orchestration for a deficient citizen.
//!
//! Either creates the municipality follow-up task on the citizen's active
//! engagement, or reports why it could not. Each terminal branch writes
//! exactly one report and one tracking event, except when the task already
//! exists, which is a silent no-op.

use super::eligibility::ErrorKind;
use super::resolver::ReferenceResolver;
use crate::db::{Report, ReportSink, Tracker};
use crate::error::{Error, Result};
use crate::model::{Citizen, NewTask};
use crate::nexus::TaskStore;
use crate::telemetry::metrics;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info};

/// Process name used for tracking.
pub const PROCESS_NAME: &str = "Kontrol af betalings- og handlekommune";

pub const NO_CASE_WORKER_HANDLING: &str =
    "Borger har mangler i stamdata, men ingen ansvarlig sagsbehandler at lægge opgave til.";
pub const NO_ENGAGEMENT_HANDLING: &str = "Borger har ingen indsatser at oprette opgave på.";

/// How a citizen was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    TaskCreated,
    /// A follow-up task exists from an earlier run.
    AlreadyHandled,
    MissingCaseWorker,
    MissingEngagement,
}

pub struct TaskOrchestrator {
    resolver: ReferenceResolver,
    tasks: Arc<dyn TaskStore>,
    reports: Arc<dyn ReportSink>,
    tracker: Arc<dyn Tracker>,
    today: fn() -> NaiveDate,
}

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

impl TaskOrchestrator {
    pub fn new(
        resolver: ReferenceResolver,
        tasks: Arc<dyn TaskStore>,
        reports: Arc<dyn ReportSink>,
        tracker: Arc<dyn Tracker>,
    ) -> Self {
        Self {
            resolver,
            tasks,
            reports,
            tracker,
            today: local_today,
        }
    }

    /// Override the clock used for task start dates.
    pub fn with_today(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    async fn report_partial(&self, identifier: &str, handling: &str) -> Result<()> {
        self.reports
            .report(Report::citizen(identifier, handling))
            .await?;
        self.tracker.track_partial_outcome(PROCESS_NAME).await
    }

    pub async fn handle(&self, citizen: &Citizen, kind: ErrorKind) -> Result<HandleOutcome> {
        let identifier = citizen.patient_identifier.identifier.as_str();

        let Some(case_worker) = self.resolver.resolve_case_worker(citizen).await? else {
            info!("no responsible case worker, reporting only");
            self.report_partial(identifier, NO_CASE_WORKER_HANDLING)
                .await?;
            return Ok(HandleOutcome::MissingCaseWorker);
        };

        let Some(engagement) = self.resolver.resolve_engagement(citizen).await? else {
            info!("no engagement to place task on, reporting only");
            self.report_partial(identifier, NO_ENGAGEMENT_HANDLING)
                .await?;
            return Ok(HandleOutcome::MissingEngagement);
        };

        let history = self.tasks.task_history(&engagement).await?;
        if history.iter().any(|t| t.is_municipality_followup()) {
            debug!(engagement_id = engagement.id, "follow-up task already exists");
            return Ok(HandleOutcome::AlreadyHandled);
        }

        let organization = case_worker
            .primary_organization_name()
            .ok_or(Error::MissingField("primaryOrganization"))?
            .to_string();
        let task = NewTask::municipality_followup(organization, case_worker, (self.today)());
        self.tasks.create_task(&engagement, &task).await?;
        metrics::tasks_created().add(1, &[]);
        info!(
            engagement_id = engagement.id,
            due = %task.due_date,
            "follow-up task created"
        );

        self.reports
            .report(Report::citizen(identifier, kind.description()))
            .await?;
        self.tracker.track_full_success(PROCESS_NAME).await?;
        Ok(HandleOutcome::TaskCreated)
    }
}
