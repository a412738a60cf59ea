//! Queue driver: claims items one at a time and retires each exactly once.

use super::eligibility::{Classification, classify};
use super::orchestrator::{HandleOutcome, TaskOrchestrator};
use crate::db::WorkQueue;
use crate::error::Result;
use crate::model::Citizen;
use crate::model::work::WorkItem;
use crate::nexus::CitizenStore;
use crate::telemetry::metrics;
use crate::telemetry::work::{record_outcome, start_work_span};
use chrono::TimeDelta;
use opentelemetry::KeyValue;
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, error, info, warn};

/// In-progress items untouched this many seconds belong to an interrupted run.
pub const DEFAULT_STALE_AFTER_SECS: i64 = 60 * 60;

const ABANDONED_MESSAGE: &str = "abandoned in progress by an interrupted run";

/// Counts from one pass over the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriveSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// What processing one item led to, before retirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemOutcome {
    Eligible,
    Handled(HandleOutcome),
}

impl ItemOutcome {
    fn as_str(self) -> &'static str {
        match self {
            ItemOutcome::Eligible => "eligible",
            ItemOutcome::Handled(HandleOutcome::TaskCreated) => "task_created",
            ItemOutcome::Handled(HandleOutcome::AlreadyHandled) => "already_handled",
            ItemOutcome::Handled(HandleOutcome::MissingCaseWorker) => "missing_case_worker",
            ItemOutcome::Handled(HandleOutcome::MissingEngagement) => "missing_engagement",
        }
    }
}

pub struct QueueDriver {
    queue: Arc<dyn WorkQueue>,
    citizens: Arc<dyn CitizenStore>,
    orchestrator: TaskOrchestrator,
    stale_after: TimeDelta,
}

impl QueueDriver {
    pub fn new(
        queue: Arc<dyn WorkQueue>,
        citizens: Arc<dyn CitizenStore>,
        orchestrator: TaskOrchestrator,
    ) -> Self {
        Self {
            queue,
            citizens,
            orchestrator,
            stale_after: TimeDelta::seconds(DEFAULT_STALE_AFTER_SECS),
        }
    }

    /// Age after which an in-progress item is considered abandoned.
    pub fn with_stale_after(mut self, stale_after: TimeDelta) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// Drain the queue. Per-item errors fail the item and processing
    /// continues; queue errors abort the pass.
    ///
    /// Items left in progress by an earlier, interrupted run are failed
    /// first so they can be queued again.
    pub async fn run(&self) -> Result<DriveSummary> {
        let mut summary = DriveSummary::default();

        let abandoned = self
            .queue
            .fail_stale(self.stale_after, ABANDONED_MESSAGE)
            .await?;
        if abandoned > 0 {
            warn!(abandoned, "failed items abandoned by an earlier run");
        }

        while let Some(item) = self.queue.claim_next().await? {
            let span = start_work_span(item.id, &item.reference);
            let start = Instant::now();

            let result = self.process(&item).instrument(span.clone()).await;
            summary.processed += 1;

            match result {
                Ok(outcome) => match self.queue.complete(item.id).await {
                    Ok(()) => {
                        record_outcome(&span, outcome.as_str());
                        summary.succeeded += 1;
                    }
                    Err(e) => {
                        span.in_scope(|| {
                            error!(reference = %item.reference, "error completing item: {e}");
                        });
                        // A second queue error ends the run; the item is
                        // then recovered as stale by the next one.
                        self.queue
                            .fail(item.id, &format!("could not mark completed: {e}"))
                            .await?;
                        record_outcome(&span, "failed");
                        summary.failed += 1;
                    }
                },
                Err(e) => {
                    span.in_scope(|| {
                        error!(reference = %item.reference, "error processing item: {e}");
                    });
                    self.queue.fail(item.id, &e.to_string()).await?;
                    record_outcome(&span, "failed");
                    summary.failed += 1;
                }
            }

            metrics::operation_duration_ms().record(
                start.elapsed().as_millis() as f64,
                &[KeyValue::new("operation", "work.process")],
            );
        }

        info!(
            processed = summary.processed,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "queue drained"
        );
        Ok(summary)
    }

    /// Classify the live citizen behind an item and hand deficient ones on.
    async fn process(&self, item: &WorkItem) -> Result<ItemOutcome> {
        let queued: Citizen = serde_json::from_value(item.data.clone())?;
        let citizen = self.citizens.refresh_citizen(&queued).await?;

        match classify(&citizen) {
            Classification::Eligible => Ok(ItemOutcome::Eligible),
            Classification::Missing(kind) => {
                info!(%kind, "municipality missing");
                let outcome = self.orchestrator.handle(&citizen, kind).await?;
                Ok(ItemOutcome::Handled(outcome))
            }
        }
    }
}
