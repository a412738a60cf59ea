//! Work queue: enqueue with dedup, claim, and retire.
//!
//! Items live in the `work_items` table. A partial unique index on
//! `reference WHERE state = 'new'` keeps at most one pending item per
//! citizen; claims use `FOR UPDATE SKIP LOCKED`.

use crate::error::{Error, Result};
use crate::model::work::*;
use crate::telemetry::metrics;
use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use opentelemetry::KeyValue;
use uuid::Uuid;

/// Result of enqueueing work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitResult {
    /// New item created in state `New`.
    Created(WorkId),
    /// A `New` item with the same reference already exists.
    Duplicate(WorkId),
}

#[async_trait]
pub trait WorkQueue: Send + Sync {
    async fn add_item(&self, item: NewWorkItem) -> Result<SubmitResult>;

    async fn get_items_by_reference(&self, reference: &str, state: State)
    -> Result<Vec<WorkItem>>;

    /// Delete every item in `state`. Returns the number removed.
    async fn clear(&self, state: State) -> Result<u64>;

    /// Claim the oldest `New` item, moving it to `InProgress`.
    async fn claim_next(&self) -> Result<Option<WorkItem>>;

    /// `InProgress` → `Completed`.
    async fn complete(&self, id: WorkId) -> Result<()>;

    /// `InProgress` → `Failed`, recording the reason.
    async fn fail(&self, id: WorkId, reason: &str) -> Result<()>;

    /// Fail every `InProgress` item untouched for longer than `older_than`.
    /// Returns the number failed.
    async fn fail_stale(&self, older_than: TimeDelta, reason: &str) -> Result<u64>;
}

/// Validate a state transition, returning an error if disallowed.
fn validate_transition(from: State, to: State) -> Result<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(Error::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

fn record_queue_operation(operation: &'static str) {
    metrics::queue_operations().add(1, &[KeyValue::new("operation", operation)]);
}

fn record_transition(from: State, to: State) {
    metrics::work_state_transitions().add(
        1,
        &[
            KeyValue::new("from", from.as_str()),
            KeyValue::new("to", to.as_str()),
        ],
    );
}

const COLUMNS: &str = "id, reference, data, state, message, created_at, updated_at, resolved_at";

impl super::Db {
    /// Retire an in-progress item with optimistic concurrency on its state.
    async fn retire(&self, id: WorkId, to: State, message: Option<&str>) -> Result<()> {
        validate_transition(State::InProgress, to)?;

        let rows_affected = sqlx::query(
            "UPDATE work_items SET state = $1, message = $2, updated_at = now(), resolved_at = now()
             WHERE id = $3 AND state = 'in_progress'",
        )
        .bind(to.as_str())
        .bind(message)
        .bind(id.0)
        .execute(self.pool())
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(Error::InvalidTransition {
                from: State::InProgress.to_string(),
                to: to.to_string(),
            });
        }

        record_transition(State::InProgress, to);
        Ok(())
    }
}

#[async_trait]
impl WorkQueue for super::Db {
    async fn add_item(&self, item: NewWorkItem) -> Result<SubmitResult> {
        let id = Uuid::new_v4();

        let inserted: Option<(Uuid,)> = sqlx::query_as(
            "INSERT INTO work_items (id, reference, data, state)
             VALUES ($1, $2, $3, 'new')
             ON CONFLICT (reference) WHERE state = 'new'
             DO NOTHING
             RETURNING id",
        )
        .bind(id)
        .bind(&item.reference)
        .bind(&item.data)
        .fetch_optional(self.pool())
        .await?;

        if inserted.is_some() {
            record_queue_operation("add");
            metrics::work_enqueued().add(1, &[KeyValue::new("result", "ok")]);
            return Ok(SubmitResult::Created(WorkId(id)));
        }

        // Conflict: a pending item for this citizen exists.
        let existing: (Uuid,) =
            sqlx::query_as("SELECT id FROM work_items WHERE reference = $1 AND state = 'new'")
                .bind(&item.reference)
                .fetch_one(self.pool())
                .await?;
        metrics::work_enqueued().add(1, &[KeyValue::new("result", "duplicate")]);
        Ok(SubmitResult::Duplicate(WorkId(existing.0)))
    }

    async fn get_items_by_reference(
        &self,
        reference: &str,
        state: State,
    ) -> Result<Vec<WorkItem>> {
        let rows: Vec<WorkItemRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM work_items WHERE reference = $1 AND state = $2 ORDER BY created_at"
        ))
        .bind(reference)
        .bind(state.as_str())
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(WorkItemRow::try_into_work_item).collect()
    }

    async fn clear(&self, state: State) -> Result<u64> {
        let removed = sqlx::query("DELETE FROM work_items WHERE state = $1")
            .bind(state.as_str())
            .execute(self.pool())
            .await?
            .rows_affected();
        record_queue_operation("clear");
        Ok(removed)
    }

    async fn claim_next(&self) -> Result<Option<WorkItem>> {
        validate_transition(State::New, State::InProgress)?;

        let row: Option<WorkItemRow> = sqlx::query_as(&format!(
            "UPDATE work_items SET state = 'in_progress', updated_at = now()
             WHERE id = (
                 SELECT id FROM work_items WHERE state = 'new'
                 ORDER BY created_at, id
                 LIMIT 1
                 FOR UPDATE SKIP LOCKED
             )
             RETURNING {COLUMNS}"
        ))
        .fetch_optional(self.pool())
        .await?;

        record_queue_operation(if row.is_some() { "claim" } else { "claim_empty" });

        match row {
            Some(row) => {
                record_transition(State::New, State::InProgress);
                Ok(Some(row.try_into_work_item()?))
            }
            None => Ok(None),
        }
    }

    async fn complete(&self, id: WorkId) -> Result<()> {
        self.retire(id, State::Completed, None).await
    }

    async fn fail(&self, id: WorkId, reason: &str) -> Result<()> {
        self.retire(id, State::Failed, Some(reason)).await
    }

    async fn fail_stale(&self, older_than: TimeDelta, reason: &str) -> Result<u64> {
        validate_transition(State::InProgress, State::Failed)?;

        let failed = sqlx::query(
            "UPDATE work_items SET state = 'failed', message = $1, updated_at = now(), resolved_at = now()
             WHERE state = 'in_progress' AND updated_at <= $2",
        )
        .bind(reason)
        .bind(Utc::now() - older_than)
        .execute(self.pool())
        .await?
        .rows_affected();

        record_queue_operation("fail_stale");
        metrics::work_state_transitions().add(
            failed,
            &[
                KeyValue::new("from", State::InProgress.as_str()),
                KeyValue::new("to", State::Failed.as_str()),
            ],
        );
        Ok(failed)
    }
}

/// Internal row type for sqlx::FromRow.
#[derive(sqlx::FromRow)]
struct WorkItemRow {
    id: Uuid,
    reference: String,
    data: serde_json::Value,
    state: String,
    message: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
    resolved_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl WorkItemRow {
    fn try_into_work_item(self) -> Result<WorkItem> {
        Ok(WorkItem {
            id: WorkId(self.id),
            reference: self.reference,
            data: self.data,
            state: self.state.parse()?,
            message: self.message,
            created_at: self.created_at,
            updated_at: self.updated_at,
            resolved_at: self.resolved_at,
        })
    }
}
