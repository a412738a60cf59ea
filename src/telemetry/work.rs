//! Work processing span helpers.

use crate::model::work::WorkId;
use tracing::Span;

/// Start a span for processing one queue item.
///
/// The `work.outcome` field is declared empty and is filled by
/// [`record_outcome`] once the item is retired.
pub fn start_work_span(work_id: WorkId, reference: &str) -> Span {
    tracing::info_span!(
        "work.process",
        "work.id" = %work_id,
        "work.reference" = reference,
        "work.outcome" = tracing::field::Empty,
    )
}

/// Record how the item ended on its span.
pub fn record_outcome(span: &Span, outcome: &str) {
    span.record("work.outcome", outcome);
    span.in_scope(|| {
        tracing::debug!(outcome, "work item retired");
    });
}
