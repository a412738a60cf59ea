//! Metric instrument factories for municipality-check.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! All instruments are created lazily from the `"municipality-check"` meter.

use opentelemetry::metrics::{Counter, Histogram, Meter};

/// Returns the shared meter for municipality-check instruments.
fn meter() -> Meter {
    opentelemetry::global::meter("municipality-check")
}

/// Counter: work items offered to the queue.
/// Labels: `result` ("ok" | "duplicate").
pub fn work_enqueued() -> Counter<u64> {
    meter()
        .u64_counter("municipality.work.enqueued")
        .with_description("Number of work items offered to the queue")
        .build()
}

/// Counter: work item state transitions.
/// Labels: `from`, `to`.
pub fn work_state_transitions() -> Counter<u64> {
    meter()
        .u64_counter("municipality.work.state_transitions")
        .with_description("Number of work item state transitions")
        .build()
}

/// Counter: queue-level operations (add, clear, claim).
/// Labels: `operation`.
pub fn queue_operations() -> Counter<u64> {
    meter()
        .u64_counter("municipality.queue.operations")
        .with_description("Number of queue operations")
        .build()
}

/// Counter: follow-up tasks created in Nexus.
pub fn tasks_created() -> Counter<u64> {
    meter()
        .u64_counter("municipality.tasks.created")
        .with_description("Number of follow-up tasks created")
        .build()
}

/// Counter: report records written.
/// Labels: `report_id`.
pub fn reports_emitted() -> Counter<u64> {
    meter()
        .u64_counter("municipality.reports.emitted")
        .with_description("Number of report records written")
        .build()
}

/// Counter: tracking events.
/// Labels: `process`, `outcome` ("task" | "partial_task").
pub fn tracking_events() -> Counter<u64> {
    meter()
        .u64_counter("municipality.tracking.events")
        .with_description("Number of tracking events recorded")
        .build()
}

/// Histogram: operation duration in milliseconds.
/// Labels: `operation`.
pub fn operation_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("municipality.operation.duration_ms")
        .with_description("Operation duration in milliseconds")
        .with_unit("ms")
        .build()
}
