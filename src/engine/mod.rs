//! Processing pipeline: populate the queue, then drain it.
//!
//! [`QueuePopulator`] fills the queue from organization rosters.
//! [`QueueDriver`] claims items one at a time, runs the municipality checks
//! ([`eligibility`]) and hands deficient citizens to the
//! [`TaskOrchestrator`], which uses the [`ReferenceResolver`] to find a case
//! worker and an engagement.

pub mod driver;
pub mod eligibility;
pub mod orchestrator;
pub mod populator;
pub mod resolver;

pub use driver::{DriveSummary, QueueDriver};
pub use eligibility::{Classification, ErrorKind, classify};
pub use orchestrator::{HandleOutcome, TaskOrchestrator};
pub use populator::{PopulateSummary, QueuePopulator};
pub use resolver::{ReferenceResolver, ResolverSettings};
