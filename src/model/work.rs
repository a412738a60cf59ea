//! Work queue items.
//!
//! A work item is one citizen to check. It has identity (id + reference),
//! a JSON payload (the citizen document at queue time), and lifecycle state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Work Item
// ---------------------------------------------------------------------------

/// A queued citizen check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: WorkId,

    /// Normalized national ID. Unique among `New` items.
    pub reference: String,

    /// Citizen document as it was when queued. May be stale by the time
    /// the item is processed.
    pub data: serde_json::Value,

    pub state: State,

    /// Failure reason, set when the item ends `Failed`.
    pub message: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Newtype for work item IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkId(pub Uuid);

impl WorkId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for WorkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Short display: first 8 chars of UUID
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

impl Default for WorkId {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Lifecycle state of a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    /// Queued, not yet picked up.
    New,
    /// Claimed by the driver.
    InProgress,
    /// Processed. Terminal.
    Completed,
    /// Processing raised an error; left for manual follow-up. Terminal.
    Failed,
}

impl State {
    /// Can transition from self to `to`?
    pub fn can_transition_to(self, to: State) -> bool {
        use State::*;
        matches!(
            (self, to),
            (New, InProgress) | (InProgress, Completed) | (InProgress, Failed)
        )
    }

    /// Is this a terminal state?
    pub fn is_terminal(self) -> bool {
        matches!(self, State::Completed | State::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            State::New => "new",
            State::InProgress => "in_progress",
            State::Completed => "completed",
            State::Failed => "failed",
        }
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for State {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(State::New),
            "in_progress" => Ok(State::InProgress),
            "completed" => Ok(State::Completed),
            "failed" => Ok(State::Failed),
            other => Err(crate::error::Error::Other(format!(
                "unknown work item state: {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// A work item to enqueue.
#[derive(Debug, Clone)]
pub struct NewWorkItem {
    pub reference: String,
    pub data: serde_json::Value,
}

impl NewWorkItem {
    pub fn new(reference: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            reference: reference.into(),
            data,
        }
    }
}
