//! Follow-up tasks attached to engagements.

use super::Employee;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Task type used for the municipality follow-up. At most one per engagement.
pub const MUNICIPALITY_TASK_TYPE: &str = "Angiv handle- og betalekommune";
pub const MUNICIPALITY_TASK_TITLE: &str = "HUSK - opret stamdata på handle- og betalingskommune.";
/// Days from start until the task falls due.
pub const MUNICIPALITY_TASK_DUE_DAYS: u64 = 3;

/// A task as it appears in an engagement's task history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "type")]
    pub task_type: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

/// Parameters for creating a task.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    #[serde(rename = "type")]
    pub task_type: String,
    pub title: String,
    pub responsible_organization: String,
    pub assignee: Employee,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
}

impl NewTask {
    /// The municipality follow-up task, starting `start` and due three days later.
    pub fn municipality_followup(
        responsible_organization: impl Into<String>,
        assignee: Employee,
        start: NaiveDate,
    ) -> Self {
        Self {
            task_type: MUNICIPALITY_TASK_TYPE.to_string(),
            title: MUNICIPALITY_TASK_TITLE.to_string(),
            responsible_organization: responsible_organization.into(),
            assignee,
            start_date: start,
            due_date: start + Days::new(MUNICIPALITY_TASK_DUE_DAYS),
        }
    }
}

impl Task {
    pub fn is_municipality_followup(&self) -> bool {
        self.task_type == MUNICIPALITY_TASK_TYPE
    }
}
