//! Nexus collaborators.
//!
//! The engine talks to Nexus only through the traits below, so it can run
//! against [`NexusClient`] in production and in-memory doubles in tests.
//! "Not found" is `Ok(None)`; `Err` is reserved for transport and decode
//! faults.

pub mod client;
pub mod tree;

use crate::error::Result;
use crate::model::{
    Citizen, Employee, Engagement, NewTask, Organization, PathwayView, ProfessionalAssignment,
    Reference, Task,
};
use async_trait::async_trait;

pub use client::NexusClient;
pub use tree::EngagementFilter;

/// Organizations and their citizen rosters.
#[async_trait]
pub trait OrganizationDirectory: Send + Sync {
    async fn find_organization_by_name(&self, name: &str) -> Result<Option<Organization>>;

    async fn list_citizens(&self, organization: &Organization) -> Result<Vec<Citizen>>;
}

#[async_trait]
pub trait CitizenStore: Send + Sync {
    /// Re-fetch the live citizen behind a (possibly stale) document.
    async fn refresh_citizen(&self, citizen: &Citizen) -> Result<Citizen>;
}

/// Pathway views, their reference trees, and reference targets.
#[async_trait]
pub trait PathwayStore: Send + Sync {
    async fn pathway_view(&self, citizen: &Citizen) -> Result<Option<PathwayView>>;

    async fn references(&self, view: &PathwayView) -> Result<Vec<Reference>>;

    async fn resolve_professional(
        &self,
        reference: &Reference,
    ) -> Result<Option<ProfessionalAssignment>>;

    async fn resolve_engagement(&self, reference: &Reference) -> Result<Option<Engagement>>;

    fn filter_by_path(
        &self,
        references: &[Reference],
        pattern: &str,
        active_pathways_only: bool,
    ) -> Vec<Reference> {
        tree::filter_by_path(references, pattern, active_pathways_only)
            .into_iter()
            .cloned()
            .collect()
    }

    fn filter_engagements(
        &self,
        references: Vec<Reference>,
        filter: EngagementFilter,
    ) -> Vec<Reference> {
        tree::filter_engagement_references(references, filter)
    }
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn task_history(&self, engagement: &Engagement) -> Result<Vec<Task>>;

    async fn create_task(&self, engagement: &Engagement, task: &NewTask) -> Result<()>;
}

#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    async fn find_employee_by_initials(&self, initials: &str) -> Result<Option<Employee>>;
}
