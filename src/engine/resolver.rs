//! Reference resolution: from a citizen to the case worker responsible for
//! them, and to the engagement a follow-up task is placed on.
//!
//! Both searches walk the reference tree of the citizen's pathway view.
//! The tree comes in more than one shape depending on how the citizen was
//! onboarded, so each search tries a fixed list of patterns in priority
//! order and stops at the first non-empty result.

use crate::db::EmployeeLookup;
use crate::error::Result;
use crate::model::{Citizen, Employee, Engagement, Reference};
use crate::nexus::{EmployeeDirectory, EngagementFilter, PathwayStore};
use std::sync::Arc;
use tracing::debug;

/// Pathway group names searched by the resolver.
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Group whose professional reference names the case worker.
    pub case_worker_group: String,
    /// Groups searched for engagements, highest priority first.
    pub engagement_groups: Vec<String>,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            case_worker_group: "Børn og Unge Grundforløb".to_string(),
            engagement_groups: vec![
                "Børn og Unge Grundforløb".to_string(),
                "Socialfagligt grundforløb".to_string(),
            ],
        }
    }
}

impl ResolverSettings {
    /// Case worker patterns: below an intermediate pathway, then directly on the group.
    fn case_worker_patterns(&self) -> [String; 2] {
        let group = &self.case_worker_group;
        [
            format!("/{group}/*/professionalReference"),
            format!("/{group}/professionalReference"),
        ]
    }

    fn engagement_pattern(group: &str) -> String {
        format!("/{group}/*/Indsatser/basketGrantReference")
    }
}

pub struct ReferenceResolver {
    pathways: Arc<dyn PathwayStore>,
    lookup: Arc<dyn EmployeeLookup>,
    employees: Arc<dyn EmployeeDirectory>,
    settings: ResolverSettings,
}

impl ReferenceResolver {
    pub fn new(
        pathways: Arc<dyn PathwayStore>,
        lookup: Arc<dyn EmployeeLookup>,
        employees: Arc<dyn EmployeeDirectory>,
    ) -> Self {
        Self::with_settings(pathways, lookup, employees, ResolverSettings::default())
    }

    pub fn with_settings(
        pathways: Arc<dyn PathwayStore>,
        lookup: Arc<dyn EmployeeLookup>,
        employees: Arc<dyn EmployeeDirectory>,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            pathways,
            lookup,
            employees,
            settings,
        }
    }

    /// The citizen's reference tree, or `None` if they have no pathway view.
    async fn reference_tree(&self, citizen: &Citizen) -> Result<Option<Vec<Reference>>> {
        let Some(view) = self.pathways.pathway_view(citizen).await? else {
            debug!("citizen has no pathway view");
            return Ok(None);
        };
        Ok(Some(self.pathways.references(&view).await?))
    }

    /// Find the responsible case worker.
    ///
    /// The professional reference only yields an activity id, so the
    /// employee is found in two further hops: activity id to initials in
    /// the Nexus database, then initials to employee in the API.
    pub async fn resolve_case_worker(&self, citizen: &Citizen) -> Result<Option<Employee>> {
        let Some(tree) = self.reference_tree(citizen).await? else {
            return Ok(None);
        };

        let mut matches = Vec::new();
        for pattern in self.settings.case_worker_patterns() {
            matches = self.pathways.filter_by_path(&tree, &pattern, true);
            if !matches.is_empty() {
                debug!(%pattern, count = matches.len(), "professional references found");
                break;
            }
        }
        let Some(reference) = matches.first() else {
            return Ok(None);
        };

        let Some(assignment) = self.pathways.resolve_professional(reference).await? else {
            return Ok(None);
        };
        let Some(activity_id) = assignment.activity_id() else {
            debug!("professional assignment has no activity id");
            return Ok(None);
        };

        let rows = self.lookup.find_employee_by_activity_id(activity_id).await?;
        let Some(row) = rows.first() else {
            debug!(activity_id, "no employee for activity id");
            return Ok(None);
        };

        self.employees
            .find_employee_by_initials(&row.primary_identifier)
            .await
    }

    /// Find the active engagement a task should be placed on.
    pub async fn resolve_engagement(&self, citizen: &Citizen) -> Result<Option<Engagement>> {
        let Some(tree) = self.reference_tree(citizen).await? else {
            return Ok(None);
        };

        for group in &self.settings.engagement_groups {
            let pattern = ResolverSettings::engagement_pattern(group);
            let candidates = self.pathways.filter_by_path(&tree, &pattern, true);
            let candidates = self
                .pathways
                .filter_engagements(candidates, EngagementFilter::TASK_PLACEMENT);

            let Some(reference) = candidates.first() else {
                continue;
            };
            if let Some(engagement) = self.pathways.resolve_engagement(reference).await? {
                debug!(%group, engagement_id = engagement.id, "engagement found");
                return Ok(Some(engagement));
            }
        }

        Ok(None)
    }
}
