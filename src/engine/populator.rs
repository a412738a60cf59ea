//! Queue population from organization rosters.

use crate::config::RuleSet;
use crate::db::{SubmitResult, WorkQueue};
use crate::error::Result;
use crate::model::work::{NewWorkItem, State};
use crate::nexus::OrganizationDirectory;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Counts from one population pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulateSummary {
    pub enqueued: usize,
    pub excluded: usize,
    pub deceased: usize,
    pub duplicates: usize,
    pub unknown_organizations: Vec<String>,
}

pub struct QueuePopulator {
    directory: Arc<dyn OrganizationDirectory>,
    queue: Arc<dyn WorkQueue>,
    rules: RuleSet,
}

impl QueuePopulator {
    pub fn new(
        directory: Arc<dyn OrganizationDirectory>,
        queue: Arc<dyn WorkQueue>,
        rules: RuleSet,
    ) -> Self {
        Self {
            directory,
            queue,
            rules,
        }
    }

    /// Enqueue every eligible citizen of every configured organization.
    pub async fn populate(&self) -> Result<PopulateSummary> {
        let mut summary = PopulateSummary::default();

        for name in &self.rules.organisations {
            let Some(organization) = self.directory.find_organization_by_name(name).await? else {
                warn!(organisation = %name, "organisation not found, skipping");
                summary.unknown_organizations.push(name.clone());
                continue;
            };

            let citizens = self.directory.list_citizens(&organization).await?;
            debug!(organisation = %name, count = citizens.len(), "roster fetched");

            for citizen in citizens {
                let national_id = citizen.national_id();

                if self.rules.is_excluded(&national_id) {
                    summary.excluded += 1;
                    continue;
                }
                if citizen.is_deceased() {
                    summary.deceased += 1;
                    continue;
                }

                let pending = self
                    .queue
                    .get_items_by_reference(&national_id, State::New)
                    .await?;
                if !pending.is_empty() {
                    summary.duplicates += 1;
                    continue;
                }

                let data = serde_json::to_value(&citizen)?;
                match self
                    .queue
                    .add_item(NewWorkItem::new(national_id, data))
                    .await?
                {
                    SubmitResult::Created(_) => summary.enqueued += 1,
                    SubmitResult::Duplicate(_) => summary.duplicates += 1,
                }
            }
        }

        info!(
            enqueued = summary.enqueued,
            excluded = summary.excluded,
            deceased = summary.deceased,
            duplicates = summary.duplicates,
            unknown_organisations = summary.unknown_organizations.len(),
            "queue populated"
        );
        Ok(summary)
    }
}
