//! Nexus REST client.
//!
//! Authenticates with OAuth2 client credentials and navigates the API by
//! following HAL `_links` from the home resource. Bearer tokens are cached
//! until shortly before they expire.

use super::{CitizenStore, EmployeeDirectory, OrganizationDirectory, PathwayStore, TaskStore};
use crate::config::NexusConfig;
use crate::config::secrets::{ExposeSecret, SecretString};
use crate::error::{Error, Result};
use crate::model::{
    Citizen, Employee, Engagement, Links, NewTask, Organization, PathwayView,
    ProfessionalAssignment, Reference, Task,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Link relations followed by the client.
mod rel {
    pub const SELF: &str = "self";
    pub const ORGANIZATIONS: &str = "organizations";
    pub const PATIENTS: &str = "patients";
    pub const PROFESSIONALS: &str = "professionals";
    pub const PATIENT_PREFERENCES: &str = "patientPreferences";
    pub const PATHWAY_REFERENCES: &str = "pathwayReferences";
    pub const REFERENCED_OBJECT: &str = "referencedObject";
    pub const TASKS: &str = "tasks";
    pub const CREATE_TASK: &str = "createTask";
}

/// Refresh tokens this long before the server says they expire.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

pub struct NexusClient {
    http: reqwest::Client,
    base_url: String,
    token_url: String,
    client_id: String,
    client_secret: SecretString,
    pathway_view: String,
    token: Mutex<Option<CachedToken>>,
}

struct CachedToken {
    access_token: SecretString,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Deserialize)]
struct Resource {
    #[serde(rename = "_links", default)]
    links: Links,
}

#[derive(Deserialize)]
struct PatientPreferences {
    #[serde(rename = "CITIZEN_PATHWAY", default)]
    citizen_pathway: Vec<PathwayView>,
}

impl NexusClient {
    /// Build a client for the configured instance.
    ///
    /// `pathway_view` names the citizen pathway view whose reference tree
    /// is searched.
    pub fn new(config: &NexusConfig, pathway_view: impl Into<String>) -> Result<Self> {
        Self::with_endpoints(
            &config.base_url,
            &config.token_url,
            &config.client_id,
            SecretString::from(config.client_secret.expose_secret().to_string()),
            pathway_view,
        )
    }

    pub fn with_endpoints(
        base_url: &str,
        token_url: &str,
        client_id: &str,
        client_secret: SecretString,
        pathway_view: impl Into<String>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.to_string(),
            token_url: token_url.to_string(),
            client_id: client_id.to_string(),
            client_secret,
            pathway_view: pathway_view.into(),
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() + TOKEN_EXPIRY_MARGIN {
                return Ok(token.access_token.expose_secret().to_string());
            }
        }

        debug!(url = %self.token_url, "requesting nexus access token");
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.expose_secret()),
            ])
            .send()
            .await?;
        let response = check_status(response)?;
        let body: TokenResponse = response.json().await?;

        let token = body.access_token.clone();
        *cached = Some(CachedToken {
            access_token: SecretString::from(body.access_token),
            expires_at: Instant::now() + Duration::from_secs(body.expires_in),
        });
        Ok(token)
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.get_optional(url)
            .await?
            .ok_or_else(|| Error::NotFound(url.to_string()))
    }

    /// GET that maps 404 to `None`.
    async fn get_optional<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        self.get_with_query(url, &[]).await
    }

    async fn get_with_query<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>> {
        let token = self.access_token().await?;
        debug!(url, "nexus GET");
        let response = self
            .http
            .get(url)
            .query(query)
            .bearer_auth(token)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response)?;
        Ok(Some(response.json().await?))
    }

    async fn home(&self) -> Result<Links> {
        let home: Resource = self.get(&self.base_url).await?;
        Ok(home.links)
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(Error::Api {
            status: status.as_u16(),
            url: response.url().to_string(),
        })
    }
}

fn link<'a>(links: &'a Links, rel: &str) -> Result<&'a str> {
    links
        .href(rel)
        .ok_or_else(|| Error::MissingLink(rel.to_string()))
}

#[async_trait]
impl OrganizationDirectory for NexusClient {
    async fn find_organization_by_name(&self, name: &str) -> Result<Option<Organization>> {
        let home = self.home().await?;
        let organizations: Vec<Organization> = self.get(link(&home, rel::ORGANIZATIONS)?).await?;
        Ok(organizations.into_iter().find(|o| o.name == name))
    }

    async fn list_citizens(&self, organization: &Organization) -> Result<Vec<Citizen>> {
        let citizens: Option<Vec<Citizen>> = self
            .get_optional(link(&organization.links, rel::PATIENTS)?)
            .await?;
        Ok(citizens.unwrap_or_default())
    }
}

#[async_trait]
impl CitizenStore for NexusClient {
    async fn refresh_citizen(&self, citizen: &Citizen) -> Result<Citizen> {
        self.get(link(&citizen.links, rel::SELF)?).await
    }
}

#[async_trait]
impl PathwayStore for NexusClient {
    async fn pathway_view(&self, citizen: &Citizen) -> Result<Option<PathwayView>> {
        let Some(preferences) = self
            .get_optional::<PatientPreferences>(link(&citizen.links, rel::PATIENT_PREFERENCES)?)
            .await?
        else {
            return Ok(None);
        };

        let Some(entry) = preferences
            .citizen_pathway
            .into_iter()
            .find(|v| v.name == self.pathway_view)
        else {
            return Ok(None);
        };

        // The preference entry is a summary; the full view carries the reference link.
        match entry.links.href(rel::SELF) {
            Some(href) => self.get_optional(href).await,
            None => Ok(Some(entry)),
        }
    }

    async fn references(&self, view: &PathwayView) -> Result<Vec<Reference>> {
        let references: Option<Vec<Reference>> = self
            .get_optional(link(&view.links, rel::PATHWAY_REFERENCES)?)
            .await?;
        Ok(references.unwrap_or_default())
    }

    async fn resolve_professional(
        &self,
        reference: &Reference,
    ) -> Result<Option<ProfessionalAssignment>> {
        match reference.links.href(rel::REFERENCED_OBJECT) {
            Some(href) => self.get_optional(href).await,
            None => Ok(None),
        }
    }

    async fn resolve_engagement(&self, reference: &Reference) -> Result<Option<Engagement>> {
        match reference.links.href(rel::REFERENCED_OBJECT) {
            Some(href) => self.get_optional(href).await,
            None => Ok(None),
        }
    }
}

#[async_trait]
impl TaskStore for NexusClient {
    async fn task_history(&self, engagement: &Engagement) -> Result<Vec<Task>> {
        let tasks: Option<Vec<Task>> = self
            .get_optional(link(&engagement.links, rel::TASKS)?)
            .await?;
        Ok(tasks.unwrap_or_default())
    }

    async fn create_task(&self, engagement: &Engagement, task: &NewTask) -> Result<()> {
        let url = link(&engagement.links, rel::CREATE_TASK)?;
        let token = self.access_token().await?;
        debug!(url, engagement_id = engagement.id, "nexus POST task");
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(task)
            .send()
            .await?;
        check_status(response)?;
        Ok(())
    }
}

#[async_trait]
impl EmployeeDirectory for NexusClient {
    async fn find_employee_by_initials(&self, initials: &str) -> Result<Option<Employee>> {
        let home = self.home().await?;
        let candidates: Vec<Employee> = self
            .get_with_query(link(&home, rel::PROFESSIONALS)?, &[("query", initials)])
            .await?
            .unwrap_or_default();

        let Some(employee) = candidates.into_iter().find(|e| {
            e.initials
                .as_deref()
                .is_some_and(|i| i.eq_ignore_ascii_case(initials))
        }) else {
            return Ok(None);
        };

        // Search results are summaries without the primary organization.
        match employee.links.href(rel::SELF) {
            Some(href) => self.get_optional(href).await,
            None => Ok(Some(employee)),
        }
    }
}
