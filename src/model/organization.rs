//! Organizations and employees.

use super::Links;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    #[serde(rename = "_links", default, skip_serializing_if = "Links::is_empty")]
    pub links: Links,
}

/// A Nexus professional. Case workers are employees.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: i64,
    #[serde(default)]
    pub initials: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub primary_organization: Option<OrganizationRef>,
    #[serde(rename = "_links", default, skip_serializing_if = "Links::is_empty")]
    pub links: Links,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationRef {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
}

impl Employee {
    pub fn primary_organization_name(&self) -> Option<&str> {
        self.primary_organization.as_ref().map(|o| o.name.as_str())
    }
}
