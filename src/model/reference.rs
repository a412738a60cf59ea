//! Pathway views and the reference tree beneath them.
//!
//! A reference locates an entity but does not carry it: the target
//! (professional assignment, engagement) is fetched separately through the
//! reference's `referencedObject` link.

use super::Links;
use serde::{Deserialize, Serialize};

/// Node type of a citizen pathway. Carries the activity flag.
pub const PATHWAY_REFERENCE: &str = "patientPathwayReference";
pub const PROFESSIONAL_REFERENCE: &str = "professionalReference";
pub const ENGAGEMENT_REFERENCE: &str = "basketGrantReference";
pub const ENGAGEMENT_PACKAGE_REFERENCE: &str = "basketGrantPackageReference";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathwayView {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(rename = "_links", default, skip_serializing_if = "Links::is_empty")]
    pub links: Links,
}

/// One node of the reference tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    #[serde(default)]
    pub id: Option<i64>,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub name: String,

    /// Only meaningful on pathway nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_state: Option<WorkflowState>,

    #[serde(default)]
    pub package_grant: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Reference>,

    #[serde(rename = "_links", default, skip_serializing_if = "Links::is_empty")]
    pub links: Links,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub name: String,
}

impl Reference {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: None,
            kind: kind.into(),
            name: name.into(),
            active: None,
            workflow_state: None,
            package_grant: false,
            children: Vec::new(),
            links: Links::default(),
        }
    }

    /// A pathway node with the given activity flag.
    pub fn pathway(name: impl Into<String>, active: bool) -> Self {
        let mut node = Self::new(PATHWAY_REFERENCE, name);
        node.active = Some(active);
        node
    }

    pub fn child(mut self, child: Reference) -> Self {
        self.children.push(child);
        self
    }

    pub fn workflow_state(mut self, name: impl Into<String>) -> Self {
        self.workflow_state = Some(WorkflowState { name: name.into() });
        self
    }

    pub fn link(mut self, rel: &str, href: impl Into<String>) -> Self {
        self.links = self.links.with(rel, href);
        self
    }

    pub fn is_pathway(&self) -> bool {
        self.kind == PATHWAY_REFERENCE
    }

    /// A pathway explicitly flagged inactive. Pathways with no flag count as active.
    pub fn is_inactive_pathway(&self) -> bool {
        self.is_pathway() && self.active == Some(false)
    }

    pub fn is_package(&self) -> bool {
        self.package_grant || self.kind == ENGAGEMENT_PACKAGE_REFERENCE
    }

    /// Does a path-pattern segment address this node?
    pub(crate) fn matches_segment(&self, segment: &str) -> bool {
        segment == "*" || segment == self.name || segment == self.kind
    }
}

/// Target of a professional reference. Carries no contact details.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionalAssignment {
    #[serde(default)]
    pub activity_identifier: Option<ActivityIdentifier>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityIdentifier {
    #[serde(default)]
    pub activity_id: Option<String>,
}

impl ProfessionalAssignment {
    pub fn activity_id(&self) -> Option<&str> {
        self.activity_identifier
            .as_ref()
            .and_then(|a| a.activity_id.as_deref())
            .filter(|id| !id.is_empty())
    }
}

/// Target of an engagement reference. Tasks are attached here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Engagement {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_state: Option<WorkflowState>,
    #[serde(rename = "_links", default, skip_serializing_if = "Links::is_empty")]
    pub links: Links,
}
