//! Core data model.
//!
//! Nexus documents are decoded once, at the collaborator boundary, into the
//! typed records below. Navigation between documents goes through HAL
//! `_links`, carried on every record as [`Links`].

pub mod citizen;
pub mod organization;
pub mod reference;
pub mod task;
pub mod work;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use citizen::Citizen;
pub use organization::{Employee, Organization};
pub use reference::{Engagement, PathwayView, ProfessionalAssignment, Reference};
pub use task::{NewTask, Task};

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

/// A single HAL link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
}

/// HAL `_links` block, keyed by relation name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Links(BTreeMap<String, Link>);

impl Links {
    pub fn href(&self, rel: &str) -> Option<&str> {
        self.0.get(rel).map(|l| l.href.as_str())
    }

    pub fn with(mut self, rel: impl Into<String>, href: impl Into<String>) -> Self {
        self.0.insert(rel.into(), Link { href: href.into() });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
