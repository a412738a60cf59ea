//! Rule set loaded from a TOML file.
//!
//! Names the organizations whose rosters are checked, plus the national
//! IDs that are never queued.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Test citizens present in every Nexus instance.
pub const DEFAULT_EXCLUDED_IDENTIFIERS: [&str; 3] = ["0108589995", "0505059996", "2512489996"];

/// Pathway view that exposes the full reference tree.
pub const DEFAULT_PATHWAY_VIEW: &str = "- Alt";

#[derive(Debug, Clone, Deserialize)]
pub struct RuleSet {
    /// Organization names, matched exactly against Nexus.
    pub organisations: Vec<String>,

    #[serde(default = "default_excluded")]
    pub excluded_identifiers: Vec<String>,

    #[serde(default = "default_pathway_view")]
    pub pathway_view: String,
}

fn default_excluded() -> Vec<String> {
    DEFAULT_EXCLUDED_IDENTIFIERS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_pathway_view() -> String {
    DEFAULT_PATHWAY_VIEW.to_string()
}

impl RuleSet {
    /// Read and parse a rule file. A missing file is a startup error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::Config(format!(
                "rule file not found: {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
            .map_err(|e| Error::Config(format!("bad rule file {}: {e}", path.display())))
    }

    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Is this normalized national ID on the exclusion list?
    pub fn is_excluded(&self, identifier: &str) -> bool {
        self.excluded_identifiers.iter().any(|id| id == identifier)
    }
}
