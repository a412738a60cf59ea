//! Citizen records as returned by Nexus.

use super::Links;
use serde::{Deserialize, Serialize};

/// Patient state name Nexus uses for deceased citizens.
pub const DECEASED_STATE: &str = "Død";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citizen {
    #[serde(default)]
    pub id: Option<i64>,

    pub patient_identifier: PatientIdentifier,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_state: Option<PatientState>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_reimbursement_information: Option<ReimbursementInformation>,

    #[serde(rename = "_links", default, skip_serializing_if = "Links::is_empty")]
    pub links: Links,

    /// Remaining roster fields (name, address, ...), kept so the queued
    /// payload is the full document.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientIdentifier {
    /// National ID as Nexus formats it, usually `DDMMYY-XXXX`.
    pub identifier: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientState {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReimbursementInformation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paying_municipality_value_schedule: Option<MunicipalitySchedule>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acting_municipality_value_schedule: Option<MunicipalitySchedule>,
}

/// Value-schedule entry naming a municipality. Only its presence matters here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MunicipalitySchedule {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

impl Citizen {
    /// National ID with hyphens stripped. Used as the work item reference.
    pub fn national_id(&self) -> String {
        normalize_national_id(&self.patient_identifier.identifier)
    }

    pub fn is_deceased(&self) -> bool {
        self.patient_state
            .as_ref()
            .is_some_and(|s| s.name == DECEASED_STATE)
    }
}

pub fn normalize_national_id(raw: &str) -> String {
    raw.replace('-', "")
}
