//! Municipality checks on a citizen record.

use crate::model::Citizen;

/// Which municipality assignment is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingPayingMunicipality,
    MissingActingMunicipality,
}

impl ErrorKind {
    /// Report text for the kind, as shown to case workers.
    pub fn description(self) -> &'static str {
        match self {
            ErrorKind::MissingPayingMunicipality => "Borger har ikke betalingskommune tilknyttet.",
            ErrorKind::MissingActingMunicipality => "Borger har ikke handlekommune tilknyttet.",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Both municipalities are set. Nothing to do.
    Eligible,
    Missing(ErrorKind),
}

/// Classify a citizen. A missing paying municipality takes priority, so at
/// most one kind is reported.
pub fn classify(citizen: &Citizen) -> Classification {
    let Some(info) = citizen.patient_reimbursement_information.as_ref() else {
        return Classification::Missing(ErrorKind::MissingPayingMunicipality);
    };
    if info.paying_municipality_value_schedule.is_none() {
        return Classification::Missing(ErrorKind::MissingPayingMunicipality);
    }
    if info.acting_municipality_value_schedule.is_none() {
        return Classification::Missing(ErrorKind::MissingActingMunicipality);
    }
    Classification::Eligible
}
