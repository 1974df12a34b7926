use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Duplication,
    Interaction,
    Contraindication,
    DataMissing,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Duplication => "duplication",
            Self::Interaction => "interaction",
            Self::Contraindication => "contraindication",
            Self::DataMissing => "data_missing",
        }
    }
}

/// One finding from a safety check. Read-only once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyIssue {
    pub kind: IssueKind,
    pub severity: Severity,
    /// Events implicated in the finding.
    pub event_ids: Vec<Uuid>,
    /// Generic drug names involved, for the report.
    pub drugs: Vec<String>,
    pub rationale: String,
}

/// Optional demographics, labs, and allergies supplied by the caller.
/// Passed through opaquely; checks read only the keys they understand.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientContext {
    pub demographics: HashMap<String, String>,
    pub labs: HashMap<String, f64>,
    pub allergies: Vec<String>,
}

impl PatientContext {
    pub fn egfr(&self) -> Option<f64> {
        self.labs.get("egfr").copied()
    }
}
