//! Safety checks over the combined normalized events.
//!
//! Only active events (neither negated nor historical) participate. Each
//! check runs independently over the full set; findings are additive and a
//! check with nothing to say contributes nothing.

pub mod checks;
pub mod types;

pub use types::{IssueKind, PatientContext, SafetyIssue};

use crate::models::MedicationEvent;
use crate::reference::ReferenceData;

use checks::{check_contraindications, check_duplication, check_interactions};

/// Run every safety check over the combined events from both lists.
pub fn run_checks(
    events: &[MedicationEvent],
    reference: &ReferenceData,
    context: &PatientContext,
) -> Vec<SafetyIssue> {
    let active: Vec<&MedicationEvent> = events.iter().filter(|e| e.is_active()).collect();

    let mut issues = Vec::new();
    issues.extend(check_duplication(&active, reference));
    issues.extend(check_interactions(&active, reference));
    issues.extend(check_contraindications(&active, reference, context));

    tracing::debug!(
        active = active.len(),
        issues = issues.len(),
        "safety checks complete"
    );
    issues
}
