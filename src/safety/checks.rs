//! The individual safety checks. Each check is a free function over the
//! combined active events so one check's missing data never suppresses
//! another's findings.

use std::collections::BTreeMap;

use crate::models::{MedicationEvent, Severity};
use crate::reference::ReferenceData;

use super::types::{IssueKind, PatientContext, SafetyIssue};

/// Exact duplicates within one source list, plus therapeutic-class
/// duplication over the combined active events (two or more sharing a
/// class, same generic or not).
pub fn check_duplication(
    events: &[&MedicationEvent],
    reference: &ReferenceData,
) -> Vec<SafetyIssue> {
    let mut issues = Vec::new();

    // Same generic listed more than once in one list.
    let mut by_drug_and_source: BTreeMap<(&str, &str), Vec<&MedicationEvent>> = BTreeMap::new();
    for event in events {
        by_drug_and_source
            .entry((event.drug_name.as_str(), event.source.as_str()))
            .or_default()
            .push(event);
    }
    for ((drug, source), group) in &by_drug_and_source {
        if group.len() >= 2 {
            issues.push(SafetyIssue {
                kind: IssueKind::Duplication,
                severity: Severity::Moderate,
                event_ids: group.iter().map(|e| e.id).collect(),
                drugs: vec![(*drug).to_string()],
                rationale: format!("{drug} listed {} times in the {source} list", group.len()),
            });
        }
    }

    // Two or more active events sharing a therapeutic class, whether the
    // drug names differ or the same agent shows up in both lists.
    for class in &reference.classes {
        let mut members: Vec<&MedicationEvent> = events
            .iter()
            .copied()
            .filter(|e| class.members.iter().any(|m| m == &e.drug_name))
            .collect();
        members.sort_by(|a, b| a.drug_name.cmp(&b.drug_name));

        if members.len() >= 2 {
            let mut names: Vec<&str> = members.iter().map(|e| e.drug_name.as_str()).collect();
            names.dedup();
            issues.push(SafetyIssue {
                kind: IssueKind::Duplication,
                severity: Severity::Moderate,
                event_ids: members.iter().map(|e| e.id).collect(),
                drugs: names.iter().map(|n| n.to_string()).collect(),
                rationale: format!(
                    "{} active {} agents: {}",
                    members.len(),
                    class.name,
                    names.join(", ")
                ),
            });
        }
    }

    issues
}

/// Every active-drug pair against the interaction table. Unlisted pairs
/// produce nothing: absence of data is not asserted absence of interaction.
pub fn check_interactions(
    events: &[&MedicationEvent],
    reference: &ReferenceData,
) -> Vec<SafetyIssue> {
    let mut issues = Vec::new();

    let mut drugs: Vec<&MedicationEvent> = events.to_vec();
    drugs.sort_by(|a, b| a.drug_name.cmp(&b.drug_name));
    drugs.dedup_by(|a, b| a.drug_name == b.drug_name);

    for (i, x) in drugs.iter().enumerate() {
        for y in &drugs[i + 1..] {
            for rule in &reference.interactions {
                let forward = reference.matches_drug_or_class(&rule.a, &x.drug_name)
                    && reference.matches_drug_or_class(&rule.b, &y.drug_name);
                let reverse = reference.matches_drug_or_class(&rule.a, &y.drug_name)
                    && reference.matches_drug_or_class(&rule.b, &x.drug_name);
                if forward || reverse {
                    issues.push(SafetyIssue {
                        kind: IssueKind::Interaction,
                        severity: rule.severity,
                        event_ids: vec![x.id, y.id],
                        drugs: vec![x.drug_name.clone(), y.drug_name.clone()],
                        rationale: format!(
                            "{} + {}: {}",
                            x.drug_name, y.drug_name, rule.risk
                        ),
                    });
                }
            }
        }
    }

    issues
}

/// Organ-function thresholds against supplied labs. A missing lab value
/// for a thresholded drug becomes a visible `data_missing` issue, never a
/// silent skip.
pub fn check_contraindications(
    events: &[&MedicationEvent],
    reference: &ReferenceData,
    context: &PatientContext,
) -> Vec<SafetyIssue> {
    let mut issues = Vec::new();

    let mut drugs: Vec<&MedicationEvent> = events.to_vec();
    drugs.sort_by(|a, b| a.drug_name.cmp(&b.drug_name));
    drugs.dedup_by(|a, b| a.drug_name == b.drug_name);

    for event in &drugs {
        for threshold in &reference.renal_thresholds {
            if !reference.matches_drug_or_class(&threshold.name, &event.drug_name) {
                continue;
            }
            match context.egfr() {
                Some(egfr) if egfr < threshold.min_egfr => {
                    issues.push(SafetyIssue {
                        kind: IssueKind::Contraindication,
                        severity: Severity::High,
                        event_ids: vec![event.id],
                        drugs: vec![event.drug_name.clone()],
                        rationale: format!(
                            "{} with eGFR {egfr} (threshold {}): {}",
                            event.drug_name, threshold.min_egfr, threshold.reason
                        ),
                    });
                }
                Some(_) => {}
                None => {
                    issues.push(SafetyIssue {
                        kind: IssueKind::DataMissing,
                        severity: Severity::Moderate,
                        event_ids: vec![event.id],
                        drugs: vec![event.drug_name.clone()],
                        rationale: format!(
                            "{} has a renal threshold (eGFR {}) but no eGFR was supplied",
                            event.drug_name, threshold.min_egfr
                        ),
                    });
                }
            }
        }
    }

    issues
}
