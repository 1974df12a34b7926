//! End-to-end runs over the shipped reference tables.

use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;

use medrec::equivalence::{compare_doses, DoseEquivalence};
use medrec::pipeline::{ReasonedDecision, ReasonerError};
use medrec::{
    Disposition, IssueKind, LedgerStatus, PatientContext, PipelineConfig, ReconciliationPipeline,
    ReconciliationReasoner, ReferenceData,
};

fn reference() -> ReferenceData {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("resources");
    ReferenceData::load(&dir).expect("shipped reference tables load")
}

fn config() -> PipelineConfig {
    PipelineConfig::new(NaiveDate::from_ymd_opt(2025, 10, 19).unwrap())
}

/// Deterministic stand-in for the LLM collaborator: pairs events by
/// normalized drug name.
struct NameMatchReasoner;

impl ReconciliationReasoner for NameMatchReasoner {
    fn reconcile(
        &self,
        prior: &medrec::models::MedicationList,
        current: &medrec::models::MedicationList,
    ) -> Result<Vec<ReasonedDecision>, ReasonerError> {
        let prior_names: HashSet<&str> = prior.events.iter().map(|e| e.drug_name.as_str()).collect();
        let current_names: HashSet<&str> =
            current.events.iter().map(|e| e.drug_name.as_str()).collect();

        let mut decisions = Vec::new();
        for event in &prior.events {
            let disposition = if event.context.negated {
                Disposition::Discontinued
            } else if current_names.contains(event.drug_name.as_str()) {
                Disposition::Matched
            } else {
                Disposition::Ambiguous
            };
            decisions.push(ReasonedDecision {
                mention_id: event.mention_id,
                disposition,
                evidence: format!("{} prior-side pairing", event.drug_name),
            });
        }
        for event in &current.events {
            let disposition = if prior_names.contains(event.drug_name.as_str()) {
                Disposition::Matched
            } else {
                Disposition::Addition
            };
            decisions.push(ReasonedDecision {
                mention_id: event.mention_id,
                disposition,
                evidence: format!("{} current-side pairing", event.drug_name),
            });
        }
        Ok(decisions)
    }
}

#[test]
fn ledger_has_one_entry_per_mention() {
    let reference = reference();
    let pipeline = ReconciliationPipeline::new(&reference, config().skip_external_reasoning(true));

    let prior = "Metformin 500mg PO BID\nLipitor 20mg nightly\nPatient stopped aspirin 3 weeks ago";
    let current = "metformin 500mg by mouth twice daily\nlisinopril 10mg daily";
    let outcome = pipeline
        .run(prior, current, &PatientContext::default(), None)
        .unwrap();

    let mentions = outcome.prior.len() + outcome.current.len();
    assert_eq!(outcome.ledger.len(), mentions);
    assert_eq!(mentions, 5);
    assert!(outcome
        .ledger
        .iter()
        .all(|e| e.status != LedgerStatus::Pending));
}

#[test]
fn repeated_runs_are_deterministic() {
    let reference = reference();
    let pipeline = ReconciliationPipeline::new(&reference, config().skip_external_reasoning(true));

    let prior = "Coumadin 5mg daily\nomeprazole 20mg every day";
    let current = "warfarin 5mg daily\nibuprofen 400mg as needed";

    let a = pipeline
        .run(prior, current, &PatientContext::default(), None)
        .unwrap();
    let b = pipeline
        .run(prior, current, &PatientContext::default(), None)
        .unwrap();

    let names = |list: &medrec::models::MedicationList| -> Vec<String> {
        list.events.iter().map(|e| e.drug_name.clone()).collect()
    };
    assert_eq!(names(&a.prior), names(&b.prior));
    assert_eq!(names(&a.current), names(&b.current));
    assert_eq!(a.safety_issues.len(), b.safety_issues.len());
}

#[test]
fn stopped_aspirin_three_weeks_ago() {
    let reference = reference();
    let pipeline = ReconciliationPipeline::new(&reference, config().skip_external_reasoning(true));

    let outcome = pipeline
        .run(
            "Patient stopped aspirin 3 weeks ago",
            "",
            &PatientContext::default(),
            None,
        )
        .unwrap();

    assert_eq!(outcome.prior.len(), 1);
    let event = &outcome.prior.events[0];
    assert_eq!(event.drug_name, "aspirin");
    assert!(event.context.negated);
    assert_eq!(event.temporal_raw.as_deref(), Some("3 weeks ago"));
    assert_eq!(event.resolved_date, NaiveDate::from_ymd_opt(2025, 9, 28));
}

#[test]
fn half_tablet_matches_half_strength() {
    let reference = reference();
    let pipeline = ReconciliationPipeline::new(&reference, config().skip_external_reasoning(true));

    let outcome = pipeline
        .run(
            "atorvastatin ½ of a 10mg tablet daily",
            "atorvastatin 5mg daily",
            &PatientContext::default(),
            None,
        )
        .unwrap();

    let prior = &outcome.prior.events[0];
    let current = &outcome.current.events[0];
    assert_eq!(prior.drug_name, current.drug_name);
    assert_eq!(
        compare_doses(prior.dose.as_ref(), current.dose.as_ref()),
        DoseEquivalence::Equivalent
    );
}

#[test]
fn nsaid_duplication_across_lists() {
    let reference = reference();
    let pipeline = ReconciliationPipeline::new(&reference, config().skip_external_reasoning(true));

    let outcome = pipeline
        .run(
            "ibuprofen 400mg three times daily",
            "naproxen 250mg twice daily",
            &PatientContext::default(),
            None,
        )
        .unwrap();

    let dup = outcome
        .safety_issues
        .iter()
        .find(|i| i.kind == IssueKind::Duplication)
        .expect("duplication issue");
    assert!(dup.rationale.contains("nsaid"));
    assert!(dup.drugs.contains(&"ibuprofen".to_string()));
    assert!(dup.drugs.contains(&"naproxen".to_string()));
}

#[test]
fn renal_contraindication_and_missing_lab() {
    let reference = reference();
    let pipeline = ReconciliationPipeline::new(&reference, config().skip_external_reasoning(true));

    let mut labs = PatientContext::default();
    labs.labs.insert("egfr".into(), 25.0);
    let with_lab = pipeline
        .run("", "metformin 500mg twice daily", &labs, None)
        .unwrap();
    assert!(with_lab
        .safety_issues
        .iter()
        .any(|i| i.kind == IssueKind::Contraindication));

    let without_lab = pipeline
        .run(
            "",
            "metformin 500mg twice daily",
            &PatientContext::default(),
            None,
        )
        .unwrap();
    assert!(without_lab
        .safety_issues
        .iter()
        .any(|i| i.kind == IssueKind::DataMissing));
    assert!(without_lab
        .safety_issues
        .iter()
        .all(|i| i.kind != IssueKind::Contraindication));
}

#[test]
fn multibyte_characters_before_a_drug_name() {
    let reference = reference();
    let pipeline = ReconciliationPipeline::new(&reference, config().skip_external_reasoning(true));

    // U+0130 changes byte length under case folding; spans must stay valid.
    let outcome = pipeline
        .run("İ aspirin 81mg daily", "", &PatientContext::default(), None)
        .unwrap();

    assert_eq!(outcome.prior.len(), 1);
    assert_eq!(outcome.prior.events[0].drug_name, "aspirin");
}

#[test]
fn malformed_dates_never_abort() {
    let reference = reference();
    let pipeline = ReconciliationPipeline::new(&reference, config().skip_external_reasoning(true));

    let outcome = pipeline
        .run(
            "aspirin 81mg started on 99/99/9999",
            "",
            &PatientContext::default(),
            None,
        )
        .unwrap();

    let event = &outcome.prior.events[0];
    assert!(event.resolved_date.is_none());
    assert!(event.temporal_raw.is_some());
}

#[test]
fn full_run_with_reasoner() {
    let reference = reference();
    let pipeline = ReconciliationPipeline::new(&reference, config());

    let prior = "Glucophage 500mg by mouth twice daily\nPatient stopped warfarin last month\nLipitor 20mg nightly";
    let current = "metformin 500mg PO BID\nlisinopril 10mg daily";
    let outcome = pipeline
        .run(prior, current, &PatientContext::default(), Some(&NameMatchReasoner))
        .unwrap();

    let status_of = |drug: &str| {
        outcome
            .ledger
            .iter()
            .find(|e| e.drug_raw.to_lowercase().contains(drug))
            .map(|e| e.status)
    };
    // Glucophage normalizes to metformin, matching the current list.
    assert_eq!(status_of("glucophage"), Some(LedgerStatus::Matched));
    assert_eq!(status_of("warfarin"), Some(LedgerStatus::Discontinued));
    assert_eq!(status_of("lisinopril"), Some(LedgerStatus::Addition));
    assert_eq!(status_of("lipitor"), Some(LedgerStatus::Ambiguous));

    assert!(outcome
        .ledger
        .iter()
        .all(|e| e.status != LedgerStatus::Pending));
    assert_eq!(outcome.ledger.len(), 5);
}
