//! The reconciliation pipeline: extract, normalize, register, check,
//! resolve, validate.
//!
//! Stages run strictly sequentially within one request-scoped run; the
//! ledger never outlives its run. The external reasoner sits behind a trait
//! so callers plug in an LLM-backed implementation, a rules stub, or
//! nothing at all. Reasoner failure degrades every pending entry to
//! `Unresolved` with the failure recorded as evidence; only ledger
//! incompleteness aborts the run.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::extract::TieredExtractor;
use crate::ledger::{Ledger, LedgerEntry, LedgerError, LedgerStatus};
use crate::models::{MedicationList, SourceList};
use crate::normalize::Normalizer;
use crate::reference::ReferenceData;
use crate::safety::{run_checks, PatientContext, SafetyIssue};
use crate::temporal::TemporalParser;

#[derive(Debug, Error)]
pub enum ReasonerError {
    #[error("External reasoner unavailable: {0}")]
    Unavailable(String),

    #[error("External reasoner returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// Terminal disposition the reasoner may assign to one mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Matched,
    Discrepancy,
    Addition,
    Discontinued,
    Ambiguous,
}

impl From<Disposition> for LedgerStatus {
    fn from(d: Disposition) -> Self {
        match d {
            Disposition::Matched => LedgerStatus::Matched,
            Disposition::Discrepancy => LedgerStatus::Discrepancy,
            Disposition::Addition => LedgerStatus::Addition,
            Disposition::Discontinued => LedgerStatus::Discontinued,
            Disposition::Ambiguous => LedgerStatus::Ambiguous,
        }
    }
}

/// One per-mention decision returned by the reasoner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasonedDecision {
    pub mention_id: Uuid,
    pub disposition: Disposition,
    pub evidence: String,
}

/// External reasoning collaborator. Receives both normalized lists and
/// returns a decision per mention. Implementations may block or call out;
/// the pipeline itself never does.
pub trait ReconciliationReasoner {
    fn reconcile(
        &self,
        prior: &MedicationList,
        current: &MedicationList,
    ) -> Result<Vec<ReasonedDecision>, ReasonerError>;
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Everything a completed run hands to the report generator. Ledger
/// completeness has already been validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationOutcome {
    pub prior: MedicationList,
    pub current: MedicationList,
    pub ledger: Vec<LedgerEntry>,
    pub safety_issues: Vec<SafetyIssue>,
    pub processing_time_ms: u64,
}

pub struct ReconciliationPipeline<'a> {
    reference: &'a ReferenceData,
    config: PipelineConfig,
}

impl<'a> ReconciliationPipeline<'a> {
    pub fn new(reference: &'a ReferenceData, config: PipelineConfig) -> Self {
        Self { reference, config }
    }

    /// Run one full reconciliation over the two text blocks.
    pub fn run(
        &self,
        prior_text: &str,
        current_text: &str,
        patient: &PatientContext,
        reasoner: Option<&dyn ReconciliationReasoner>,
    ) -> Result<ReconciliationOutcome, PipelineError> {
        let start = Instant::now();

        let extractor = TieredExtractor::new(self.reference);
        let mut mentions = extractor.extract(prior_text, SourceList::Prior);
        mentions.extend(extractor.extract(current_text, SourceList::Current));

        // Register before anything downstream can fail or drop a mention.
        let mut ledger = Ledger::new();
        for mention in &mentions {
            ledger.register(mention)?;
        }
        let total_mentions = mentions.len();

        let temporal = TemporalParser::new(self.config.reference_date);
        let normalizer = Normalizer::new(self.reference, &temporal);

        let mut prior = MedicationList::new(SourceList::Prior);
        let mut current = MedicationList::new(SourceList::Current);
        for mention in &mentions {
            let event = normalizer.normalize(mention);
            match event.source {
                SourceList::Prior => prior.events.push(event),
                SourceList::Current => current.events.push(event),
            }
        }

        let combined: Vec<_> = prior
            .events
            .iter()
            .chain(&current.events)
            .cloned()
            .collect();
        let safety_issues = run_checks(&combined, self.reference, patient);

        self.resolve_ledger(&mut ledger, &prior, &current, reasoner);
        ledger.validate(total_mentions)?;

        let processing_time_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            mentions = total_mentions,
            prior = prior.len(),
            current = current.len(),
            issues = safety_issues.len(),
            processing_ms = processing_time_ms,
            "reconciliation run complete"
        );

        Ok(ReconciliationOutcome {
            prior,
            current,
            ledger: ledger.snapshot(),
            safety_issues,
            processing_time_ms,
        })
    }

    /// Drive every pending entry to a terminal status: reasoner decisions
    /// first, then `Unresolved` for whatever remains.
    fn resolve_ledger(
        &self,
        ledger: &mut Ledger,
        prior: &MedicationList,
        current: &MedicationList,
        reasoner: Option<&dyn ReconciliationReasoner>,
    ) {
        let reasoner = if self.config.skip_external_reasoning {
            None
        } else {
            reasoner
        };

        match reasoner {
            None => {
                advance_remaining(ledger, "external reasoning skipped");
            }
            Some(reasoner) => match reasoner.reconcile(prior, current) {
                Ok(decisions) => {
                    for decision in decisions {
                        let result = ledger.advance(
                            decision.mention_id,
                            decision.disposition.into(),
                            decision.evidence,
                        );
                        if let Err(err) = result {
                            // Bad reasoner output degrades; completeness is
                            // enforced by validate(), not here.
                            tracing::warn!(error = %err, "reasoner decision rejected");
                        }
                    }
                    advance_remaining(ledger, "no decision returned by reasoner");
                }
                Err(err) => {
                    tracing::warn!(error = %err, "external reasoner failed");
                    advance_remaining(ledger, &format!("reasoner failed: {err}"));
                }
            },
        }
    }
}

fn advance_remaining(ledger: &mut Ledger, evidence: &str) {
    let pending: Vec<Uuid> = ledger
        .entries()
        .iter()
        .filter(|e| e.status == LedgerStatus::Pending)
        .map(|e| e.mention_id)
        .collect();
    for mention_id in pending {
        // Cannot fail: the id came from the ledger and the entry is pending.
        if let Err(err) = ledger.advance(mention_id, LedgerStatus::Unresolved, evidence) {
            tracing::warn!(error = %err, "failed to mark entry unresolved");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn config() -> PipelineConfig {
        PipelineConfig::new(NaiveDate::from_ymd_opt(2025, 10, 19).unwrap())
            .skip_external_reasoning(true)
    }

    struct MatchEverything;

    impl ReconciliationReasoner for MatchEverything {
        fn reconcile(
            &self,
            prior: &MedicationList,
            current: &MedicationList,
        ) -> Result<Vec<ReasonedDecision>, ReasonerError> {
            Ok(prior
                .events
                .iter()
                .chain(&current.events)
                .map(|e| ReasonedDecision {
                    mention_id: e.mention_id,
                    disposition: Disposition::Matched,
                    evidence: "present in both lists".into(),
                })
                .collect())
        }
    }

    struct FailingReasoner;

    impl ReconciliationReasoner for FailingReasoner {
        fn reconcile(
            &self,
            _: &MedicationList,
            _: &MedicationList,
        ) -> Result<Vec<ReasonedDecision>, ReasonerError> {
            Err(ReasonerError::Unavailable("connection refused".into()))
        }
    }

    #[test]
    fn skip_reasoning_resolves_everything_unresolved() {
        let reference = ReferenceData::load_test();
        let pipeline = ReconciliationPipeline::new(&reference, config());
        let outcome = pipeline
            .run(
                "Metformin 500mg PO BID",
                "Lisinopril 10mg daily",
                &PatientContext::default(),
                None,
            )
            .unwrap();

        assert_eq!(outcome.ledger.len(), 2);
        assert!(outcome
            .ledger
            .iter()
            .all(|e| e.status == LedgerStatus::Unresolved));
    }

    #[test]
    fn reasoner_decisions_land_in_ledger() {
        let reference = ReferenceData::load_test();
        let pipeline = ReconciliationPipeline::new(
            &reference,
            PipelineConfig::new(NaiveDate::from_ymd_opt(2025, 10, 19).unwrap()),
        );
        let outcome = pipeline
            .run(
                "Metformin 500mg PO BID",
                "Metformin 500mg PO BID",
                &PatientContext::default(),
                Some(&MatchEverything),
            )
            .unwrap();

        assert!(outcome
            .ledger
            .iter()
            .all(|e| e.status == LedgerStatus::Matched));
    }

    #[test]
    fn reasoner_failure_degrades_not_aborts() {
        let reference = ReferenceData::load_test();
        let pipeline = ReconciliationPipeline::new(
            &reference,
            PipelineConfig::new(NaiveDate::from_ymd_opt(2025, 10, 19).unwrap()),
        );
        let outcome = pipeline
            .run(
                "Metformin 500mg PO BID",
                "",
                &PatientContext::default(),
                Some(&FailingReasoner),
            )
            .unwrap();

        assert_eq!(outcome.ledger.len(), 1);
        assert_eq!(outcome.ledger[0].status, LedgerStatus::Unresolved);
        assert!(outcome.ledger[0]
            .evidence
            .as_deref()
            .is_some_and(|e| e.contains("connection refused")));
    }

    #[test]
    fn empty_texts_yield_empty_complete_outcome() {
        let reference = ReferenceData::load_test();
        let pipeline = ReconciliationPipeline::new(&reference, config());
        let outcome = pipeline
            .run("", "", &PatientContext::default(), None)
            .unwrap();
        assert!(outcome.ledger.is_empty());
        assert!(outcome.prior.is_empty());
        assert!(outcome.current.is_empty());
        assert!(outcome.safety_issues.is_empty());
    }
}
