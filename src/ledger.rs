//! Completeness ledger: every mention gets an entry at ingestion, before
//! any downstream stage runs, and every entry ends a run in exactly one
//! terminal disposition. A mention that silently disappears between stages
//! is a patient-safety defect, so ledger incompleteness is the one fatal
//! error in the pipeline.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::MedicationMention;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("No ledger entry for mention {0}")]
    UnknownMention(Uuid),

    #[error("Mention {0} already registered")]
    DuplicateMention(Uuid),

    #[error("Entry for mention {mention_id} already resolved to {status}")]
    AlreadyResolved { mention_id: Uuid, status: String },

    #[error("Cannot advance entry for mention {0} to pending")]
    NotTerminal(Uuid),

    #[error("Ledger integrity violated: {0}")]
    Integrity(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerStatus {
    Pending,
    Matched,
    Discrepancy,
    Addition,
    Discontinued,
    Ambiguous,
    Unresolved,
}

impl LedgerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Matched => "matched",
            Self::Discrepancy => "discrepancy",
            Self::Addition => "addition",
            Self::Discontinued => "discontinued",
            Self::Ambiguous => "ambiguous",
            Self::Unresolved => "unresolved",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// One mention's reconciliation record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub mention_id: Uuid,
    /// Raw drug string, kept for the report so an entry is readable
    /// without joining back to its mention.
    pub drug_raw: String,
    pub status: LedgerStatus,
    pub evidence: Option<String>,
    pub registered_at: NaiveDateTime,
    pub resolved_at: Option<NaiveDateTime>,
}

/// Request-scoped; one per reconciliation run, never shared across runs.
#[derive(Debug, Default)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
    index: HashMap<Uuid, usize>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mention as `Pending` at ingestion time, before any
    /// downstream processing can fail or drop it.
    pub fn register(&mut self, mention: &MedicationMention) -> Result<(), LedgerError> {
        if self.index.contains_key(&mention.id) {
            return Err(LedgerError::DuplicateMention(mention.id));
        }
        self.index.insert(mention.id, self.entries.len());
        self.entries.push(LedgerEntry {
            mention_id: mention.id,
            drug_raw: mention.drug_raw.clone(),
            status: LedgerStatus::Pending,
            evidence: None,
            registered_at: chrono::Local::now().naive_local(),
            resolved_at: None,
        });
        Ok(())
    }

    /// Transition one entry from `Pending` to a terminal status. An entry
    /// transitions exactly once per run.
    pub fn advance(
        &mut self,
        mention_id: Uuid,
        status: LedgerStatus,
        evidence: impl Into<String>,
    ) -> Result<(), LedgerError> {
        if !status.is_terminal() {
            return Err(LedgerError::NotTerminal(mention_id));
        }
        let idx = *self
            .index
            .get(&mention_id)
            .ok_or(LedgerError::UnknownMention(mention_id))?;
        let entry = &mut self.entries[idx];
        if entry.status.is_terminal() {
            return Err(LedgerError::AlreadyResolved {
                mention_id,
                status: entry.status.as_str().into(),
            });
        }
        entry.status = status;
        entry.evidence = Some(evidence.into());
        entry.resolved_at = Some(chrono::Local::now().naive_local());
        tracing::debug!(
            mention_id = %mention_id,
            status = status.as_str(),
            "ledger entry resolved"
        );
        Ok(())
    }

    /// Verify completeness after a run: one entry per extracted mention,
    /// none still pending. The only fatal check in the pipeline.
    pub fn validate(&self, expected_mentions: usize) -> Result<(), LedgerError> {
        if self.entries.len() != expected_mentions {
            return Err(LedgerError::Integrity(format!(
                "{} entries for {} mentions",
                self.entries.len(),
                expected_mentions
            )));
        }
        let pending = self
            .entries
            .iter()
            .filter(|e| e.status == LedgerStatus::Pending)
            .count();
        if pending > 0 {
            return Err(LedgerError::Integrity(format!(
                "{pending} entries still pending after run"
            )));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, mention_id: Uuid) -> Option<&LedgerEntry> {
        self.index.get(&mention_id).map(|&i| &self.entries[i])
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Count of entries per status, for the run summary.
    pub fn summary(&self) -> HashMap<LedgerStatus, usize> {
        let mut counts = HashMap::new();
        for entry in &self.entries {
            *counts.entry(entry.status).or_insert(0) += 1;
        }
        counts
    }

    /// Owned copy of the entries for the report generator.
    pub fn snapshot(&self) -> Vec<LedgerEntry> {
        self.entries.clone()
    }
}
