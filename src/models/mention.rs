use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{ExtractionTier, SourceList};

/// A single textual occurrence of a medication reference.
///
/// Mentions are immutable once created and are never deleted: the ledger
/// guarantees every mention reaches a final disposition. Repeated identical
/// occurrences in one document stay distinct mentions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicationMention {
    pub id: Uuid,
    pub source: SourceList,
    /// The full line or sentence the mention was found in.
    pub raw_text: String,
    /// Character offsets of the drug-name span within `raw_text`.
    pub span_start: usize,
    pub span_end: usize,
    pub drug_raw: String,
    pub dose_raw: Option<String>,
    pub route_raw: Option<String>,
    pub frequency_raw: Option<String>,
    pub form_raw: Option<String>,
    pub context: ContextFlags,
    /// Temporal expression attached to the line, if any ("3 weeks ago").
    pub temporal_raw: Option<String>,
    pub tier: ExtractionTier,
    /// Extraction confidence in [0, 1]. Reflects the tier that matched and
    /// whether dose, route, and frequency were all recovered.
    pub confidence: f64,
    pub extracted_at: NaiveDateTime,
}

/// Clinical context resolved from trigger words around the mention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextFlags {
    /// Explicitly stopped, discontinued, or denied.
    pub negated: bool,
    /// Mentioned as past use.
    pub historical: bool,
    /// Hedged: "might start", "considering".
    pub uncertain: bool,
}

impl MedicationMention {
    /// Active mentions are candidates for the current regimen.
    pub fn is_active(&self) -> bool {
        !self.context.negated && !self.context.historical
    }
}
