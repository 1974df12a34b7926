//! Tiered medication-mention extraction.
//!
//! Extractors implement one capability interface and are ranked by priority:
//! the dictionary tier (reference-table lexicon) outranks the pattern tier
//! (drug-name suffixes next to dose tokens). Per document, the first
//! available tier that yields any mention wins; results are never merged
//! across tiers. Unparseable lines are skipped, and an empty result is a
//! valid outcome, not an error.

pub mod context;
pub mod dictionary;
pub mod fields;
pub mod pattern;
pub mod span;

use uuid::Uuid;

use crate::models::{ExtractionTier, MedicationMention, SourceList};
use crate::reference::ReferenceData;

use context::detect_context;
use dictionary::DictionaryExtractor;
use fields::recover_fields;
use pattern::PatternExtractor;
use span::CandidateSpan;

/// One extraction tier. Implementations must be deterministic: identical
/// input text yields an identical mention sequence.
pub trait MentionExtractor: Send + Sync {
    fn tier(&self) -> ExtractionTier;
    fn is_available(&self) -> bool;
    fn extract(&self, text: &str, source: SourceList) -> Vec<MedicationMention>;
}

const CONFIDENCE_DICTIONARY: f64 = 0.9;
const CONFIDENCE_PATTERN: f64 = 0.7;
/// Deducted when any of dose, route, or frequency was not recovered.
const MISSING_FIELD_PENALTY: f64 = 0.1;

/// Assemble a mention from a resolved candidate span and its line.
/// Shared by all tiers so field recovery and context detection are uniform.
pub(crate) fn build_mention(
    line: &str,
    span: CandidateSpan,
    tier: ExtractionTier,
    source: SourceList,
) -> MedicationMention {
    // Dose, route, and frequency usually trail the drug name. Prefer the
    // tail of the line so neighbouring mentions on one line do not steal
    // each other's dose; fall back to the whole line per field.
    let tail = recover_fields(&line[span.end..]);
    let whole = recover_fields(line);

    let dose_raw = tail.dose.or(whole.dose);
    let route_raw = tail.route.or(whole.route);
    let frequency_raw = tail.frequency.or(whole.frequency);
    let form_raw = tail.form.or(whole.form);

    let base = match tier {
        ExtractionTier::Dictionary => CONFIDENCE_DICTIONARY,
        ExtractionTier::Pattern => CONFIDENCE_PATTERN,
    };
    let all_recovered = dose_raw.is_some() && route_raw.is_some() && frequency_raw.is_some();
    let confidence = if all_recovered {
        base
    } else {
        base - MISSING_FIELD_PENALTY
    };

    MedicationMention {
        id: Uuid::new_v4(),
        source,
        raw_text: line.to_string(),
        span_start: span.start,
        span_end: span.end,
        drug_raw: line[span.start..span.end].to_string(),
        dose_raw,
        route_raw,
        frequency_raw,
        form_raw,
        context: detect_context(line, &span),
        temporal_raw: whole.temporal,
        tier,
        confidence,
        extracted_at: chrono::Local::now().naive_local(),
    }
}

/// Ranked strategy over the available tiers.
pub struct TieredExtractor {
    tiers: Vec<Box<dyn MentionExtractor>>,
}

impl TieredExtractor {
    /// Build the standard ranking: dictionary first, pattern fallback.
    pub fn new(reference: &ReferenceData) -> Self {
        Self {
            tiers: vec![
                Box::new(DictionaryExtractor::new(reference)),
                Box::new(PatternExtractor),
            ],
        }
    }

    /// Extract mentions from one document using the first capable tier.
    pub fn extract(&self, text: &str, source: SourceList) -> Vec<MedicationMention> {
        for tier in &self.tiers {
            if !tier.is_available() {
                continue;
            }
            let mentions = tier.extract(text, source);
            if !mentions.is_empty() {
                tracing::debug!(
                    tier = tier.tier().as_str(),
                    source = source.as_str(),
                    count = mentions.len(),
                    "extraction tier selected"
                );
                return mentions;
            }
        }
        Vec::new()
    }
}
