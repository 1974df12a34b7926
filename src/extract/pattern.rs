//! Pattern tier: fallback extraction keyed on common drug-name endings
//! adjacent to a dose token. Runs only when the dictionary tier is
//! unavailable or found nothing in the document.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{ExtractionTier, MedicationMention, SourceList};

use super::span::{resolve_overlaps, CandidateSpan};
use super::{build_mention, MentionExtractor};

/// A word carrying a typical medication suffix, immediately followed by a
/// dose token. The suffix list is curated, not exhaustive: the tier trades
/// recall for zero dependency on reference data.
static RE_CANDIDATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b([A-Za-z][A-Za-z-]+(?:ol|in|il|ide|ine|ate|one|pril|sartan|statin|formin|cycline|cillin|azole|zepam|prazole|mycin|dipine|olol|oxetine|parin))\s+(?:(?:½|1/2|half)\s*(?:of\s+(?:an?\s+)?)?)?\d+(?:\.\d+)?\s*(?:mg|mcg|g|ml|units?|iu)\b",
    )
    .unwrap()
});

pub struct PatternExtractor;

impl PatternExtractor {
    fn candidates_in(line: &str) -> Vec<CandidateSpan> {
        let candidates = RE_CANDIDATE
            .captures_iter(line)
            .filter_map(|caps| caps.get(1))
            .map(|m| CandidateSpan {
                start: m.start(),
                end: m.end(),
            })
            .collect();
        resolve_overlaps(candidates)
    }
}

impl MentionExtractor for PatternExtractor {
    fn tier(&self) -> ExtractionTier {
        ExtractionTier::Pattern
    }

    fn is_available(&self) -> bool {
        true
    }

    fn extract(&self, text: &str, source: SourceList) -> Vec<MedicationMention> {
        let mut mentions = Vec::new();
        for line in text.lines() {
            for span in Self::candidates_in(line) {
                mentions.push(build_mention(line, span, self.tier(), source));
            }
        }
        mentions
    }
}
