//! Dictionary tier: case-insensitive matching against the drug lexicon
//! assembled from the reference tables.

use regex::Regex;

use crate::models::{ExtractionTier, MedicationMention, SourceList};
use crate::reference::ReferenceData;

use super::span::{resolve_overlaps, CandidateSpan};
use super::{build_mention, MentionExtractor};

pub struct DictionaryExtractor {
    /// Case-insensitive alternation over the lexicon, longest name first so
    /// "insulin glargine" outranks "insulin" at the same start. Matching the
    /// original line keeps every span a valid byte range into it; lowercasing
    /// a copy first would shift offsets whenever case folding changes byte
    /// length.
    matcher: Option<Regex>,
}

impl DictionaryExtractor {
    pub fn new(reference: &ReferenceData) -> Self {
        let mut names = reference.drug_lexicon();
        names.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));

        let matcher = if names.is_empty() {
            None
        } else {
            let alternation: Vec<String> = names.iter().map(|n| regex::escape(n)).collect();
            match Regex::new(&format!("(?i){}", alternation.join("|"))) {
                Ok(re) => Some(re),
                Err(err) => {
                    tracing::warn!(error = %err, "dictionary matcher build failed");
                    None
                }
            }
        };

        Self { matcher }
    }

    fn candidates_in(&self, line: &str) -> Vec<CandidateSpan> {
        let Some(matcher) = &self.matcher else {
            return Vec::new();
        };
        let candidates = matcher
            .find_iter(line)
            .filter(|m| word_bounded(line, m.start(), m.end()))
            .map(|m| CandidateSpan {
                start: m.start(),
                end: m.end(),
            })
            .collect();
        resolve_overlaps(candidates)
    }
}

/// Both neighbors of the match must be non-alphanumeric for it to count as
/// a whole-word hit ("aspirin" must not fire inside "aspirin-free" is fine,
/// but not inside "gaspirin").
fn word_bounded(text: &str, start: usize, end: usize) -> bool {
    let before_ok = start == 0
        || !text[..start]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric());
    let after_ok = end == text.len()
        || !text[end..].chars().next().is_some_and(|c| c.is_alphanumeric());
    before_ok && after_ok
}

impl MentionExtractor for DictionaryExtractor {
    fn tier(&self) -> ExtractionTier {
        ExtractionTier::Dictionary
    }

    fn is_available(&self) -> bool {
        self.matcher.is_some()
    }

    fn extract(&self, text: &str, source: SourceList) -> Vec<MedicationMention> {
        let mut mentions = Vec::new();
        for line in text.lines() {
            for span in self.candidates_in(line) {
                mentions.push(build_mention(line, span, self.tier(), source));
            }
        }
        mentions
    }
}
