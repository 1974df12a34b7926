//! Context detection: negation, historicity, and uncertainty triggers
//! scanned in a bounded token window around each candidate span.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::ContextFlags;

use super::span::CandidateSpan;

/// Tokens scanned before the mention for any trigger category.
const WINDOW_BEFORE: usize = 6;
/// Tokens scanned after the mention, negation only ("aspirin was stopped").
const NEGATION_WINDOW_AFTER: usize = 4;

const NEGATION_TRIGGERS: &[&str] = &[
    "stopped",
    "stopped taking",
    "discontinued",
    "no longer",
    "d/c",
    "quit",
    "ceased",
    "denies",
    "discontinue",
    "held",
];

const HISTORICAL_TRIGGERS: &[&str] = &[
    "previously",
    "in the past",
    "used to take",
    "history of",
    "formerly",
];

const UNCERTAIN_TRIGGERS: &[&str] = &[
    "might",
    "may start",
    "maybe",
    "considering",
    "consider",
    "possible",
    "possibly",
    "perhaps",
    "unsure",
];

static RE_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\w½/-]+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TriggerKind {
    Negation,
    Historical,
    Uncertain,
}

struct Token {
    start: usize,
    lower: String,
}

fn tokenize(line: &str) -> Vec<Token> {
    RE_TOKEN
        .find_iter(line)
        .map(|m| Token {
            start: m.start(),
            lower: m.as_str().to_lowercase(),
        })
        .collect()
}

/// Token indices where a (possibly multi-word) trigger matches.
fn trigger_positions(tokens: &[Token], trigger: &str) -> Vec<(usize, usize)> {
    let words: Vec<&str> = trigger.split_whitespace().collect();
    let mut hits = Vec::new();
    for i in 0..tokens.len() {
        if i + words.len() > tokens.len() {
            break;
        }
        if words
            .iter()
            .enumerate()
            .all(|(j, w)| tokens[i + j].lower == *w)
        {
            hits.push((i, i + words.len() - 1));
        }
    }
    hits
}

/// Resolve context flags for one candidate span within its line.
///
/// Each category has a fixed trigger vocabulary. Only tokens inside the
/// window count; when triggers of different categories compete, the one
/// nearest to the mention wins (exact ties set both flags).
pub fn detect_context(line: &str, span: &CandidateSpan) -> ContextFlags {
    let tokens = tokenize(line);
    if tokens.is_empty() {
        return ContextFlags::default();
    }

    // Token indices covering the mention span.
    let first = tokens
        .iter()
        .position(|t| t.start + t.lower.len() > span.start)
        .unwrap_or(0);
    let last = tokens
        .iter()
        .rposition(|t| t.start < span.end)
        .unwrap_or(first);

    let mut hits: Vec<(usize, TriggerKind)> = Vec::new();
    let categories = [
        (TriggerKind::Negation, NEGATION_TRIGGERS),
        (TriggerKind::Historical, HISTORICAL_TRIGGERS),
        (TriggerKind::Uncertain, UNCERTAIN_TRIGGERS),
    ];

    for (kind, triggers) in categories {
        for trigger in triggers {
            for (t_start, t_end) in trigger_positions(&tokens, trigger) {
                if t_end < first {
                    let distance = first - t_end;
                    if distance <= WINDOW_BEFORE {
                        hits.push((distance, kind));
                    }
                } else if t_start > last && kind == TriggerKind::Negation {
                    let distance = t_start - last;
                    if distance <= NEGATION_WINDOW_AFTER {
                        hits.push((distance, kind));
                    }
                }
            }
        }
    }

    let Some(nearest) = hits.iter().map(|(d, _)| *d).min() else {
        return ContextFlags::default();
    };

    let mut flags = ContextFlags::default();
    for (distance, kind) in hits {
        if distance == nearest {
            match kind {
                TriggerKind::Negation => flags.negated = true,
                TriggerKind::Historical => flags.historical = true,
                TriggerKind::Uncertain => flags.uncertain = true,
            }
        }
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span_of(line: &str, word: &str) -> CandidateSpan {
        let start = line.find(word).unwrap();
        CandidateSpan {
            start,
            end: start + word.len(),
        }
    }

    #[test]
    fn stopped_before_mention_negates() {
        let line = "Patient stopped aspirin 3 weeks ago";
        let flags = detect_context(line, &span_of(line, "aspirin"));
        assert!(flags.negated);
        assert!(!flags.historical);
        assert!(!flags.uncertain);
    }

    #[test]
    fn negation_trigger_after_mention() {
        let line = "aspirin was stopped due to GI upset";
        let flags = detect_context(line, &span_of(line, "aspirin"));
        assert!(flags.negated);
    }

    #[test]
    fn uncertainty_trigger() {
        let line = "we might start insulin glargine 10 units";
        let flags = detect_context(line, &span_of(line, "insulin glargine"));
        assert!(flags.uncertain);
        assert!(!flags.negated);
    }

    #[test]
    fn historical_trigger() {
        let line = "previously on metformin 500mg";
        let flags = detect_context(line, &span_of(line, "metformin"));
        assert!(flags.historical);
    }

    #[test]
    fn nearest_trigger_wins() {
        // "considering" is 4 tokens out, "stopped" is adjacent.
        let line = "considering alternatives, patient stopped warfarin";
        let flags = detect_context(line, &span_of(line, "warfarin"));
        assert!(flags.negated);
        assert!(!flags.uncertain);
    }

    #[test]
    fn trigger_outside_window_is_ignored() {
        let line = "stopped smoking last year and now also takes daily low dose aspirin 81mg";
        let flags = detect_context(line, &span_of(line, "aspirin"));
        assert!(!flags.negated);
    }

    #[test]
    fn no_trigger_no_flags() {
        let line = "continue metformin 500mg PO BID";
        let flags = detect_context(line, &span_of(line, "metformin"));
        assert_eq!(flags, ContextFlags::default());
    }
}
