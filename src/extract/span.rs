//! Candidate span handling for the extractors.

/// A candidate drug-name span within one line, in character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateSpan {
    pub start: usize,
    pub end: usize,
}

impl CandidateSpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &CandidateSpan) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Resolve overlapping candidates: longest match wins, ties go to the
/// earliest-starting span. The survivors come back in document order.
pub fn resolve_overlaps(mut candidates: Vec<CandidateSpan>) -> Vec<CandidateSpan> {
    candidates.sort_by(|a, b| b.len().cmp(&a.len()).then(a.start.cmp(&b.start)));

    let mut kept: Vec<CandidateSpan> = Vec::new();
    for candidate in candidates {
        if !kept.iter().any(|k| k.overlaps(&candidate)) {
            kept.push(candidate);
        }
    }

    kept.sort_by_key(|s| s.start);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: usize, end: usize) -> CandidateSpan {
        CandidateSpan { start, end }
    }

    #[test]
    fn longest_match_wins() {
        // "insulin" vs "insulin glargine" over the same region
        let kept = resolve_overlaps(vec![span(0, 7), span(0, 16)]);
        assert_eq!(kept, vec![span(0, 16)]);
    }

    #[test]
    fn tie_resolves_to_earliest_start() {
        let kept = resolve_overlaps(vec![span(4, 8), span(2, 6)]);
        assert_eq!(kept, vec![span(2, 6)]);
    }

    #[test]
    fn disjoint_spans_all_survive_in_order() {
        let kept = resolve_overlaps(vec![span(10, 14), span(0, 5)]);
        assert_eq!(kept, vec![span(0, 5), span(10, 14)]);
    }
}
