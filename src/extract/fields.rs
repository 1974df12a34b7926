//! Shared field recovery: dose, route, frequency, form, and temporal
//! expressions are pulled from the mention's line with the same patterns
//! regardless of which tier produced the drug-name span.

use std::sync::LazyLock;

use regex::Regex;

static RE_DOSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:(½|1/2|half)\s*(?:of\s+(?:an?\s+)?)?)?(\d+(?:\.\d+)?)\s*(mg|mcg|g|ml|units?|iu|%)\b",
    )
    .unwrap()
});

static RE_ROUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(by mouth|orally|oral|po|intravenously|intravenous|iv|intramuscular|im|subcutaneously|subcutaneous|subcut|subq|sq|sublingual|sl|rectally|rectal|topically|topical|inhaled|inhalation)\b",
    )
    .unwrap()
});

static RE_FREQUENCY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(once daily|twice daily|once a day|twice a day|two times a day|three times (?:daily|a day)|four times daily|every \d+ hours|at bedtime|as needed|once weekly|qd|bid|tid|qid|qhs|qam|prn|q\d+h|daily|nightly|weekly)\b",
    )
    .unwrap()
});

static RE_FORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(tablet|tab|capsule|cap|injection|solution|cream|ointment|gel|patch|inhaler|drops)\b")
        .unwrap()
});

static RE_TEMPORAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b\d+\s+(?:day|week|month|year)s?\s+ago\b|\blast\s+(?:week|month|year)\b|\byesterday\b|\b(?:on\s+)?[A-Za-z]+\s+\d{1,2},?\s+\d{4}\b|\b\d{4}-\d{2}-\d{2}\b|\b\d{1,2}/\d{1,2}/\d{2,4}\b",
    )
    .unwrap()
});

/// Recovered free-text fields for one line.
#[derive(Debug, Default)]
pub struct LineFields {
    pub dose: Option<String>,
    pub route: Option<String>,
    pub frequency: Option<String>,
    pub form: Option<String>,
    pub temporal: Option<String>,
}

/// Pull dose/route/frequency/form/temporal strings out of a line.
/// First match wins for each field; nothing here fails.
pub fn recover_fields(line: &str) -> LineFields {
    LineFields {
        dose: RE_DOSE.find(line).map(|m| m.as_str().trim().to_string()),
        route: RE_ROUTE.find(line).map(|m| m.as_str().to_string()),
        frequency: RE_FREQUENCY.find(line).map(|m| m.as_str().to_string()),
        form: RE_FORM.find(line).map(|m| m.as_str().to_lowercase()),
        temporal: RE_TEMPORAL.find(line).map(|m| m.as_str().to_string()),
    }
}

/// The dose regex, shared with the normalizer's dose parsing.
pub fn dose_pattern() -> &'static Regex {
    &RE_DOSE
}
