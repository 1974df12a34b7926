//! Temporal expression resolution.
//!
//! Resolves relative ("3 weeks ago") and absolute ("10/19/2025",
//! "January 15, 2025") expressions against a reference date. Resolution
//! failure is a normal outcome: clinical prose is full of decorative
//! phrasing, so a malformed expression resolves to `None` and the raw text
//! stays on the event. This module never returns an error and never panics.

use std::sync::LazyLock;

use chrono::{Duration, Months, NaiveDate};
use regex::Regex;

static RE_AGO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d+)\s+(day|week|month|year)s?\s+ago\b").unwrap());

static RE_LAST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\blast\s+(week|month|year)\b").unwrap());

static RE_US_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{2,4})\b").unwrap());

pub struct TemporalParser {
    reference_date: NaiveDate,
}

impl TemporalParser {
    /// `reference_date` anchors relative expressions (the encounter or
    /// report date).
    pub fn new(reference_date: NaiveDate) -> Self {
        Self { reference_date }
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    /// Resolve a raw temporal expression to a date, or `None`.
    pub fn resolve(&self, raw: &str) -> Option<NaiveDate> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        self.resolve_relative(trimmed)
            .or_else(|| resolve_absolute(trimmed))
    }

    fn resolve_relative(&self, raw: &str) -> Option<NaiveDate> {
        if let Some(caps) = RE_AGO.captures(raw) {
            let count: u32 = caps.get(1)?.as_str().parse().ok()?;
            let unit = caps.get(2)?.as_str().to_lowercase();
            return match unit.as_str() {
                "day" => self
                    .reference_date
                    .checked_sub_signed(Duration::days(i64::from(count))),
                "week" => self
                    .reference_date
                    .checked_sub_signed(Duration::days(i64::from(count) * 7)),
                "month" => self.reference_date.checked_sub_months(Months::new(count)),
                "year" => self
                    .reference_date
                    .checked_sub_months(Months::new(count.checked_mul(12)?)),
                _ => None,
            };
        }

        if let Some(caps) = RE_LAST.captures(raw) {
            return match caps.get(1)?.as_str().to_lowercase().as_str() {
                "week" => self.reference_date.checked_sub_signed(Duration::days(7)),
                "month" => self.reference_date.checked_sub_months(Months::new(1)),
                "year" => self.reference_date.checked_sub_months(Months::new(12)),
                _ => None,
            };
        }

        if raw.eq_ignore_ascii_case("yesterday") {
            return self.reference_date.checked_sub_signed(Duration::days(1));
        }
        if raw.eq_ignore_ascii_case("today") {
            return Some(self.reference_date);
        }

        None
    }
}

fn resolve_absolute(raw: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }

    if let Some(caps) = RE_US_DATE.captures(raw) {
        let month: u32 = caps.get(1)?.as_str().parse().ok()?;
        let day: u32 = caps.get(2)?.as_str().parse().ok()?;
        let mut year: i32 = caps.get(3)?.as_str().parse().ok()?;
        if year < 100 {
            year += 2000;
        }
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    // Month-name formats, with and without comma, long and abbreviated.
    let candidate = raw.trim_start_matches("on ").trim();
    for format in ["%B %d, %Y", "%B %d %Y", "%b %d, %Y", "%b %d %Y", "%d %B %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(candidate, format) {
            return Some(date);
        }
    }

    None
}
