//! Normalization: one mention in, one event out, no drops.
//!
//! Every field that fails to normalize degrades to "raw value + flag" so
//! downstream stages and reviewers can see the gap. The mapping is
//! idempotent: normalizing already-normal values is a no-op.

use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use crate::extract::fields::dose_pattern;
use crate::models::{Dose, DoseUnit, MedicationEvent, MedicationMention};
use crate::reference::ReferenceData;
use crate::temporal::TemporalParser;

static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

pub struct Normalizer<'a> {
    reference: &'a ReferenceData,
    temporal: &'a TemporalParser,
}

impl<'a> Normalizer<'a> {
    pub fn new(reference: &'a ReferenceData, temporal: &'a TemporalParser) -> Self {
        Self {
            reference,
            temporal,
        }
    }

    /// Project a mention into its normalized event.
    pub fn normalize(&self, mention: &MedicationMention) -> MedicationEvent {
        let (drug_name, not_in_reference) = self.normalize_drug(&mention.drug_raw);
        let drug_code = self
            .reference
            .concept_code(&drug_name)
            .map(str::to_string);

        let dose = mention.dose_raw.as_deref().and_then(parse_dose);
        let dose_unresolved = mention.dose_raw.is_some() && dose.is_none();

        let route = mention
            .route_raw
            .as_deref()
            .and_then(|r| self.reference.route_code(r));
        let route_unresolved = mention.route_raw.is_some() && route.is_none();

        let frequency = mention
            .frequency_raw
            .as_deref()
            .and_then(|f| self.reference.frequency_code(f));
        let frequency_unresolved = mention.frequency_raw.is_some() && frequency.is_none();

        let resolved_date = mention
            .temporal_raw
            .as_deref()
            .and_then(|t| self.temporal.resolve(t));

        if dose_unresolved || route_unresolved || frequency_unresolved || not_in_reference {
            tracing::debug!(
                drug = %drug_name,
                dose_unresolved,
                route_unresolved,
                frequency_unresolved,
                not_in_reference,
                "normalization left unresolved fields"
            );
        }

        MedicationEvent {
            id: Uuid::new_v4(),
            mention_id: mention.id,
            source: mention.source,
            drug_name,
            drug_code,
            not_in_reference,
            dose,
            dose_raw: mention.dose_raw.clone(),
            dose_unresolved,
            route,
            route_raw: mention.route_raw.clone(),
            route_unresolved,
            frequency,
            frequency_raw: mention.frequency_raw.clone(),
            frequency_unresolved,
            form: mention.form_raw.as_deref().map(str::to_lowercase),
            context: mention.context,
            resolved_date,
            temporal_raw: mention.temporal_raw.clone(),
        }
    }

    /// Lower-case, collapse whitespace, map brand to generic. Unmapped
    /// names pass through unchanged but flagged.
    fn normalize_drug(&self, raw: &str) -> (String, bool) {
        let cleaned = RE_WHITESPACE
            .replace_all(raw.trim(), " ")
            .to_lowercase();

        if let Some(generic) = self.reference.resolve_generic(&cleaned) {
            return (generic.to_string(), false);
        }

        let known = self.reference.knows_drug(&cleaned);
        (cleaned, !known)
    }
}

/// Parse a raw dose string. Mass units convert losslessly to mg
/// (g ×1000, mcg ÷1000); other units are kept as written. Fraction
/// prefixes become the dose multiplier. Anything else is unresolvable.
pub fn parse_dose(raw: &str) -> Option<Dose> {
    let caps = dose_pattern().captures(raw)?;
    let multiplier = if caps.get(1).is_some() { 0.5 } else { 1.0 };
    let magnitude: f64 = caps.get(2)?.as_str().parse().ok()?;

    let (magnitude, unit) = match caps.get(3)?.as_str().to_lowercase().as_str() {
        "mg" => (magnitude, DoseUnit::Milligram),
        "g" => (magnitude * 1000.0, DoseUnit::Milligram),
        "mcg" => (magnitude / 1000.0, DoseUnit::Milligram),
        "ml" => (magnitude, DoseUnit::Milliliter),
        "unit" | "units" => (magnitude, DoseUnit::Unit),
        "iu" => (magnitude, DoseUnit::InternationalUnit),
        "%" => (magnitude, DoseUnit::Percent),
        _ => return None,
    };

    Some(Dose {
        magnitude,
        unit,
        multiplier,
    })
}
