use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{FrequencyCode, RouteCode, SourceList};
use super::mention::ContextFlags;

/// Normalized projection of one [`MedicationMention`](super::MedicationMention).
///
/// Created by the normalizer, one-to-one with its mention, enriched only by
/// the normalizer and equivalence engine. Fields that could not be resolved
/// keep their raw value alongside a flag; normalization never drops data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicationEvent {
    pub id: Uuid,
    /// Link back to the originating mention.
    pub mention_id: Uuid,
    pub source: SourceList,
    /// Canonical generic drug name, lower-cased.
    pub drug_name: String,
    /// Reference-table code for the drug, when the table carries one.
    pub drug_code: Option<String>,
    /// True when the drug name was not found in the reference tables and
    /// passed through unchanged.
    pub not_in_reference: bool,
    pub dose: Option<Dose>,
    /// Raw dose string kept verbatim when the dose could not be resolved.
    pub dose_raw: Option<String>,
    pub dose_unresolved: bool,
    pub route: Option<RouteCode>,
    pub route_raw: Option<String>,
    pub route_unresolved: bool,
    pub frequency: Option<FrequencyCode>,
    pub frequency_raw: Option<String>,
    pub frequency_unresolved: bool,
    pub form: Option<String>,
    pub context: ContextFlags,
    /// Resolved ISO date for the attached temporal expression, if any.
    pub resolved_date: Option<NaiveDate>,
    pub temporal_raw: Option<String>,
}

/// A resolved dose: numeric magnitude, unit, and the fraction multiplier
/// carried by expressions like "½ of a 10 mg tablet" (multiplier 0.5).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dose {
    pub magnitude: f64,
    pub unit: DoseUnit,
    pub multiplier: f64,
}

impl Dose {
    /// Clinically effective dose: magnitude scaled by the split multiplier.
    pub fn effective(&self) -> f64 {
        self.magnitude * self.multiplier
    }
}

/// Dose units the normalizer recognizes. Mass units are stored in mg after
/// lossless conversion (g ×1000, mcg ÷1000); the rest stay as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoseUnit {
    Milligram,
    Milliliter,
    Unit,
    InternationalUnit,
    Percent,
}

impl DoseUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Milligram => "mg",
            Self::Milliliter => "ml",
            Self::Unit => "units",
            Self::InternationalUnit => "iu",
            Self::Percent => "%",
        }
    }
}

impl MedicationEvent {
    /// Active events participate in safety checks.
    pub fn is_active(&self) -> bool {
        !self.context.negated && !self.context.historical
    }
}

/// Ordered collection of events sharing a source tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicationList {
    pub source: SourceList,
    pub events: Vec<MedicationEvent>,
}

impl MedicationList {
    pub fn new(source: SourceList) -> Self {
        Self {
            source,
            events: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events that are neither negated nor historical.
    pub fn active(&self) -> impl Iterator<Item = &MedicationEvent> {
        self.events.iter().filter(|e| e.is_active())
    }

    /// Explicitly stopped or denied events.
    pub fn discontinued(&self) -> impl Iterator<Item = &MedicationEvent> {
        self.events.iter().filter(|e| e.context.negated)
    }

    /// Events flagged with uncertainty markers.
    pub fn uncertain(&self) -> impl Iterator<Item = &MedicationEvent> {
        self.events.iter().filter(|e| e.context.uncertain)
    }
}
