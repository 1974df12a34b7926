//! Regimen equivalence: are two events the same medication taken the same
//! way? Comparison is three-valued. Missing data yields `Unknown`, never a
//! guessed `Equivalent` or `Different`.

use serde::{Deserialize, Serialize};

use crate::models::{Dose, MedicationEvent};

/// Relative tolerance for comparing effective doses. Fraction multipliers
/// introduce floating-point noise ("½ of a 10mg" vs "5mg").
const DOSE_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoseEquivalence {
    Equivalent,
    Different,
    Unknown,
}

/// Field-by-field comparison of two events for the same drug question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimenComparison {
    /// How alike the two drug names are, in [0, 1].
    pub name_similarity: f64,
    pub dose: DoseEquivalence,
    /// Total daily exposure, folding in the frequency multiplier.
    pub daily_dose: DoseEquivalence,
    /// `None` when either side lacks a resolved route.
    pub route_match: Option<bool>,
    pub frequency_match: Option<bool>,
}

impl RegimenComparison {
    /// Whether nothing observed distinguishes the regimens. Unknown fields
    /// do not count against equivalence, they just were not observed.
    pub fn is_consistent(&self) -> bool {
        self.dose != DoseEquivalence::Different
            && self.daily_dose != DoseEquivalence::Different
            && self.route_match != Some(false)
            && self.frequency_match != Some(false)
    }
}

/// Compare effective doses (magnitude scaled by the fraction multiplier).
/// Unit mismatch is `Unknown`: mass units already share mg, and converting
/// across ml/units/iu would require concentration data we do not have.
pub fn compare_doses(a: Option<&Dose>, b: Option<&Dose>) -> DoseEquivalence {
    let (a, b) = match (a, b) {
        (Some(a), Some(b)) => (a, b),
        _ => return DoseEquivalence::Unknown,
    };
    if a.unit != b.unit {
        return DoseEquivalence::Unknown;
    }
    if approx_eq(a.effective(), b.effective()) {
        DoseEquivalence::Equivalent
    } else {
        DoseEquivalence::Different
    }
}

/// Compare total daily exposure: effective dose times doses-per-day.
/// PRN and missing frequencies have no daily multiplier, so `Unknown`.
pub fn compare_daily_doses(a: &MedicationEvent, b: &MedicationEvent) -> DoseEquivalence {
    let daily = |e: &MedicationEvent| -> Option<f64> {
        let dose = e.dose.as_ref()?;
        let per_day = e.frequency?.daily_multiplier()?;
        Some(dose.effective() * per_day)
    };

    match (a.dose.as_ref(), b.dose.as_ref()) {
        (Some(da), Some(db)) if da.unit != db.unit => return DoseEquivalence::Unknown,
        _ => {}
    }

    match (daily(a), daily(b)) {
        (Some(x), Some(y)) if approx_eq(x, y) => DoseEquivalence::Equivalent,
        (Some(_), Some(_)) => DoseEquivalence::Different,
        _ => DoseEquivalence::Unknown,
    }
}

/// Similarity of two normalized drug names in [0, 1]: exact match 1.0,
/// one containing the other 0.8, otherwise character-set Jaccard.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    if a.contains(&b) || b.contains(&a) {
        return 0.8;
    }

    let set_a: std::collections::HashSet<char> = a.chars().filter(|c| c.is_alphanumeric()).collect();
    let set_b: std::collections::HashSet<char> = b.chars().filter(|c| c.is_alphanumeric()).collect();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 0.0;
    }
    set_a.intersection(&set_b).count() as f64 / union as f64
}

/// Full regimen comparison between two events.
pub fn compare_regimens(a: &MedicationEvent, b: &MedicationEvent) -> RegimenComparison {
    let route_match = match (a.route, b.route) {
        (Some(x), Some(y)) => Some(x == y),
        _ => None,
    };
    let frequency_match = match (a.frequency, b.frequency) {
        (Some(x), Some(y)) => Some(x == y),
        _ => None,
    };

    RegimenComparison {
        name_similarity: name_similarity(&a.drug_name, &b.drug_name),
        dose: compare_doses(a.dose.as_ref(), b.dose.as_ref()),
        daily_dose: compare_daily_doses(a, b),
        route_match,
        frequency_match,
    }
}

fn approx_eq(x: f64, y: f64) -> bool {
    let scale = x.abs().max(y.abs()).max(1.0);
    (x - y).abs() <= DOSE_TOLERANCE * scale
}
