//! Static reference tables shared read-only across concurrent requests.
//!
//! Loaded once at process start from JSON files; never mutated afterwards.
//! Absence of an entry is never an error at lookup time; callers degrade to
//! flags or skip the check that needed the entry.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{FrequencyCode, RouteCode, Severity};

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("Reference data load failed ({0}): {1}")]
    Load(String, String),

    #[error("Reference data parse failed ({0}): {1}")]
    Parse(String, String),
}

/// A generic drug concept, optionally carrying a canonical code (RxNorm CUI).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrugConcept {
    pub name: String,
    pub rxnorm_cui: Option<String>,
}

/// Brand-to-generic medication mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicationAlias {
    pub brand_name: String,
    pub generic_name: String,
}

/// Drugs sharing a clinical effect, for duplication detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TherapeuticClass {
    pub name: String,
    pub members: Vec<String>,
}

/// A severity-tagged interaction pair. Either side may name a single generic
/// or a therapeutic class ("warfarin" x "nsaid").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionRule {
    pub a: String,
    pub b: String,
    pub severity: Severity,
    pub risk: String,
}

/// Minimum kidney function below which a drug (or class) is contraindicated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenalThreshold {
    /// Generic name or therapeutic class name.
    pub name: String,
    pub min_egfr: f64,
    pub reason: String,
}

/// Loaded reference data for normalization and safety checks.
#[derive(Debug)]
pub struct ReferenceData {
    pub concepts: Vec<DrugConcept>,
    pub aliases: Vec<MedicationAlias>,
    pub route_synonyms: HashMap<String, String>,
    pub frequency_synonyms: HashMap<String, String>,
    pub classes: Vec<TherapeuticClass>,
    pub interactions: Vec<InteractionRule>,
    pub renal_thresholds: Vec<RenalThreshold>,
}

fn read_json<T: serde::de::DeserializeOwned>(dir: &Path, file: &str) -> Result<T, ReferenceError> {
    let path = dir.join(file);
    let json = std::fs::read_to_string(&path)
        .map_err(|e| ReferenceError::Load(path.display().to_string(), e.to_string()))?;
    serde_json::from_str(&json).map_err(|e| ReferenceError::Parse(file.into(), e.to_string()))
}

impl ReferenceData {
    /// Load all tables from JSON files in `resources_dir`.
    pub fn load(resources_dir: &Path) -> Result<Self, ReferenceError> {
        let data = Self {
            concepts: read_json(resources_dir, "drug_concepts.json")?,
            aliases: read_json(resources_dir, "brand_generic.json")?,
            route_synonyms: read_json(resources_dir, "route_synonyms.json")?,
            frequency_synonyms: read_json(resources_dir, "frequency_synonyms.json")?,
            classes: read_json(resources_dir, "therapeutic_classes.json")?,
            interactions: read_json(resources_dir, "interactions.json")?,
            renal_thresholds: read_json(resources_dir, "renal_thresholds.json")?,
        };
        tracing::info!(
            concepts = data.concepts.len(),
            aliases = data.aliases.len(),
            classes = data.classes.len(),
            interactions = data.interactions.len(),
            "reference tables loaded"
        );
        Ok(data)
    }

    /// Look up the generic name for a brand name.
    pub fn resolve_generic(&self, brand_name: &str) -> Option<&str> {
        let lower = brand_name.to_lowercase();
        self.aliases
            .iter()
            .find(|a| a.brand_name.to_lowercase() == lower)
            .map(|a| a.generic_name.as_str())
    }

    /// Canonical code for a generic name, when the concept table carries one.
    pub fn concept_code(&self, generic_name: &str) -> Option<&str> {
        self.concepts
            .iter()
            .find(|c| c.name == generic_name)
            .and_then(|c| c.rxnorm_cui.as_deref())
    }

    /// Whether a lower-cased name appears anywhere in the reference tables
    /// (generic concept, brand, or class member).
    pub fn knows_drug(&self, name: &str) -> bool {
        self.concepts.iter().any(|c| c.name == name)
            || self
                .aliases
                .iter()
                .any(|a| a.brand_name.to_lowercase() == name || a.generic_name == name)
            || self
                .classes
                .iter()
                .any(|c| c.members.iter().any(|m| m == name))
    }

    /// Every name the dictionary extractor should match against.
    pub fn drug_lexicon(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        names.extend(self.concepts.iter().map(|c| c.name.as_str()));
        names.extend(self.aliases.iter().map(|a| a.brand_name.as_str()));
        names.extend(self.aliases.iter().map(|a| a.generic_name.as_str()));
        names.extend(
            self.classes
                .iter()
                .flat_map(|c| c.members.iter().map(|m| m.as_str())),
        );
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Map a raw route phrase to its code via the synonym table.
    pub fn route_code(&self, raw: &str) -> Option<RouteCode> {
        let lower = raw.trim().to_lowercase();
        let mapped = self.route_synonyms.get(&lower).map(String::as_str);
        match mapped {
            Some(code) => RouteCode::from_str(code).ok(),
            // Raw text may already be a code ("PO").
            None => RouteCode::from_str(&lower.to_uppercase()).ok(),
        }
    }

    /// Map a raw frequency phrase to its code via the synonym table.
    pub fn frequency_code(&self, raw: &str) -> Option<FrequencyCode> {
        let lower = raw.trim().to_lowercase();
        let mapped = self.frequency_synonyms.get(&lower).map(String::as_str);
        match mapped {
            Some(code) => FrequencyCode::from_str(code).ok(),
            None => FrequencyCode::from_str(&lower.to_uppercase()).ok(),
        }
    }

    /// Therapeutic classes the generic belongs to.
    pub fn classes_of(&self, generic_name: &str) -> Vec<&TherapeuticClass> {
        self.classes
            .iter()
            .filter(|c| c.members.iter().any(|m| m == generic_name))
            .collect()
    }

    /// Whether `generic_name` satisfies an interaction/threshold side: equal
    /// to the name, or a member of the class it names.
    pub fn matches_drug_or_class(&self, side: &str, generic_name: &str) -> bool {
        if side == generic_name {
            return true;
        }
        self.classes
            .iter()
            .any(|c| c.name == side && c.members.iter().any(|m| m == generic_name))
    }

    /// Create reference data for tests (no file I/O).
    pub fn load_test() -> Self {
        let concept = |name: &str, cui: Option<&str>| DrugConcept {
            name: name.into(),
            rxnorm_cui: cui.map(Into::into),
        };
        let alias = |brand: &str, generic: &str| MedicationAlias {
            brand_name: brand.into(),
            generic_name: generic.into(),
        };

        Self {
            concepts: vec![
                concept("metformin", Some("6809")),
                concept("lisinopril", Some("29046")),
                concept("aspirin", Some("1191")),
                concept("atorvastatin", Some("83367")),
                concept("warfarin", Some("11289")),
                concept("insulin glargine", Some("274783")),
                concept("acetaminophen", Some("161")),
                concept("furosemide", Some("4603")),
                concept("levothyroxine", Some("10582")),
                concept("omeprazole", Some("7646")),
                concept("methotrexate", Some("6851")),
                concept("dabigatran", None),
                concept("clopidogrel", Some("32968")),
            ],
            aliases: vec![
                alias("Tylenol", "acetaminophen"),
                alias("Motrin", "ibuprofen"),
                alias("Advil", "ibuprofen"),
                alias("Lasix", "furosemide"),
                alias("Glucophage", "metformin"),
                alias("Lipitor", "atorvastatin"),
                alias("Zocor", "simvastatin"),
                alias("Prilosec", "omeprazole"),
                alias("Synthroid", "levothyroxine"),
                alias("Coumadin", "warfarin"),
                alias("Plavix", "clopidogrel"),
                alias("Zoloft", "sertraline"),
            ],
            route_synonyms: [
                ("po", "PO"),
                ("by mouth", "PO"),
                ("oral", "PO"),
                ("orally", "PO"),
                ("iv", "IV"),
                ("intravenous", "IV"),
                ("intravenously", "IV"),
                ("im", "IM"),
                ("intramuscular", "IM"),
                ("sq", "SC"),
                ("subq", "SC"),
                ("subcut", "SC"),
                ("subcutaneous", "SC"),
                ("subcutaneously", "SC"),
                ("sl", "SL"),
                ("sublingual", "SL"),
                ("pr", "PR"),
                ("rectal", "PR"),
                ("rectally", "PR"),
                ("topical", "TOP"),
                ("topically", "TOP"),
                ("inhaled", "INH"),
                ("inhalation", "INH"),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
            frequency_synonyms: [
                ("qd", "QD"),
                ("daily", "QD"),
                ("once daily", "QD"),
                ("once a day", "QD"),
                ("every day", "QD"),
                ("bid", "BID"),
                ("twice daily", "BID"),
                ("twice a day", "BID"),
                ("two times a day", "BID"),
                ("tid", "TID"),
                ("three times daily", "TID"),
                ("three times a day", "TID"),
                ("qid", "QID"),
                ("four times daily", "QID"),
                ("qhs", "QHS"),
                ("at bedtime", "QHS"),
                ("nightly", "QHS"),
                ("qam", "QAM"),
                ("in the morning", "QAM"),
                ("prn", "PRN"),
                ("as needed", "PRN"),
                ("q4h", "Q4H"),
                ("every 4 hours", "Q4H"),
                ("q6h", "Q6H"),
                ("every 6 hours", "Q6H"),
                ("q8h", "Q8H"),
                ("every 8 hours", "Q8H"),
                ("q12h", "Q12H"),
                ("every 12 hours", "Q12H"),
                ("weekly", "QWK"),
                ("once weekly", "QWK"),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
            classes: vec![
                TherapeuticClass {
                    name: "nsaid".into(),
                    members: vec![
                        "ibuprofen".into(),
                        "naproxen".into(),
                        "ketorolac".into(),
                        "diclofenac".into(),
                        "meloxicam".into(),
                        "celecoxib".into(),
                    ],
                },
                TherapeuticClass {
                    name: "ssri".into(),
                    members: vec![
                        "fluoxetine".into(),
                        "sertraline".into(),
                        "citalopram".into(),
                        "escitalopram".into(),
                        "paroxetine".into(),
                    ],
                },
                TherapeuticClass {
                    name: "statin".into(),
                    members: vec![
                        "atorvastatin".into(),
                        "simvastatin".into(),
                        "rosuvastatin".into(),
                        "pravastatin".into(),
                    ],
                },
                TherapeuticClass {
                    name: "ppi".into(),
                    members: vec![
                        "omeprazole".into(),
                        "pantoprazole".into(),
                        "esomeprazole".into(),
                        "lansoprazole".into(),
                    ],
                },
                TherapeuticClass {
                    name: "maoi".into(),
                    members: vec![
                        "phenelzine".into(),
                        "tranylcypromine".into(),
                        "selegiline".into(),
                    ],
                },
            ],
            interactions: vec![
                InteractionRule {
                    a: "warfarin".into(),
                    b: "nsaid".into(),
                    severity: Severity::High,
                    risk: "Major bleeding".into(),
                },
                InteractionRule {
                    a: "warfarin".into(),
                    b: "aspirin".into(),
                    severity: Severity::High,
                    risk: "Major bleeding".into(),
                },
                InteractionRule {
                    a: "methotrexate".into(),
                    b: "nsaid".into(),
                    severity: Severity::High,
                    risk: "Methotrexate toxicity".into(),
                },
                InteractionRule {
                    a: "ssri".into(),
                    b: "maoi".into(),
                    severity: Severity::High,
                    risk: "Serotonin syndrome".into(),
                },
            ],
            renal_thresholds: vec![
                RenalThreshold {
                    name: "metformin".into(),
                    min_egfr: 30.0,
                    reason: "Lactic acidosis risk".into(),
                },
                RenalThreshold {
                    name: "nsaid".into(),
                    min_egfr: 30.0,
                    reason: "Acute kidney injury risk".into(),
                },
                RenalThreshold {
                    name: "dabigatran".into(),
                    min_egfr: 30.0,
                    reason: "Increased bleeding risk".into(),
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn resolve_generic_glucophage() {
        let reference = ReferenceData::load_test();
        assert_eq!(reference.resolve_generic("Glucophage"), Some("metformin"));
    }

    #[test]
    fn resolve_generic_case_insensitive() {
        let reference = ReferenceData::load_test();
        assert_eq!(reference.resolve_generic("glucophage"), Some("metformin"));
        assert_eq!(reference.resolve_generic("LIPITOR"), Some("atorvastatin"));
    }

    #[test]
    fn resolve_generic_unknown() {
        let reference = ReferenceData::load_test();
        assert_eq!(reference.resolve_generic("UnknownBrand"), None);
    }

    #[test]
    fn route_code_synonyms_and_codes() {
        let reference = ReferenceData::load_test();
        assert_eq!(reference.route_code("by mouth"), Some(RouteCode::Oral));
        assert_eq!(reference.route_code("PO"), Some(RouteCode::Oral));
        assert_eq!(reference.route_code("intravenous"), Some(RouteCode::Intravenous));
        assert_eq!(reference.route_code("transdermal patch"), None);
    }

    #[test]
    fn frequency_code_synonyms() {
        let reference = ReferenceData::load_test();
        assert_eq!(reference.frequency_code("twice daily"), Some(FrequencyCode::TwiceDaily));
        assert_eq!(reference.frequency_code("BID"), Some(FrequencyCode::TwiceDaily));
        assert_eq!(reference.frequency_code("every 12 hours"), Some(FrequencyCode::Every12Hours));
        assert_eq!(reference.frequency_code("whenever convenient"), None);
    }

    #[test]
    fn classes_of_ibuprofen() {
        let reference = ReferenceData::load_test();
        let classes = reference.classes_of("ibuprofen");
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].name, "nsaid");
    }

    #[test]
    fn matches_class_side() {
        let reference = ReferenceData::load_test();
        assert!(reference.matches_drug_or_class("nsaid", "naproxen"));
        assert!(reference.matches_drug_or_class("warfarin", "warfarin"));
        assert!(!reference.matches_drug_or_class("nsaid", "metformin"));
    }

    #[test]
    fn knows_drug_covers_brands_and_members() {
        let reference = ReferenceData::load_test();
        assert!(reference.knows_drug("metformin"));
        assert!(reference.knows_drug("tylenol"));
        assert!(reference.knows_drug("naproxen"));
        assert!(!reference.knows_drug("unobtainium"));
    }

    #[test]
    fn load_from_json_files() {
        let dir = tempfile::tempdir().unwrap();
        let write = |name: &str, body: &str| {
            let mut f = std::fs::File::create(dir.path().join(name)).unwrap();
            f.write_all(body.as_bytes()).unwrap();
        };
        write(
            "drug_concepts.json",
            r#"[{"name":"metformin","rxnorm_cui":"6809"}]"#,
        );
        write(
            "brand_generic.json",
            r#"[{"brand_name":"Glucophage","generic_name":"metformin"}]"#,
        );
        write("route_synonyms.json", r#"{"by mouth":"PO"}"#);
        write("frequency_synonyms.json", r#"{"bid":"BID"}"#);
        write(
            "therapeutic_classes.json",
            r#"[{"name":"nsaid","members":["ibuprofen","naproxen"]}]"#,
        );
        write(
            "interactions.json",
            r#"[{"a":"warfarin","b":"nsaid","severity":"high","risk":"Major bleeding"}]"#,
        );
        write(
            "renal_thresholds.json",
            r#"[{"name":"metformin","min_egfr":30.0,"reason":"Lactic acidosis risk"}]"#,
        );

        let reference = ReferenceData::load(dir.path()).unwrap();
        assert_eq!(reference.resolve_generic("Glucophage"), Some("metformin"));
        assert_eq!(reference.concept_code("metformin"), Some("6809"));
        assert_eq!(reference.interactions[0].severity, Severity::High);
    }

    #[test]
    fn load_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = ReferenceData::load(dir.path()).unwrap_err();
        assert!(matches!(err, ReferenceError::Load(_, _)));
    }
}
