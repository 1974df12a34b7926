//! Core data model: raw mentions, normalized events, and shared enums.

pub mod enums;
pub mod event;
pub mod mention;

pub use enums::{
    ExtractionTier, FrequencyCode, InvalidEnumValue, RouteCode, Severity, SourceList,
};
pub use event::{Dose, DoseUnit, MedicationEvent, MedicationList};
pub use mention::{ContextFlags, MedicationMention};
