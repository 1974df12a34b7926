//! Pipeline configuration, constructed once by the caller and passed in.
//! No process-wide toggles.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Anchors relative temporal expressions (the encounter or report date).
    pub reference_date: NaiveDate,
    /// When set, pending ledger entries resolve to `Unresolved` without
    /// consulting the external reasoner. Used for dry runs and tests.
    pub skip_external_reasoning: bool,
}

impl PipelineConfig {
    pub fn new(reference_date: NaiveDate) -> Self {
        Self {
            reference_date,
            skip_external_reasoning: false,
        }
    }

    pub fn skip_external_reasoning(mut self, skip: bool) -> Self {
        self.skip_external_reasoning = skip;
        self
    }
}
