//! Medication reconciliation core: extracts medication mentions from prior
//! and current free-text lists, normalizes them against static reference
//! tables, runs safety checks, and tracks every mention in a completeness
//! ledger through to a terminal disposition.
//!
//! The pipeline performs no I/O after reference data is loaded; a run is
//! deterministic for a given input and configuration. Callers plug an
//! external reasoning collaborator in behind [`ReconciliationReasoner`].

pub mod config;
pub mod equivalence;
pub mod extract;
pub mod ledger;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod reference;
pub mod safety;
pub mod temporal;

pub use config::PipelineConfig;
pub use ledger::{Ledger, LedgerEntry, LedgerError, LedgerStatus};
pub use pipeline::{
    Disposition, PipelineError, ReasonedDecision, ReasonerError, ReconciliationOutcome,
    ReconciliationPipeline, ReconciliationReasoner,
};
pub use reference::{ReferenceData, ReferenceError};
pub use safety::{IssueKind, PatientContext, SafetyIssue};

use tracing_subscriber::EnvFilter;

/// Initialize tracing for binaries and integration harnesses.
/// `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("medrec=info")),
        )
        .init();
}
