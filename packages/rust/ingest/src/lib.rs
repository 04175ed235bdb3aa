//! Ingestion core: normalization, reconciliation, lifecycle sweep, and the
//! run orchestrator.
//!
//! One ingestion cycle fans out over the enabled source adapters, normalizes
//! whatever they return, reconciles each candidate against the catalog by its
//! identity key, then sweeps expired and stale records. The orchestrator in
//! [`run`] ties the stages together; each stage is independently testable.

mod normalize;
mod reconcile;
mod run;
mod sweep;

pub use normalize::normalize;
pub use reconcile::{ReconcileOutcome, reconcile};
pub use run::{Ingestor, RunReport, SourceOutcome};
pub use sweep::{SweepStats, sweep};
