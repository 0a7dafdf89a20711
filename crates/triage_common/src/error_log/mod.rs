//! Error Log - run-scoped incident aggregation
//!
//! Every failure or notable condition seen during a diagnostic run ends up
//! here as an [`Incident`]:
//! - failed fact-gathering operations (via `SafeExecutor`)
//! - exhausted fallback chains (via `MultiStrategyCollector`)
//! - threshold breaches (via `Classifier`)
//!
//! The log is owned by the run and shared by `Arc`. It is cleared only by an
//! explicit `reset()` at the start of the next run.

mod export;
mod incident;
mod log;
mod severity;
mod summary;

pub use export::{NO_INCIDENTS_PLACEHOLDER, REPORT_TITLE};
pub use incident::{Incident, DEFAULT_CATEGORY};
pub use log::{ErrorLog, IncidentsView};
pub use severity::Severity;
pub use summary::SeveritySummary;
