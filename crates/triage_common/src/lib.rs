//! Triage Common - resilient diagnostic collection core
//!
//! Collects machine facts through ranked fallback strategies, absorbs every
//! failure into a run-scoped incident log, and classifies readings against
//! fixed thresholds. Rendering and OS-specific fact sources live outside
//! this crate.

pub mod classifier;
pub mod collector;
pub mod config;
pub mod console;
pub mod error;
pub mod error_log;
pub mod executor;
pub mod facts;
pub mod reading;
pub mod run;
mod timeout;

pub use classifier::{ClassifiedFact, Classifier, Direction, Thresholds, Tier};
pub use collector::{
    AttemptOutcome, Collected, CollectionTrace, CollectorSettings, FactImportance, FactSpec,
    MultiStrategyCollector, Strategy, DEFAULT_STRATEGY_TIMEOUT,
};
pub use config::TriageConfig;
pub use console::{ConsoleSink, MemoryConsole, SilentConsole, StderrConsole};
pub use error::{FactError, Result, TriageError};
pub use error_log::{ErrorLog, Incident, IncidentsView, Severity, SeveritySummary};
pub use executor::SafeExecutor;
pub use facts::{CpuLoadFact, DiskFact, FirewallFact, GatewayFact, MemoryFact};
pub use run::{DiagnosticRun, RunReport};
