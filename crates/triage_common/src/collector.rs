//! Multi-Strategy Collector
//!
//! Acquires one fact by walking an ordered list of strategies, most precise
//! first, most compatible last. The first strategy whose result passes its
//! predicate wins and the rest are never invoked.
//!
//! Incident policy:
//! - a strategy that fails (error, panic, timeout) records one incident at
//!   its own severity (Error unless the failure says otherwise)
//! - a strategy that returns nothing, or a value its predicate rejects, did
//!   not fail and records nothing
//! - when every strategy is exhausted, one aggregate incident is recorded at
//!   the fact's importance (Warning for standard facts, Critical for
//!   essential ones)

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::FactError;
use crate::error_log::{Incident, Severity};
use crate::executor::{guarded, SafeExecutor};
use crate::timeout::run_with_timeout;

/// Default time budget for a single strategy
pub const DEFAULT_STRATEGY_TIMEOUT: Duration = Duration::from_secs(5);

/// Category of the aggregate incident written when a chain is exhausted
pub const EXHAUSTED_CATEGORY: &str = "Collection";

type Operation<T> = Arc<dyn Fn() -> Result<Option<T>, FactError> + Send + Sync>;
type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// One method of acquiring a fact
pub struct Strategy<T> {
    label: String,
    operation: Operation<T>,
    predicate: Predicate<T>,
}

impl<T> Clone for Strategy<T> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            operation: Arc::clone(&self.operation),
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<T> std::fmt::Debug for Strategy<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Strategy").field("label", &self.label).finish()
    }
}

impl<T: Send + 'static> Strategy<T> {
    /// Strategy whose every `Ok` value counts as success
    pub fn new<F, E>(label: impl Into<String>, operation: F) -> Self
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        E: Into<FactError>,
    {
        Self::optional(label, move || operation().map(Some))
    }

    /// Strategy for sources that can come back empty without failing
    pub fn optional<F, E>(label: impl Into<String>, operation: F) -> Self
    where
        F: Fn() -> Result<Option<T>, E> + Send + Sync + 'static,
        E: Into<FactError>,
    {
        Self {
            label: label.into(),
            operation: Arc::new(move || operation().map_err(Into::into)),
            predicate: Arc::new(|_: &T| true),
        }
    }

    /// Last-resort strategy that always yields `value`
    pub fn fixed(label: impl Into<String>, value: T) -> Self
    where
        T: Clone + Sync,
    {
        Self::new(label, move || Ok::<_, FactError>(value.clone()))
    }

    /// Replace the success predicate. Values it rejects fall through to the
    /// next strategy.
    pub fn with_predicate<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.predicate = Arc::new(predicate);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// How much a missing fact matters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactImportance {
    #[default]
    Standard,
    /// Facts whose absence needs immediate attention (e.g. antivirus state)
    Essential,
}

impl FactImportance {
    /// Severity of the aggregate incident when every strategy failed
    pub fn exhaustion_severity(&self) -> Severity {
        match self {
            FactImportance::Standard => Severity::Warning,
            FactImportance::Essential => Severity::Critical,
        }
    }
}

/// The fact being collected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactSpec {
    /// Used as the incident section
    pub name: String,
    pub importance: FactImportance,
}

impl FactSpec {
    pub fn standard(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            importance: FactImportance::Standard,
        }
    }

    pub fn essential(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            importance: FactImportance::Essential,
        }
    }
}

/// Outcome of a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Collected<T> {
    Available { value: T, method: String },
    NotAvailable,
}

impl<T> Collected<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Collected::Available { .. })
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Collected::Available { value, .. } => Some(value),
            Collected::NotAvailable => None,
        }
    }

    /// Label of the strategy that produced the value
    pub fn method(&self) -> Option<&str> {
        match self {
            Collected::Available { method, .. } => Some(method),
            Collected::NotAvailable => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Collected::Available { value, .. } => Some(value),
            Collected::NotAvailable => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Collected<U> {
        match self {
            Collected::Available { value, method } => Collected::Available {
                value: f(value),
                method,
            },
            Collected::NotAvailable => Collected::NotAvailable,
        }
    }
}

/// What happened to a single strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Succeeded,
    /// Returned nothing, or a value the predicate rejected
    Rejected,
    Failed(String),
    TimedOut,
}

/// Every strategy tried for one fact, in order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionTrace {
    pub fact: String,
    pub attempts: Vec<(String, AttemptOutcome)>,
}

impl CollectionTrace {
    fn new(fact: &str) -> Self {
        Self {
            fact: fact.to_string(),
            attempts: Vec::new(),
        }
    }

    /// Labels in the order they were tried
    pub fn tried(&self) -> Vec<&str> {
        self.attempts.iter().map(|(label, _)| label.as_str()).collect()
    }

    pub fn failures(&self) -> usize {
        self.attempts
            .iter()
            .filter(|(_, o)| matches!(o, AttemptOutcome::Failed(_) | AttemptOutcome::TimedOut))
            .count()
    }
}

/// Collector behavior knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorSettings {
    /// Per-strategy time budget; `None` runs strategies inline
    pub strategy_timeout: Option<Duration>,
    /// Record failures without printing them
    pub suppress_console: bool,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            strategy_timeout: Some(DEFAULT_STRATEGY_TIMEOUT),
            suppress_console: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MultiStrategyCollector {
    executor: SafeExecutor,
    settings: CollectorSettings,
}

impl MultiStrategyCollector {
    pub fn new(executor: SafeExecutor, settings: CollectorSettings) -> Self {
        Self { executor, settings }
    }

    pub fn executor(&self) -> &SafeExecutor {
        &self.executor
    }

    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }

    /// Try `strategies` in order until one yields an accepted value
    pub fn collect<T: Send + 'static>(
        &self,
        fact: &FactSpec,
        strategies: &[Strategy<T>],
    ) -> Collected<T> {
        self.collect_traced(fact, strategies).0
    }

    /// Like [`collect`](Self::collect), also returning what each strategy did
    pub fn collect_traced<T: Send + 'static>(
        &self,
        fact: &FactSpec,
        strategies: &[Strategy<T>],
    ) -> (Collected<T>, CollectionTrace) {
        let mut trace = CollectionTrace::new(&fact.name);
        let suppress = self.settings.suppress_console;

        for strategy in strategies {
            debug!(fact = %fact.name, strategy = %strategy.label, "trying strategy");

            match self.run(strategy) {
                Ok(Some(value)) => {
                    debug!(fact = %fact.name, strategy = %strategy.label, "strategy succeeded");
                    trace.attempts.push((strategy.label.clone(), AttemptOutcome::Succeeded));
                    return (
                        Collected::Available {
                            value,
                            method: strategy.label.clone(),
                        },
                        trace,
                    );
                }
                Ok(_) => {
                    debug!(
                        fact = %fact.name,
                        strategy = %strategy.label,
                        "strategy yielded no usable value"
                    );
                    trace.attempts.push((strategy.label.clone(), AttemptOutcome::Rejected));
                }
                Err(failure) => {
                    let outcome = if failure.is_timeout() {
                        AttemptOutcome::TimedOut
                    } else {
                        AttemptOutcome::Failed(failure.message().to_string())
                    };
                    let failure = failure.or_operation(&strategy.label);
                    self.executor.record_failure(&fact.name, &failure, suppress);
                    trace.attempts.push((strategy.label.clone(), outcome));
                }
            }
        }

        self.record_exhausted(fact, &trace);
        (Collected::NotAvailable, trace)
    }

    /// Run one strategy and its predicate under the same guard; a rejected
    /// value comes back as `Ok(None)`
    fn run<T: Send + 'static>(&self, strategy: &Strategy<T>) -> Result<Option<T>, FactError> {
        let operation = Arc::clone(&strategy.operation);
        let predicate = Arc::clone(&strategy.predicate);
        let attempt = move || operation().map(|value| value.filter(|v| predicate(v)));
        match self.settings.strategy_timeout {
            Some(timeout) => run_with_timeout(attempt, timeout),
            None => guarded(attempt),
        }
    }

    fn record_exhausted(&self, fact: &FactSpec, trace: &CollectionTrace) {
        let message = if trace.attempts.is_empty() {
            format!("No collection methods configured for {}", fact.name)
        } else {
            format!(
                "All {} collection methods failed for {} (tried: {})",
                trace.attempts.len(),
                fact.name,
                trace.tried().join(", ")
            )
        };
        let severity = fact.importance.exhaustion_severity();
        warn!(fact = %fact.name, severity = %severity, "{}", message);

        if !self.settings.suppress_console {
            self.executor.console().warn(&fact.name, &message);
        }
        self.executor.log().append(
            Incident::new(&fact.name, message)
                .with_category(EXHAUSTED_CATEGORY)
                .with_severity(severity),
        );
    }
}
