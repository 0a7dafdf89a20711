//! Diagnostic Run
//!
//! Owns the lifecycle of one end-to-end collection: resets the log on
//! start, routes collection and classification through the shared log, and
//! hands a read-only [`RunReport`] to whatever renders the result.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::thread;
use tracing::info;

use crate::classifier::{ClassifiedFact, Classifier, Thresholds, Tier};
use crate::collector::{
    Collected, CollectionTrace, CollectorSettings, FactSpec, MultiStrategyCollector, Strategy,
};
use crate::console::ConsoleSink;
use crate::error::Result;
use crate::error_log::{ErrorLog, Incident, IncidentsView, Severity, SeveritySummary};
use crate::executor::SafeExecutor;

#[derive(Debug)]
pub struct DiagnosticRun {
    log: Arc<ErrorLog>,
    collector: MultiStrategyCollector,
    classifier: Classifier,
    started_at: DateTime<Utc>,
    facts: Vec<ClassifiedFact>,
    traces: Vec<CollectionTrace>,
    unavailable: Vec<String>,
}

impl DiagnosticRun {
    /// Start a run on `log`, clearing whatever the previous run left there
    pub fn start(log: Arc<ErrorLog>, settings: CollectorSettings) -> Self {
        Self::start_with_executor(SafeExecutor::new(Arc::clone(&log)), settings)
    }

    /// Start a run whose warnings go to `console`
    pub fn start_with_console(
        log: Arc<ErrorLog>,
        settings: CollectorSettings,
        console: Arc<dyn ConsoleSink>,
    ) -> Self {
        let executor = SafeExecutor::new(Arc::clone(&log)).with_console(console);
        Self::start_with_executor(executor, settings)
    }

    fn start_with_executor(executor: SafeExecutor, settings: CollectorSettings) -> Self {
        let log = Arc::clone(executor.log());
        log.reset();
        info!(timeout = ?settings.strategy_timeout, "diagnostic run started");
        Self {
            classifier: Classifier::new(Arc::clone(&log)),
            collector: MultiStrategyCollector::new(executor, settings),
            log,
            started_at: Utc::now(),
            facts: Vec::new(),
            traces: Vec::new(),
            unavailable: Vec::new(),
        }
    }

    pub fn log(&self) -> &Arc<ErrorLog> {
        &self.log
    }

    pub fn executor(&self) -> &SafeExecutor {
        self.collector.executor()
    }

    pub fn collect<T: Send + 'static>(
        &mut self,
        fact: &FactSpec,
        strategies: &[Strategy<T>],
    ) -> Collected<T> {
        let (collected, trace) = self.collector.collect_traced(fact, strategies);
        self.remember(&collected, trace);
        collected
    }

    /// Collect independent facts on scoped threads.
    ///
    /// Results come back in input order. Incidents from different facts may
    /// interleave in the log; each fact's own incidents keep their order.
    pub fn collect_parallel<T: Send + 'static>(
        &mut self,
        jobs: &[(FactSpec, Vec<Strategy<T>>)],
    ) -> Vec<Collected<T>> {
        let collector = &self.collector;
        let results: Vec<(Collected<T>, CollectionTrace)> = thread::scope(|scope| {
            let handles: Vec<_> = jobs
                .iter()
                .map(|(fact, strategies)| {
                    scope.spawn(move || collector.collect_traced(fact, strategies))
                })
                .collect();
            handles
                .into_iter()
                .zip(jobs)
                .map(|(handle, (fact, _))| {
                    handle
                        .join()
                        .unwrap_or_else(|_| (Collected::NotAvailable, lost_trace(fact)))
                })
                .collect()
        });

        results
            .into_iter()
            .map(|(collected, trace)| {
                self.remember(&collected, trace);
                collected
            })
            .collect()
    }

    fn remember<T>(&mut self, collected: &Collected<T>, trace: CollectionTrace) {
        if !collected.is_available() {
            self.unavailable.push(trace.fact.clone());
        }
        self.traces.push(trace);
    }

    /// Classify a numeric fact and keep it for the report.
    pub fn classify(
        &mut self,
        subject: &str,
        value: f64,
        thresholds: &Thresholds,
    ) -> Result<&ClassifiedFact> {
        let fact = self.classifier.classify(subject, value, thresholds)?;
        self.facts.push(fact);
        Ok(self.last_fact())
    }

    pub fn classify_flag(
        &mut self,
        subject: &str,
        healthy: bool,
        tier_when_bad: Tier,
        problem: &str,
    ) -> &ClassifiedFact {
        let fact = self.classifier.classify_flag(subject, healthy, tier_when_bad, problem);
        self.facts.push(fact);
        self.last_fact()
    }

    fn last_fact(&self) -> &ClassifiedFact {
        // Only called right after a push.
        &self.facts[self.facts.len() - 1]
    }

    /// Record an informational note (e.g. a service found running)
    pub fn note(&self, section: &str, message: impl Into<String>) {
        self.log.append(Incident::new(section, message).with_severity(Severity::Info));
    }

    /// Close the run and produce the renderer's view of it
    pub fn finish(self) -> RunReport {
        let finished_at = Utc::now();
        let summary = self.log.summarize();
        info!(
            incidents = summary.total(),
            critical = summary.critical,
            unavailable = self.unavailable.len(),
            "diagnostic run finished"
        );
        RunReport {
            started_at: self.started_at,
            finished_at,
            summary,
            incidents: self.log.all(),
            facts: self.facts,
            traces: self.traces,
            unavailable: self.unavailable,
        }
    }
}

/// A thread that collected a fact panicked outside every strategy guard
fn lost_trace(fact: &FactSpec) -> CollectionTrace {
    CollectionTrace {
        fact: fact.name.clone(),
        attempts: Vec::new(),
    }
}

/// Everything a renderer needs, detached from the live log
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub summary: SeveritySummary,
    pub incidents: IncidentsView,
    pub facts: Vec<ClassifiedFact>,
    pub traces: Vec<CollectionTrace>,
    /// Facts no strategy could obtain
    pub unavailable: Vec<String>,
}

impl RunReport {
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    pub fn worst_tier(&self) -> Tier {
        self.facts.iter().map(|f| f.tier).max().unwrap_or(Tier::Good)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
