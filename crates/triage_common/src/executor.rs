//! SafeExecutor - run one fact-gathering operation without letting it fail
//! the run.
//!
//! Whatever the operation does (returns an error, panics, runs past its
//! time budget) the caller gets a value back: either the result or the
//! default it supplied. Every failure becomes an incident.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::console::{ConsoleSink, StderrConsole};
use crate::error::FactError;
use crate::error_log::{ErrorLog, Incident};
use crate::timeout::run_with_timeout;

#[derive(Clone)]
pub struct SafeExecutor {
    log: Arc<ErrorLog>,
    console: Arc<dyn ConsoleSink>,
}

impl std::fmt::Debug for SafeExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SafeExecutor")
            .field("incidents", &self.log.count())
            .finish_non_exhaustive()
    }
}

impl SafeExecutor {
    /// Executor that reports unsuppressed failures on stderr
    pub fn new(log: Arc<ErrorLog>) -> Self {
        Self {
            log,
            console: Arc::new(StderrConsole),
        }
    }

    pub fn with_console(mut self, console: Arc<dyn ConsoleSink>) -> Self {
        self.console = console;
        self
    }

    pub fn log(&self) -> &Arc<ErrorLog> {
        &self.log
    }

    pub(crate) fn console(&self) -> &Arc<dyn ConsoleSink> {
        &self.console
    }

    /// Run `operation`; on failure record an incident under `section` and
    /// return `default`.
    ///
    /// With `suppress` set the failure is still recorded but nothing is
    /// printed to the console.
    pub fn execute<T, E, F>(&self, section: &str, operation: F, default: T, suppress: bool) -> T
    where
        F: FnOnce() -> Result<T, E>,
        E: Into<FactError>,
    {
        match guarded(operation) {
            Ok(value) => value,
            Err(failure) => {
                self.record_failure(section, &failure, suppress);
                default
            }
        }
    }

    /// Same as [`execute`](Self::execute), with the operation bounded by
    /// `timeout`. A timed-out operation counts as a failure; its worker
    /// thread is detached and the late result discarded.
    pub fn execute_with_timeout<T, E, F>(
        &self,
        section: &str,
        operation: F,
        default: T,
        suppress: bool,
        timeout: Duration,
    ) -> T
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Into<FactError> + 'static,
    {
        match run_with_timeout(move || operation().map_err(Into::into), timeout) {
            Ok(value) => value,
            Err(failure) => {
                self.record_failure(section, &failure, suppress);
                default
            }
        }
    }

    /// Record a failure as an incident (plus console and tracing output)
    pub fn record_failure(&self, section: &str, failure: &FactError, suppress: bool) {
        let incident = Incident::from_failure(section, failure);
        warn!(
            section,
            category = incident.category(),
            severity = %incident.severity(),
            "{}",
            failure.message()
        );
        if !suppress {
            self.console.warn(section, failure.message());
        }
        self.log.append(incident);
    }
}

/// Run an operation, turning both `Err` and panics into a `FactError`
pub(crate) fn guarded<T, E, F>(operation: F) -> Result<T, FactError>
where
    F: FnOnce() -> Result<T, E>,
    E: Into<FactError>,
{
    match panic::catch_unwind(AssertUnwindSafe(operation)) {
        Ok(result) => result.map_err(Into::into),
        Err(payload) => Err(FactError::panicked(payload.as_ref())),
    }
}
