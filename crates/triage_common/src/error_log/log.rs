//! The run-scoped incident log

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::incident::Incident;
use super::severity::Severity;
use super::summary::SeveritySummary;

/// Ordered collection of incidents for one diagnostic run.
///
/// Appends are serialized through a mutex so the log can be shared between
/// collectors running on different threads. Insertion order is preserved.
#[derive(Debug, Default)]
pub struct ErrorLog {
    incidents: Mutex<Vec<Incident>>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// New log behind an `Arc`, ready to hand to collaborators
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    // A panic while holding the lock cannot leave the Vec half-written, so a
    // poisoned guard is still safe to use.
    fn lock(&self) -> MutexGuard<'_, Vec<Incident>> {
        self.incidents.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clear all incidents. Called at the start of each run.
    pub fn reset(&self) {
        self.lock().clear();
    }

    /// Append an incident at the end of the log.
    ///
    /// Never panics and never fails: if the log cannot grow, the incident is
    /// written to stderr instead of being dropped.
    pub fn append(&self, incident: Incident) {
        let mut incidents = self.lock();
        if incidents.try_reserve(1).is_err() {
            drop(incidents);
            write_side_channel(&incident);
            return;
        }
        incidents.push(incident);
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot of all incidents in insertion order.
    ///
    /// The view can be iterated any number of times and never touches the
    /// log itself.
    pub fn all(&self) -> IncidentsView {
        IncidentsView {
            incidents: self.lock().clone(),
        }
    }

    /// Counts per severity; all zero for an empty log
    pub fn summarize(&self) -> SeveritySummary {
        SeveritySummary::from_incidents(self.lock().iter())
    }

    pub fn by_severity(&self, severity: Severity) -> IncidentsView {
        self.filtered(|i| i.severity() == severity)
    }

    pub fn by_section(&self, section: &str) -> IncidentsView {
        self.filtered(|i| i.section() == section)
    }

    /// Worst tier recorded so far
    pub fn highest_severity(&self) -> Option<Severity> {
        self.lock().iter().map(Incident::severity).max()
    }

    fn filtered(&self, keep: impl Fn(&Incident) -> bool) -> IncidentsView {
        IncidentsView {
            incidents: self.lock().iter().filter(|i| keep(i)).cloned().collect(),
        }
    }
}

fn write_side_channel(incident: &Incident) {
    eprintln!("[triage] incident log unavailable: {}", incident.to_line());
}

/// Read-only, restartable view over a set of incidents
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct IncidentsView {
    incidents: Vec<Incident>,
}

impl IncidentsView {
    pub fn iter(&self) -> std::slice::Iter<'_, Incident> {
        self.incidents.iter()
    }

    pub fn len(&self) -> usize {
        self.incidents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.incidents.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Incident> {
        self.incidents.get(index)
    }
}

impl<'a> IntoIterator for &'a IncidentsView {
    type Item = &'a Incident;
    type IntoIter = std::slice::Iter<'a, Incident>;

    fn into_iter(self) -> Self::IntoIter {
        self.incidents.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let log = ErrorLog::new();
        log.append(Incident::new("CPU", "first"));
        log.append(Incident::new("Disk", "second"));
        log.append(Incident::new("Net", "third"));

        let messages: Vec<_> = log.all().iter().map(|i| i.message().to_string()).collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
        assert_eq!(log.count(), 3);
    }

    #[test]
    fn test_reset_clears() {
        let log = ErrorLog::new();
        log.append(Incident::new("CPU", "x"));
        log.reset();
        assert_eq!(log.count(), 0);
        assert!(log.is_empty());
        log.reset();
        assert_eq!(log.count(), 0);
    }

    #[test]
    fn test_view_is_restartable_and_detached() {
        let log = ErrorLog::new();
        log.append(Incident::new("CPU", "x"));
        let view = log.all();

        assert_eq!(view.iter().count(), 1);
        assert_eq!(view.iter().count(), 1);

        log.append(Incident::new("CPU", "y"));
        assert_eq!(view.len(), 1);
        assert_eq!(log.count(), 2);
    }

    #[test]
    fn test_filters_and_highest_severity() {
        let log = ErrorLog::new();
        assert_eq!(log.highest_severity(), None);

        log.append(Incident::new("Disk", "low").with_severity(Severity::Warning));
        log.append(Incident::new("AV", "off").with_severity(Severity::Critical));
        log.append(Incident::new("Disk", "query failed"));

        assert_eq!(log.by_section("Disk").len(), 2);
        assert_eq!(log.by_severity(Severity::Critical).len(), 1);
        assert_eq!(log.highest_severity(), Some(Severity::Critical));
    }

    #[test]
    fn test_append_survives_poisoned_lock() {
        let log = Arc::new(ErrorLog::new());
        let poisoner = Arc::clone(&log);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.incidents.lock().unwrap();
            panic!("poison the log");
        })
        .join();

        log.append(Incident::new("CPU", "after poison"));
        assert_eq!(log.count(), 1);
    }
}
