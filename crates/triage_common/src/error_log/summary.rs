//! Per-severity incident counts

use serde::{Deserialize, Serialize};

use super::incident::Incident;
use super::severity::Severity;

/// Incident counts grouped by severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeveritySummary {
    pub critical: usize,
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

impl SeveritySummary {
    pub fn from_incidents<'a>(incidents: impl IntoIterator<Item = &'a Incident>) -> Self {
        let mut summary = Self::default();
        for incident in incidents {
            *summary.slot(incident.severity()) += 1;
        }
        summary
    }

    fn slot(&mut self, severity: Severity) -> &mut usize {
        match severity {
            Severity::Critical => &mut self.critical,
            Severity::Error => &mut self.error,
            Severity::Warning => &mut self.warning,
            Severity::Info => &mut self.info,
        }
    }

    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::Error => self.error,
            Severity::Warning => self.warning,
            Severity::Info => self.info,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.error + self.warning + self.info
    }

    /// No warnings, errors or criticals (info entries don't count)
    pub fn is_clean(&self) -> bool {
        self.critical == 0 && self.error == 0 && self.warning == 0
    }
}

impl std::fmt::Display for SeveritySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} critical, {} error, {} warning, {} info",
            self.critical, self.error, self.warning, self.info
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_summary_is_zero() {
        let summary = SeveritySummary::from_incidents(std::iter::empty());
        assert_eq!(summary, SeveritySummary::default());
        assert_eq!(summary.total(), 0);
        assert!(summary.is_clean());
    }

    #[test]
    fn test_summary_counts() {
        let incidents = vec![
            Incident::new("a", "1").with_severity(Severity::Critical),
            Incident::new("b", "2"),
            Incident::new("c", "3"),
            Incident::new("d", "4").with_severity(Severity::Info),
        ];
        let summary = SeveritySummary::from_incidents(&incidents);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.error, 2);
        assert_eq!(summary.warning, 0);
        assert_eq!(summary.info, 1);
        assert_eq!(summary.get(Severity::Error), 2);
        assert_eq!(summary.total(), 4);
        assert!(!summary.is_clean());
    }
}
