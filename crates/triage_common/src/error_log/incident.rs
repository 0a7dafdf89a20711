//! Incident - one recorded failure or notable condition

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::severity::Severity;
use crate::error::FactError;

/// Category used when the originating failure carries no structured cause
pub const DEFAULT_CATEGORY: &str = "General";

/// A single incident recorded during a run.
///
/// Fields are private: an incident is built once, appended, and only read
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    timestamp: DateTime<Utc>,
    section: String,
    message: String,
    category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target: Option<String>,
    severity: Severity,
    #[serde(default, skip_serializing_if = "is_zero")]
    source_line: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    source_operation: String,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

impl Incident {
    /// New incident with `General` category and `Error` severity
    pub fn new(section: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            section: section.into(),
            message: message.into(),
            category: DEFAULT_CATEGORY.to_string(),
            target: None,
            severity: Severity::default(),
            source_line: 0,
            source_operation: String::new(),
        }
    }

    /// Build an incident from a fact-gathering failure, taking every
    /// structured field the failure carries.
    pub fn from_failure(section: impl Into<String>, failure: &FactError) -> Self {
        let mut incident = Self::new(section, failure.message());
        if let Some(category) = failure.category_name() {
            incident.category = category.to_string();
        }
        incident.target = failure.target_name().map(str::to_string);
        incident.severity = failure.severity_level().unwrap_or_default();
        incident.source_line = failure.line_number();
        incident.source_operation = failure.operation_name().unwrap_or_default().to_string();
        incident
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        let category = category.into();
        if !category.trim().is_empty() {
            self.category = category;
        }
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        let target = target.into();
        self.target = (!target.is_empty()).then_some(target);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_source(mut self, operation: impl Into<String>, line: u32) -> Self {
        self.source_operation = operation.into();
        self.source_line = line;
        self
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Source line of the failing operation, 0 when unknown
    pub fn source_line(&self) -> u32 {
        self.source_line
    }

    /// Name of the failing operation, empty when unknown
    pub fn source_operation(&self) -> &str {
        &self.source_operation
    }

    /// One-line form used for the stderr side channel
    pub fn to_line(&self) -> String {
        format!(
            "[{}] {} {}: {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.severity.as_str(),
            self.section,
            self.message
        )
    }
}
