//! Error types for Triage.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::error_log::Severity;

/// Category recorded for strategies that ran past their time budget
pub const TIMEOUT_CATEGORY: &str = "Timeout";

/// Errors that leave the core: export failures and invalid configuration.
///
/// Fact-gathering failures never show up here; they are absorbed by
/// `SafeExecutor` and turned into incidents.
#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Failed to export incident log to {}: {source}", .path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error in {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },

    #[error("Invalid thresholds: {0}")]
    InvalidThresholds(String),

    #[error("Reading for {subject} is not a finite number")]
    InvalidReading { subject: String },
}

pub type Result<T> = std::result::Result<T, TriageError>;

/// A failed attempt to gather a fact.
///
/// Carries whatever structure the fact source could provide; only the
/// message is mandatory. Bare strings and foreign errors convert into a
/// message-only `FactError`.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct FactError {
    message: String,
    category: Option<String>,
    target: Option<String>,
    severity: Option<Severity>,
    operation: Option<String>,
    line: u32,
}

impl FactError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            category: None,
            target: None,
            severity: None,
            operation: None,
            line: 0,
        }
    }

    /// Strategy exceeded its time budget
    pub fn timeout(after: Duration) -> Self {
        Self::new(format!("timed out after {} ms", after.as_millis())).category(TIMEOUT_CATEGORY)
    }

    /// Strategy panicked; the payload is kept when it is a string
    pub fn panicked(payload: &(dyn std::any::Any + Send)) -> Self {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        Self::new(format!("operation panicked: {}", detail))
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn line(mut self, line: u32) -> Self {
        self.line = line;
        self
    }

    /// Fill in the operation name if the source didn't set one
    pub(crate) fn or_operation(mut self, operation: &str) -> Self {
        if self.operation.is_none() {
            self.operation = Some(operation.to_string());
        }
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn category_name(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn target_name(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn severity_level(&self) -> Option<Severity> {
        self.severity
    }

    pub fn operation_name(&self) -> Option<&str> {
        self.operation.as_deref()
    }

    pub fn line_number(&self) -> u32 {
        self.line
    }

    pub fn is_timeout(&self) -> bool {
        self.category.as_deref() == Some(TIMEOUT_CATEGORY)
    }
}

impl From<String> for FactError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for FactError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<std::io::Error> for FactError {
    fn from(err: std::io::Error) -> Self {
        let category = match err.kind() {
            std::io::ErrorKind::NotFound => "NotFound",
            std::io::ErrorKind::PermissionDenied => "Permission",
            std::io::ErrorKind::TimedOut => TIMEOUT_CATEGORY,
            _ => "Io",
        };
        Self::new(err.to_string()).category(category)
    }
}

impl From<std::num::ParseIntError> for FactError {
    fn from(err: std::num::ParseIntError) -> Self {
        Self::new(err.to_string()).category("Parse")
    }
}

impl From<std::num::ParseFloatError> for FactError {
    fn from(err: std::num::ParseFloatError) -> Self {
        Self::new(err.to_string()).category("Parse")
    }
}

impl From<anyhow::Error> for FactError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(fact) = err.downcast_ref::<FactError>() {
            return fact.clone();
        }
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            return Self::new(format!("{:#}", err)).category(match io.kind() {
                std::io::ErrorKind::NotFound => "NotFound",
                std::io::ErrorKind::PermissionDenied => "Permission",
                _ => "Io",
            });
        }
        Self::new(format!("{:#}", err))
    }
}
