//! Classifier - fixed-threshold severity tiers
//!
//! Comparisons are strict: a value sitting exactly on a threshold lands in
//! the better tier. Warning and Critical results are written to the log so
//! threshold breaches show up in the final report.
//!
//! Non-finite readings are rejected: an anomaly incident is logged and the
//! caller gets `TriageError::InvalidReading` instead of a tier.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{Result, TriageError};
use crate::error_log::{ErrorLog, Incident, Severity};
use crate::reading::{format_reading, format_reading_against};

/// Category of threshold-breach incidents
pub const THRESHOLD_CATEGORY: &str = "Threshold";

/// Category of incidents for readings that could not be classified
pub const ANOMALY_CATEGORY: &str = "Anomaly";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// CPU load, memory used
    HigherIsWorse,
    /// Free disk, free memory
    LowerIsWorse,
}

/// Classification result
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Good,
    Warning,
    Critical,
}

impl Tier {
    /// Status label shown to the technician
    pub fn label(&self) -> &'static str {
        match self {
            Tier::Good => "Good",
            Tier::Warning => "Warning",
            Tier::Critical => "Critical",
        }
    }

    /// Incident severity for this tier; `None` for Good
    pub fn severity(&self) -> Option<Severity> {
        match self {
            Tier::Good => None,
            Tier::Warning => Some(Severity::Warning),
            Tier::Critical => Some(Severity::Critical),
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Warning and critical limits plus which way is bad
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Thresholds {
    critical_beyond: f64,
    warning_beyond: f64,
    direction: Direction,
    unit: &'static str,
}

impl Thresholds {
    /// Panics when the limits contradict each other; thresholds are fixed
    /// at build time, so that is a bug rather than a runtime condition.
    /// Use [`try_new`](Self::try_new) for values read from configuration.
    pub fn new(critical_beyond: f64, warning_beyond: f64, direction: Direction) -> Self {
        match Self::try_new(critical_beyond, warning_beyond, direction) {
            Ok(thresholds) => thresholds,
            Err(e) => panic!("{}", e),
        }
    }

    pub fn try_new(
        critical_beyond: f64,
        warning_beyond: f64,
        direction: Direction,
    ) -> Result<Self> {
        if !critical_beyond.is_finite() || !warning_beyond.is_finite() {
            return Err(TriageError::InvalidThresholds(format!(
                "limits must be finite (critical {}, warning {})",
                critical_beyond, warning_beyond
            )));
        }
        let ordered = match direction {
            Direction::HigherIsWorse => critical_beyond >= warning_beyond,
            Direction::LowerIsWorse => critical_beyond <= warning_beyond,
        };
        if !ordered {
            return Err(TriageError::InvalidThresholds(format!(
                "critical {} is less severe than warning {} for {:?}",
                critical_beyond, warning_beyond, direction
            )));
        }
        Ok(Self {
            critical_beyond,
            warning_beyond,
            direction,
            unit: "",
        })
    }

    /// Higher-is-worse thresholds
    pub fn above(warning: f64, critical: f64) -> Self {
        Self::new(critical, warning, Direction::HigherIsWorse)
    }

    /// Lower-is-worse thresholds
    pub fn below(warning: f64, critical: f64) -> Self {
        Self::new(critical, warning, Direction::LowerIsWorse)
    }

    /// Unit appended to values in incident messages (e.g. `%`)
    pub fn with_unit(mut self, unit: &'static str) -> Self {
        self.unit = unit;
        self
    }

    /// Tier for `value`; `None` when `value` is NaN
    pub fn tier_for(&self, value: f64) -> Option<Tier> {
        if value.is_nan() {
            return None;
        }
        let beyond = |limit: f64| match self.direction {
            Direction::HigherIsWorse => value > limit,
            Direction::LowerIsWorse => value < limit,
        };
        Some(if beyond(self.critical_beyond) {
            Tier::Critical
        } else if beyond(self.warning_beyond) {
            Tier::Warning
        } else {
            Tier::Good
        })
    }

    /// The limit that produced `tier`
    pub fn limit_for(&self, tier: Tier) -> Option<f64> {
        match tier {
            Tier::Good => None,
            Tier::Warning => Some(self.warning_beyond),
            Tier::Critical => Some(self.critical_beyond),
        }
    }

    fn describe_limit(&self, limit: f64) -> String {
        let side = match self.direction {
            Direction::HigherIsWorse => "above",
            Direction::LowerIsWorse => "below",
        };
        format!("{} {}{}", side, format_reading(limit), self.unit)
    }
}

/// A collected value with its tier, ready for the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedFact {
    pub subject: String,
    pub value: f64,
    pub tier: Tier,
    /// Limit that was crossed; `None` when Good
    pub threshold: Option<f64>,
    /// Unit of `value`; `None` for yes/no facts
    pub unit: Option<String>,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct Classifier {
    log: Arc<ErrorLog>,
}

impl Classifier {
    pub fn new(log: Arc<ErrorLog>) -> Self {
        Self { log }
    }

    /// Classify `value` and record an incident for Warning or Critical.
    pub fn classify(
        &self,
        subject: &str,
        value: f64,
        thresholds: &Thresholds,
    ) -> Result<ClassifiedFact> {
        if !value.is_finite() {
            let message = format!("{}: reading {} could not be classified", subject, value);
            self.log.append(
                Incident::new(subject, message)
                    .with_category(ANOMALY_CATEGORY)
                    .with_severity(Severity::Warning),
            );
            return Err(TriageError::InvalidReading {
                subject: subject.to_string(),
            });
        }

        // Infinity was rejected above, so tier_for always has a tier here.
        let tier = thresholds.tier_for(value).unwrap_or(Tier::Good);
        let threshold = thresholds.limit_for(tier);

        if let (Some(severity), Some(limit)) = (tier.severity(), threshold) {
            let message = format!(
                "{} is {}: {}{} ({} {})",
                subject,
                tier.label(),
                format_reading_against(value, limit),
                thresholds.unit,
                tier.label().to_lowercase(),
                thresholds.describe_limit(limit)
            );
            tracing::info!(subject, tier = %tier, value, "threshold breached");
            self.log.append(
                Incident::new(subject, message)
                    .with_category(THRESHOLD_CATEGORY)
                    .with_severity(severity),
            );
        }

        Ok(ClassifiedFact {
            subject: subject.to_string(),
            value,
            tier,
            threshold,
            unit: Some(thresholds.unit.to_string()),
            label: tier.label().to_string(),
        })
    }

    /// Classify a yes/no fact. `healthy == false` maps to `tier_when_bad`
    /// and records `problem` as the incident message.
    pub fn classify_flag(
        &self,
        subject: &str,
        healthy: bool,
        tier_when_bad: Tier,
        problem: &str,
    ) -> ClassifiedFact {
        let tier = if healthy { Tier::Good } else { tier_when_bad };
        if let Some(severity) = tier.severity() {
            self.log.append(
                Incident::new(subject, format!("{}: {}", subject, problem))
                    .with_category(THRESHOLD_CATEGORY)
                    .with_severity(severity),
            );
        }
        ClassifiedFact {
            subject: subject.to_string(),
            value: if healthy { 1.0 } else { 0.0 },
            tier,
            threshold: None,
            unit: None,
            label: tier.label().to_string(),
        }
    }
}
