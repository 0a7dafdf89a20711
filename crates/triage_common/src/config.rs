//! Triage Configuration
//!
//! Optional TOML file; every key has a default.
//!
//! ```toml
//! [collector]
//! strategy_timeout_ms = 5000
//! suppress_console = false
//!
//! [thresholds.disk_free]
//! warning = 20.0
//! critical = 10.0
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::classifier::{Direction, Thresholds};
use crate::collector::CollectorSettings;
use crate::error::{Result, TriageError};
use crate::facts::{
    CPU_CRITICAL_PERCENT, CPU_WARNING_PERCENT, DISK_FREE_CRITICAL_PERCENT,
    DISK_FREE_WARNING_PERCENT, MEMORY_CRITICAL_PERCENT, MEMORY_WARNING_PERCENT,
};

/// Config file name looked up in the working directory
pub const CONFIG_FILE: &str = "triage.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriageConfig {
    #[serde(default)]
    pub collector: CollectorConfig,
    #[serde(default)]
    pub thresholds: ThresholdsConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Per-strategy time budget (milliseconds, valid: 100-60000)
    #[serde(default = "default_strategy_timeout_ms")]
    pub strategy_timeout_ms: u64,

    /// Record failures without printing them to the console
    #[serde(default)]
    pub suppress_console: bool,
}

fn default_strategy_timeout_ms() -> u64 {
    5000
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            strategy_timeout_ms: default_strategy_timeout_ms(),
            suppress_console: false,
        }
    }
}

impl CollectorConfig {
    pub fn effective_timeout_ms(&self) -> u64 {
        self.strategy_timeout_ms.clamp(100, 60_000)
    }

    pub fn timeout_was_clamped(&self) -> bool {
        self.strategy_timeout_ms != self.effective_timeout_ms()
    }
}

/// A warning/critical pair as written in the config file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdPair {
    pub warning: f64,
    pub critical: f64,
}

impl ThresholdPair {
    pub fn to_thresholds(&self, direction: Direction) -> Result<Thresholds> {
        Ok(Thresholds::try_new(self.critical, self.warning, direction)?.with_unit("%"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdsConfig {
    /// CPU load %, higher is worse
    #[serde(default = "default_cpu")]
    pub cpu: ThresholdPair,

    /// Memory used %, higher is worse
    #[serde(default = "default_memory")]
    pub memory: ThresholdPair,

    /// Disk free %, lower is worse
    #[serde(default = "default_disk_free")]
    pub disk_free: ThresholdPair,
}

fn default_cpu() -> ThresholdPair {
    ThresholdPair {
        warning: CPU_WARNING_PERCENT,
        critical: CPU_CRITICAL_PERCENT,
    }
}

fn default_memory() -> ThresholdPair {
    ThresholdPair {
        warning: MEMORY_WARNING_PERCENT,
        critical: MEMORY_CRITICAL_PERCENT,
    }
}

fn default_disk_free() -> ThresholdPair {
    ThresholdPair {
        warning: DISK_FREE_WARNING_PERCENT,
        critical: DISK_FREE_CRITICAL_PERCENT,
    }
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            cpu: default_cpu(),
            memory: default_memory(),
            disk_free: default_disk_free(),
        }
    }
}

impl ThresholdsConfig {
    pub fn cpu(&self) -> Result<Thresholds> {
        self.cpu.to_thresholds(Direction::HigherIsWorse)
    }

    pub fn memory(&self) -> Result<Thresholds> {
        self.memory.to_thresholds(Direction::HigherIsWorse)
    }

    pub fn disk_free(&self) -> Result<Thresholds> {
        self.disk_free.to_thresholds(Direction::LowerIsWorse)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_path")]
    pub path: PathBuf,
}

fn default_export_path() -> PathBuf {
    PathBuf::from("triage-incidents.log")
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            path: default_export_path(),
        }
    }
}

impl TriageConfig {
    /// Load from `path`; a missing file yields the defaults
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(TriageError::Config {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        };
        let config = Self::parse(&content).map_err(|message| TriageError::Config {
            path: path.to_path_buf(),
            message,
        })?;
        config.validate().map_err(|e| TriageError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(config)
    }

    fn parse(content: &str) -> std::result::Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Check every threshold section
    pub fn validate(&self) -> Result<()> {
        self.thresholds.cpu()?;
        self.thresholds.memory()?;
        self.thresholds.disk_free()?;
        Ok(())
    }

    pub fn collector_settings(&self) -> CollectorSettings {
        CollectorSettings {
            strategy_timeout: Some(Duration::from_millis(self.collector.effective_timeout_ms())),
            suppress_console: self.collector.suppress_console,
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| TriageError::Config {
            path: PathBuf::from(CONFIG_FILE),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TriageConfig::default();
        assert_eq!(config.collector.strategy_timeout_ms, 5000);
        assert_eq!(config.thresholds.disk_free.critical, 10.0);
        assert_eq!(config.export.path, PathBuf::from("triage-incidents.log"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config = TriageConfig::parse(
            r#"
            [thresholds.cpu]
            warning = 70.0
            critical = 95.0
            "#,
        )
        .unwrap();
        assert_eq!(config.thresholds.cpu.warning, 70.0);
        assert_eq!(config.thresholds.memory, default_memory());
        assert_eq!(config.collector, CollectorConfig::default());
    }

    #[test]
    fn test_timeout_clamped() {
        let config = CollectorConfig {
            strategy_timeout_ms: 5,
            suppress_console: false,
        };
        assert_eq!(config.effective_timeout_ms(), 100);
        assert!(config.timeout_was_clamped());
    }

    #[test]
    fn test_collector_settings() {
        let mut config = TriageConfig::default();
        config.collector.suppress_console = true;
        let settings = config.collector_settings();
        assert_eq!(settings.strategy_timeout, Some(Duration::from_secs(5)));
        assert!(settings.suppress_console);
    }

    #[test]
    fn test_toml_roundtrip_of_defaults() {
        let config = TriageConfig::default();
        let text = config.to_toml().unwrap();
        assert_eq!(TriageConfig::parse(&text).unwrap(), config);
    }
}
