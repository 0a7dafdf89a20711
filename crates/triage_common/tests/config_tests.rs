//! Loading configuration from disk.

use std::time::Duration;
use tempfile::tempdir;
use triage_common::{Tier, TriageConfig, TriageError};

#[test]
fn test_missing_file_gives_defaults() {
    let dir = tempdir().unwrap();
    let config = TriageConfig::load_from_path(&dir.path().join("triage.toml")).unwrap();
    assert_eq!(config, TriageConfig::default());
}

#[test]
fn test_custom_thresholds_are_used() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("triage.toml");
    std::fs::write(
        &path,
        r#"
[collector]
strategy_timeout_ms = 1500
suppress_console = true

[thresholds.disk_free]
warning = 30.0
critical = 15.0
"#,
    )
    .unwrap();

    let config = TriageConfig::load_from_path(&path).unwrap();
    let disk = config.thresholds.disk_free().unwrap();
    assert_eq!(disk.tier_for(25.0), Some(Tier::Warning));
    assert_eq!(disk.tier_for(14.0), Some(Tier::Critical));
    assert_eq!(
        config.collector_settings().strategy_timeout,
        Some(Duration::from_millis(1500))
    );
}

#[test]
fn test_contradictory_thresholds_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("triage.toml");
    std::fs::write(
        &path,
        "[thresholds.cpu]\nwarning = 95.0\ncritical = 80.0\n",
    )
    .unwrap();

    let err = TriageConfig::load_from_path(&path).unwrap_err();
    assert!(matches!(err, TriageError::Config { .. }));
    assert!(err.to_string().contains("Invalid thresholds"));
}

#[test]
fn test_unparsable_file_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("triage.toml");
    std::fs::write(&path, "[collector\nstrategy_timeout_ms = ").unwrap();
    assert!(matches!(
        TriageConfig::load_from_path(&path),
        Err(TriageError::Config { .. })
    ));
}
