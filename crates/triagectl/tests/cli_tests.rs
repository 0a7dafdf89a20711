//! CLI parsing and config wiring

use clap::Parser;
use std::path::PathBuf;
use triage_common::TriageConfig;
use triagectl::cli::{Cli, Commands, RunArgs};
use triagectl::commands::apply_overrides;

#[test]
fn test_bare_invocation_runs_with_defaults() {
    let cli = Cli::try_parse_from(["triagectl"]).unwrap();
    assert_eq!(cli.config_path(), PathBuf::from("triage.toml"));
    assert_eq!(cli.log_level, "info");
    match cli.command() {
        Commands::Run(args) => {
            assert_eq!(args, RunArgs::default());
            assert_eq!(args.effective_mounts(), vec![PathBuf::from("/")]);
        }
        Commands::Config => panic!("expected run"),
    }
}

#[test]
fn test_run_flags() {
    let cli = Cli::try_parse_from([
        "triagectl",
        "run",
        "--mount",
        "/",
        "--mount",
        "/home",
        "--export",
        "/tmp/ticket.log",
        "--json",
        "-q",
        "--timeout-ms",
        "250",
    ])
    .unwrap();

    let Commands::Run(args) = cli.command() else {
        panic!("expected run");
    };
    assert_eq!(
        args.effective_mounts(),
        vec![PathBuf::from("/"), PathBuf::from("/home")]
    );
    assert_eq!(args.export, Some(PathBuf::from("/tmp/ticket.log")));
    assert!(args.json);
    assert!(args.quiet);
    assert!(!args.parallel);
    assert_eq!(args.timeout_ms, Some(250));
}

#[test]
fn test_global_config_flag_after_subcommand() {
    let cli = Cli::try_parse_from(["triagectl", "config", "--config", "/etc/triage.toml"]).unwrap();
    assert_eq!(cli.config_path(), PathBuf::from("/etc/triage.toml"));
    assert!(matches!(cli.command(), Commands::Config));
}

#[test]
fn test_invalid_timeout_rejected() {
    assert!(Cli::try_parse_from(["triagectl", "run", "--timeout-ms", "soon"]).is_err());
}

#[test]
fn test_timeout_override_is_clamped_by_config() {
    let args = RunArgs {
        timeout_ms: Some(1),
        ..RunArgs::default()
    };
    let config = apply_overrides(&TriageConfig::default(), &args);
    let settings = config.collector_settings();
    assert!(settings.strategy_timeout.unwrap().as_millis() >= 100);
}

#[test]
fn test_diagnose_against_this_machine() {
    use std::sync::Arc;
    use triage_common::{CollectorSettings, ErrorLog};
    use triagectl::commands::diagnose;

    let dir = tempfile::tempdir().unwrap();
    let log = ErrorLog::shared();
    let settings = CollectorSettings {
        strategy_timeout: Some(std::time::Duration::from_secs(5)),
        suppress_console: true,
    };

    let report = diagnose(
        Arc::clone(&log),
        &TriageConfig::default(),
        &[dir.path().to_path_buf()],
        true,
        settings,
    )
    .unwrap();

    // Whatever the host offers, every fact is either classified or unavailable
    // and the report agrees with the log.
    assert_eq!(report.summary.total(), log.count());
    assert_eq!(report.incidents.len(), log.count());
    assert_eq!(report.traces.len(), 5);

    // A directory that is not itself a mount point is resolved to the volume
    // holding it, never reported as a sysinfo failure
    assert!(!log
        .all()
        .iter()
        .any(|i| i.section().starts_with("Disk") && i.source_operation() == "sysinfo"));

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert!(json["facts"].is_array());

    let path = dir.path().join("incidents.log");
    log.export(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("Triage Incident Log"));
    assert!(text.contains(&format!("Total incidents: {}", log.count())));
}
