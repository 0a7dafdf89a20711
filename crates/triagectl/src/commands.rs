//! Command implementations for triagectl

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use triage_common::{
    CollectorSettings, DiagnosticRun, DiskFact, ErrorLog, FactSpec, RunReport, Thresholds, Tier,
    TriageConfig,
};

use crate::cli::RunArgs;
use crate::display;
use crate::probes;

/// Collect, print, and export one diagnostic run
pub fn run(config: &TriageConfig, args: &RunArgs) -> Result<()> {
    let config = apply_overrides(config, args);
    let log = ErrorLog::shared();

    let report = diagnose(
        Arc::clone(&log),
        &config,
        &args.effective_mounts(),
        args.parallel,
        config.collector_settings(),
    )?;

    if args.json {
        println!("{}", report.to_json()?);
    } else {
        display::print_report(&report);
    }

    let export_path = args.export.clone().unwrap_or_else(|| config.export.path.clone());
    log.export(&export_path)
        .with_context(|| format!("Failed to export incident log to {}", export_path.display()))?;
    if !args.json {
        println!("\nIncident log written to {}", export_path.display());
    }

    if let Some(json_path) = &args.export_json {
        log.export_json(json_path)
            .with_context(|| format!("Failed to export incidents to {}", json_path.display()))?;
    }

    // Exit status reflects whether the tool worked, not what it found
    Ok(())
}

/// Print the effective configuration
pub fn config(config: &TriageConfig) -> Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}

/// Command-line flags layered over the file configuration
pub fn apply_overrides(config: &TriageConfig, args: &RunArgs) -> TriageConfig {
    let mut config = config.clone();
    if let Some(ms) = args.timeout_ms {
        config.collector.strategy_timeout_ms = ms;
    }
    if args.quiet {
        config.collector.suppress_console = true;
    }
    config
}

/// Run every collector and classifier against this machine
pub fn diagnose(
    log: Arc<ErrorLog>,
    config: &TriageConfig,
    mounts: &[PathBuf],
    parallel: bool,
    settings: CollectorSettings,
) -> Result<RunReport> {
    let cpu_thresholds = config.thresholds.cpu()?;
    let memory_thresholds = config.thresholds.memory()?;
    let disk_thresholds = config.thresholds.disk_free()?;

    let mut run = DiagnosticRun::start(log, settings);

    if let Some(cpu) = run
        .collect(&FactSpec::standard("CPU"), &probes::cpu_strategies())
        .into_option()
    {
        classify_reading(&mut run, "CPU load", cpu.percent, &cpu_thresholds);
    }

    if let Some(memory) = run
        .collect(&FactSpec::standard("Memory"), &probes::memory_strategies())
        .into_option()
    {
        run.note(
            "Memory",
            format!("{:.1} GB free of {:.1} GB", memory.free_gb, memory.total_gb),
        );
        classify_reading(&mut run, "Memory used", memory.percent_used, &memory_thresholds);
    }

    for disk in collect_disks(&mut run, mounts, parallel).into_iter().flatten() {
        classify_reading(
            &mut run,
            &format!("Disk {} free", disk.drive),
            disk.percent_free,
            &disk_thresholds,
        );
    }

    if let Some(gateway) = run
        .collect(&FactSpec::essential("Network"), &probes::gateway_strategies())
        .into_option()
    {
        let via = gateway
            .interface
            .as_deref()
            .map(|iface| format!(" on {}", iface))
            .unwrap_or_default();
        run.note("Network", format!("Default gateway {}{}", gateway.address, via));
        run.classify_flag("Default gateway", true, Tier::Critical, "no default gateway");
    }

    if let Some(firewall) = run
        .collect(&FactSpec::essential("Firewall"), &probes::firewall_strategies())
        .into_option()
    {
        if firewall.enabled {
            run.note("Firewall", format!("{} is active", firewall.provider));
        }
        run.classify_flag("Firewall", firewall.enabled, Tier::Critical, "no active firewall found");
    }

    Ok(run.finish())
}

fn collect_disks(
    run: &mut DiagnosticRun,
    mounts: &[PathBuf],
    parallel: bool,
) -> Vec<Option<DiskFact>> {
    if parallel {
        let jobs: Vec<_> = mounts
            .iter()
            .map(|mount| (disk_fact(mount), probes::disk_strategies(mount)))
            .collect();
        run.collect_parallel(&jobs)
            .into_iter()
            .map(|collected| collected.into_option())
            .collect()
    } else {
        mounts
            .iter()
            .map(|mount| {
                run.collect(&disk_fact(mount), &probes::disk_strategies(mount))
                    .into_option()
            })
            .collect()
    }
}

fn disk_fact(mount: &Path) -> FactSpec {
    FactSpec::standard(format!("Disk {}", mount.display()))
}

/// Classify a reading; unclassifiable readings are already in the log
fn classify_reading(run: &mut DiagnosticRun, subject: &str, value: f64, thresholds: &Thresholds) {
    match run.classify(subject, value, thresholds) {
        Ok(fact) => debug!(subject, tier = %fact.tier, "classified"),
        Err(e) => warn!(subject, error = %e, "reading not classified"),
    }
}
