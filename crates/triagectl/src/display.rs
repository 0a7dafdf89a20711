//! Display helpers for triagectl output.

use owo_colors::OwoColorize;
use triage_common::reading::format_reading;
use triage_common::{ClassifiedFact, RunReport, Severity, SeveritySummary, Tier};

/// Horizontal rule under headers
pub const HR: &str = "────────────────────────────────────────────────────────";

/// Key column width
const KEY_WIDTH: usize = 22;

/// Coloured status word for a tier
pub fn tier_badge(tier: Tier) -> String {
    match tier {
        Tier::Good => tier.label().green().to_string(),
        Tier::Warning => tier.label().yellow().bold().to_string(),
        Tier::Critical => tier.label().red().bold().to_string(),
    }
}

/// Plain "subject  value  tier" line; the badge is added by the printer
pub fn format_fact(fact: &ClassifiedFact) -> String {
    let value = match &fact.unit {
        Some(unit) => format!("{}{}", format_reading(fact.value), unit),
        None => String::new(),
    };
    format!("{:<width$} {:>10}", fact.subject, value, width = KEY_WIDTH)
}

/// "2 critical, 1 error, 0 warnings, 3 info"
pub fn format_summary(summary: &SeveritySummary) -> String {
    format!(
        "{} critical, {} error, {} warnings, {} info",
        summary.critical, summary.error, summary.warning, summary.info
    )
}

fn severity_marker(severity: Severity) -> String {
    match severity {
        Severity::Critical => "✗".red().bold().to_string(),
        Severity::Error => "✗".red().to_string(),
        Severity::Warning => "!".yellow().to_string(),
        Severity::Info => "·".dimmed().to_string(),
    }
}

/// Print the technician's summary for one run
pub fn print_report(report: &RunReport) {
    println!("\n{}", "Triage".bold());
    println!("{}", HR.dimmed());

    for fact in &report.facts {
        println!("{} {}", format_fact(fact), tier_badge(fact.tier));
    }
    for name in &report.unavailable {
        println!(
            "{:<width$} {:>10} {}",
            name,
            "",
            "unavailable".dimmed(),
            width = KEY_WIDTH
        );
    }

    let attention: Vec<_> = report
        .incidents
        .iter()
        .filter(|i| i.severity().is_warning_or_worse())
        .collect();
    if !attention.is_empty() {
        println!("\n{}", "Needs attention".bold());
        println!("{}", HR.dimmed());
        for incident in attention {
            println!(
                "{} {} {}",
                severity_marker(incident.severity()),
                format!("[{}]", incident.section()).dimmed(),
                incident.message()
            );
        }
    }

    println!("{}", HR.dimmed());
    println!(
        "{:<width$} {}",
        "overall",
        tier_badge(report.worst_tier()),
        width = KEY_WIDTH
    );
    println!(
        "{:<width$} {}",
        "incidents",
        format_summary(&report.summary),
        width = KEY_WIDTH
    );
    println!(
        "{:<width$} {} ms",
        "duration",
        report.duration_ms(),
        width = KEY_WIDTH
    );
}
