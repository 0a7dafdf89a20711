//! Plain-text and JSON export of the incident log

use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use super::incident::Incident;
use super::log::ErrorLog;
use crate::error::{Result, TriageError};

/// Title printed at the top of every exported log
pub const REPORT_TITLE: &str = "Triage Incident Log";

/// Body written instead of incident blocks when the log is empty
pub const NO_INCIDENTS_PLACEHOLDER: &str = "No incidents recorded.";

const RULE: &str = "==================================================";

impl ErrorLog {
    /// Render the log as human-readable text
    pub fn render_text(&self) -> String {
        self.render_text_at(Utc::now())
    }

    /// Render with a fixed generation time
    pub fn render_text_at(&self, generated: DateTime<Utc>) -> String {
        let incidents = self.all();
        let mut out = String::new();

        let _ = writeln!(out, "{}", RULE);
        let _ = writeln!(out, "{}", REPORT_TITLE);
        let _ = writeln!(out, "{}", RULE);
        let _ = writeln!(out, "Generated: {}", generated.format("%Y-%m-%d %H:%M:%S UTC"));
        let _ = writeln!(out, "Total incidents: {}", incidents.len());

        if incidents.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", NO_INCIDENTS_PLACEHOLDER);
            return out;
        }

        for incident in &incidents {
            let _ = writeln!(out);
            write_block(&mut out, incident);
        }
        out
    }

    /// Write the text rendering to `destination`.
    ///
    /// Failure is returned to the caller; the in-memory log is untouched.
    pub fn export(&self, destination: impl AsRef<Path>) -> Result<()> {
        let path = destination.as_ref();
        fs::write(path, self.render_text()).map_err(|source| TriageError::Export {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), incidents = self.count(), "incident log exported");
        Ok(())
    }

    /// Write all incidents as a pretty-printed JSON array
    pub fn export_json(&self, destination: impl AsRef<Path>) -> Result<()> {
        let path = destination.as_ref();
        let json = serde_json::to_string_pretty(&self.all())?;
        fs::write(path, json).map_err(|source| TriageError::Export {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn write_block(out: &mut String, incident: &Incident) {
    let _ = writeln!(
        out,
        "[{}] {}",
        incident.timestamp().format("%Y-%m-%d %H:%M:%S%.3f UTC"),
        incident.severity().as_str()
    );
    let _ = writeln!(out, "  Section:   {}", incident.section());
    let _ = writeln!(out, "  Message:   {}", incident.message());
    let _ = writeln!(out, "  Category:  {}", incident.category());
    if let Some(target) = incident.target() {
        let _ = writeln!(out, "  Target:    {}", target);
    }
    if !incident.source_operation().is_empty() {
        let _ = writeln!(out, "  Operation: {}", incident.source_operation());
    }
    if incident.source_line() > 0 {
        let _ = writeln!(out, "  Line:      {}", incident.source_line());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_log::Severity;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_render_empty_log() {
        let text = ErrorLog::new().render_text_at(fixed_time());
        assert!(text.contains(REPORT_TITLE));
        assert!(text.contains("Generated: 2026-10-16 09:30:00 UTC"));
        assert!(text.contains("Total incidents: 0"));
        assert!(text.contains(NO_INCIDENTS_PLACEHOLDER));
        assert!(!text.contains("Section:"));
    }

    #[test]
    fn test_render_omits_absent_fields() {
        let log = ErrorLog::new();
        log.append(Incident::new("CPU", "counter missing"));
        let text = log.render_text_at(fixed_time());

        assert!(text.contains("Section:   CPU"));
        assert!(text.contains("Category:  General"));
        assert!(!text.contains("Target:"));
        assert!(!text.contains("Line:"));
        assert!(!text.contains("Operation:"));
    }

    #[test]
    fn test_render_includes_present_fields() {
        let log = ErrorLog::new();
        log.append(
            Incident::new("Disk", "volume query failed")
                .with_target("/dev/sda1")
                .with_source("sysinfo", 17)
                .with_severity(Severity::Warning),
        );
        let text = log.render_text_at(fixed_time());

        assert!(text.contains("] WARNING"));
        assert!(text.contains("Target:    /dev/sda1"));
        assert!(text.contains("Operation: sysinfo"));
        assert!(text.contains("Line:      17"));
    }
}
