// Report building, rendering and persistence

use chrono::{DateTime, Utc};
use delver_scanner::AggregateState;
use delver_scanner::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

const HEAVY_RULE: &str =
    "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";
const LIGHT_RULE: &str =
    "────────────────────────────────────────────────────────────────────────────────\n";

/// Final, read-only summary of a run.
///
/// Only the aggregate fields are persisted; timing and the interrupted flag are for the
/// terminal summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub discovered_endpoints: Vec<String>,
    pub unusual_endpoints: Vec<(String, u16)>,
    pub status_code_counts: BTreeMap<u16, u64>,
    pub total_requests: u64,
    pub failed_requests: u64,
    pub retries: u64,
    #[serde(skip)]
    pub elapsed: Duration,
    #[serde(skip)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub interrupted: bool,
}

/// Snapshot a finalized aggregate into a report.
pub fn summarize(state: &AggregateState, elapsed: Duration) -> Report {
    Report {
        discovered_endpoints: state.discovered.clone(),
        unusual_endpoints: state.unusual.clone(),
        status_code_counts: state.status_code_counts.clone(),
        total_requests: state.total_requests,
        failed_requests: state.failed_requests,
        retries: state.retries,
        elapsed,
        started_at: None,
        interrupted: false,
    }
}

impl Report {
    pub fn with_started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = Some(started_at);
        self
    }

    pub fn with_interrupted(mut self, interrupted: bool) -> Self {
        self.interrupted = interrupted;
        self
    }

    pub fn is_consistent(&self) -> bool {
        let responded: u64 = self.status_code_counts.values().sum();
        self.total_requests == responded + self.failed_requests
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn render_text(&self) -> String {
        let mut report = String::new();

        report.push_str(HEAVY_RULE);
        report.push_str("                              DELVER SCAN SUMMARY\n");
        report.push_str(HEAVY_RULE);
        report.push('\n');

        if let Some(started_at) = self.started_at {
            report.push_str(&format!(
                "Started:      {}\n",
                started_at.format("%Y-%m-%d %H:%M:%S UTC")
            ));
        }
        report.push_str(&format!("Elapsed:      {:.2}s\n", self.elapsed.as_secs_f64()));
        if self.interrupted {
            report.push_str("Status:       Interrupted (partial results)\n");
        } else {
            report.push_str("Status:       Completed\n");
        }
        report.push_str(&format!("Requests:     {}\n", self.total_requests));
        report.push_str(&format!("Failed:       {}\n", self.failed_requests));
        report.push_str(&format!("Retries:      {}\n", self.retries));
        report.push('\n');

        report.push_str("STATUS CODES\n");
        report.push_str(LIGHT_RULE);
        if self.status_code_counts.is_empty() {
            report.push_str("  (no responses)\n");
        }
        for (code, count) in &self.status_code_counts {
            report.push_str(&format!("  [{}] {:<13} {}\n", code, status_label(*code), count));
        }
        report.push('\n');

        report.push_str(&format!(
            "DISCOVERED ENDPOINTS ({})\n",
            self.discovered_endpoints.len()
        ));
        report.push_str(LIGHT_RULE);
        for url in &self.discovered_endpoints {
            report.push_str(&format!("  {}\n", url));
        }
        report.push('\n');

        report.push_str(&format!(
            "UNUSUAL ENDPOINTS ({})\n",
            self.unusual_endpoints.len()
        ));
        report.push_str(LIGHT_RULE);
        for (url, code) in &self.unusual_endpoints {
            report.push_str(&format!("  [{}] {}\n", code, url));
        }
        report.push('\n');

        report.push_str(HEAVY_RULE);
        report.push_str("\nFor authorized security testing only.\n");

        report
    }
}

fn status_label(status_code: u16) -> &'static str {
    match status_code {
        100..=199 => "Informational",
        200..=299 => "Success",
        300..=399 => "Redirect",
        400..=499 => "Client Error",
        500..=599 => "Server Error",
        _ => "Other",
    }
}

/// Write the JSON form of the report to `path`.
pub fn write_report(report: &Report, path: &Path) -> Result<()> {
    let json = report.to_json()?;
    let mut file = File::create(path)?;
    file.write_all(json.as_bytes())?;
    file.write_all(b"\n")?;
    Ok(())
}
