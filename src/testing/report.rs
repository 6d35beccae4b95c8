//! Run results and console reporting

use std::path::Path;
use std::time::Duration;

use colored::Colorize;
use serde::Serialize;

use crate::common::{Error, ErrorKind, Result};

use super::scenario::Artifact;

/// Outcome of one scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed,
    Skipped,
}

/// One row per scenario reached by the run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioResult {
    pub name: String,
    pub title: String,
    pub outcome: Outcome,
    pub critical: bool,
    /// Failure message or skip reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Machine code of the failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<Artifact>,
    pub duration_ms: u64,
}

impl ScenarioResult {
    pub fn passed(
        name: &str,
        title: String,
        critical: bool,
        artifact: Option<Artifact>,
        elapsed: Duration,
    ) -> Self {
        Self {
            name: name.to_string(),
            title,
            outcome: Outcome::Passed,
            critical,
            detail: None,
            error_code: None,
            error_kind: None,
            artifact,
            duration_ms: millis(elapsed),
        }
    }

    pub fn failed(
        name: &str,
        title: String,
        critical: bool,
        error: &Error,
        elapsed: Duration,
    ) -> Self {
        Self {
            name: name.to_string(),
            title,
            outcome: Outcome::Failed,
            critical,
            detail: Some(error.to_string()),
            error_code: Some(error.code()),
            error_kind: Some(error.kind()),
            artifact: None,
            duration_ms: millis(elapsed),
        }
    }

    pub fn skipped(name: &str, title: String, critical: bool, reason: String) -> Self {
        Self {
            name: name.to_string(),
            title,
            outcome: Outcome::Skipped,
            critical,
            detail: Some(reason),
            error_code: None,
            error_kind: None,
            artifact: None,
            duration_ms: 0,
        }
    }
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Aggregate of a run
///
/// Skipped scenarios are listed in `results` but do not count toward
/// `total`, `passed` or `failed`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub results: Vec<ScenarioResult>,
    /// Set when a critical scenario failed and ended the run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: ScenarioResult) {
        match result.outcome {
            Outcome::Passed => {
                self.total += 1;
                self.passed += 1;
            }
            Outcome::Failed => {
                self.total += 1;
                self.failed += 1;
            }
            Outcome::Skipped => self.skipped += 1,
        }
        self.results.push(result);
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Result of the scenario with the given id
    pub fn result(&self, name: &str) -> Option<&ScenarioResult> {
        self.results.iter().find(|r| r.name == name)
    }

    /// Machine-readable report
    pub fn to_json(&self) -> Result<serde_json::Value> {
        let mut value = serde_json::to_value(self)?;
        if let Some(object) = value.as_object_mut() {
            object.insert("all_passed".to_string(), self.all_passed().into());
        }
        Ok(value)
    }

    /// Write the JSON report to `path`
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.to_json()?)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Human-readable progress output on stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct Console {
    quiet: bool,
}

impl Console {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    pub fn scenario_started(&self, index: usize, title: &str) {
        if self.quiet {
            return;
        }
        println!("\n{} {}", format!("{}.", index).dimmed(), title.white().bold());
    }

    pub fn scenario_finished(&self, result: &ScenarioResult, details: &[String]) {
        if self.quiet {
            return;
        }
        match result.outcome {
            Outcome::Passed => println!("  {} {}", "✓".green(), "passed".green()),
            Outcome::Failed => println!(
                "  {} {}",
                "✗".red(),
                result.detail.as_deref().unwrap_or("failed")
            ),
            Outcome::Skipped => println!(
                "  {} skipped ({})",
                "-".yellow(),
                result.detail.as_deref().unwrap_or("guard not met").dimmed()
            ),
        }
        for line in details {
            println!("    {}", line);
        }
    }

    pub fn summary(&self, summary: &RunSummary) {
        if self.quiet {
            return;
        }
        println!("\n{}", "Summary:".cyan());
        println!(
            "  {} Passed: {}/{}",
            "✓".green(),
            summary.passed,
            summary.total
        );
        println!(
            "  {} Failed: {}/{}",
            "✗".red(),
            summary.failed,
            summary.total
        );
        if summary.skipped > 0 {
            println!("  {} Skipped: {}", "-".yellow(), summary.skipped);
        }
        if let Some(reason) = &summary.aborted {
            println!("  {} {}", "Aborted:".red().bold(), reason);
        }

        if summary.all_passed() {
            println!("\n{} {}\n", "✓".green().bold(), "All scenarios passed".green().bold());
        } else {
            println!(
                "\n{} {}\n",
                "✗".red().bold(),
                format!("{} scenario(s) failed", summary.failed).red().bold()
            );
        }
    }
}
