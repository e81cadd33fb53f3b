//! # Reports
//!
//! Renders a [`RunReport`] as the plain-text summary or as JSON, and writes
//! it to a report file when one is configured.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::testing::runner::{RestoreOutcome, RunReport};
use crate::testing::scenario::Outcome;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to create report directory `{path}`: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write report file `{path}`: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub fn render(report: &RunReport, format: ReportFormat) -> Result<String, ReportError> {
    match format {
        ReportFormat::Text => Ok(render_text(report)),
        ReportFormat::Json => render_json(report),
    }
}

/// One `Test <name>: <OUTCOME>` line per result, then the summary block.
pub fn render_text(report: &RunReport) -> String {
    let mut out = String::new();
    for result in &report.results {
        match (&result.outcome, &result.message) {
            (Outcome::Failed, Some(message)) => {
                let _ = writeln!(out, "Test {}: {} - {message}", result.name, result.outcome);
            }
            (outcome, _) => {
                let _ = writeln!(out, "Test {}: {outcome}", result.name);
            }
        }
        for observation in &result.observations {
            let _ = writeln!(out, "    {} = {}", observation.key, observation.value);
        }
    }

    out.push('\n');
    out.push_str("Summary:\n");
    let _ = writeln!(out, "Total tests run: {}", report.total);
    let _ = writeln!(out, "Passed: {}", report.passed);
    let _ = writeln!(out, "Failed: {}", report.failed);
    if report.skipped > 0 {
        let _ = writeln!(out, "Skipped: {}", report.skipped);
    }
    if let Some(seed) = report.seed {
        let _ = writeln!(out, "Seed: {seed}");
    }
    match &report.restore {
        Some(RestoreOutcome::Restored { report }) if report.is_noop() => {
            out.push_str("Restore: nothing to do\n");
        }
        Some(RestoreOutcome::Restored { report }) => {
            for (collection, counts) in &report.collections {
                let _ = writeln!(
                    out,
                    "Restore {collection}: {} deleted, {} recreated, {} updated",
                    counts.deleted, counts.recreated, counts.updated
                );
            }
        }
        Some(RestoreOutcome::Failed { message }) => {
            let _ = writeln!(out, "Restore failed: {message}");
        }
        None => {}
    }
    out
}

pub fn render_json(report: &RunReport) -> Result<String, ReportError> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn write_report(path: &Path, report: &RunReport, format: ReportFormat) -> Result<(), ReportError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ReportError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let raw = render(report, format)?;
    fs::write(path, raw).map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), ?format, "report written");
    Ok(())
}
