// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI output reporter with colored formatting

use crate::batch::{BatchReport, JobOutcome, JobStatus};
use colored::*;
use std::time::Duration;

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    /// One line per finished label
    pub fn report_outcome(outcome: &JobOutcome) {
        match outcome.status {
            JobStatus::Written => {
                let path = outcome
                    .output
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                let mut line = format!(
                    "{} {} {} {}",
                    "✅".green(),
                    outcome.job.text().bold(),
                    "→".bright_black(),
                    path.cyan()
                );
                if let Some(facets) = outcome.summary.as_ref().and_then(|s| s.facets()) {
                    line.push_str(&format!(" {}", format!("({} facets)", facets).bright_black()));
                }
                line.push_str(&format!(" {}", Self::format_duration(outcome.duration).yellow()));
                println!("{}", line);
            }
            JobStatus::Failed => {
                eprintln!(
                    "{} {} {}",
                    "❌".red(),
                    outcome.job.text().bold(),
                    outcome.error.as_deref().unwrap_or("failed").red()
                );
            }
            JobStatus::Skipped => {
                println!("{} {} {}", "⏭".yellow(), outcome.job.text().bold(), "skipped".bright_black());
            }
        }
    }

    /// Batch summary with rejected CSV rows
    pub fn report_summary(report: &BatchReport) {
        println!("\n{}", "═".repeat(80).bright_black());
        println!("{}", "Summary".bold());
        println!("{}", "═".repeat(80).bright_black());

        println!(
            "{} {} | {} {} | {} {} | {} {}",
            "Total:".bright_black(),
            report.total.to_string().cyan(),
            "Written:".bright_black(),
            report.written.to_string().green(),
            "Failed:".bright_black(),
            Self::count(report.failed),
            "Rejected rows:".bright_black(),
            Self::count(report.rejected.len()),
        );

        if !report.rejected.is_empty() {
            println!("\n{}", "Rejected rows:".red().bold());
            for row in &report.rejected {
                println!("  {} line {}: {}", "❌".red(), row.line, row.reason);
            }
        }

        if !report.collisions.is_empty() {
            println!("\n{}", "Overwritten files:".yellow().bold());
            for collision in &report.collisions {
                println!(
                    "  {} {} <- {}",
                    "⚠️".yellow(),
                    collision.path.display(),
                    collision.labels.join(", ")
                );
            }
        }

        println!("{}", "═".repeat(80).bright_black());
    }

    fn count(n: usize) -> ColoredString {
        if n > 0 {
            n.to_string().red()
        } else {
            n.to_string().green()
        }
    }

    /// Report error
    pub fn report_error(message: &str) {
        eprintln!("\n{} {}", "❌ Error:".red().bold(), message);
    }

    /// Report warning
    pub fn report_warning(message: &str) {
        eprintln!("{} {}", "⚠️  Warning:".yellow().bold(), message);
    }

    /// Report info
    pub fn report_info(message: &str) {
        println!("{} {}", "ℹ️".bright_blue(), message);
    }

    /// Format duration for display
    pub(crate) fn format_duration(duration: Duration) -> String {
        let micros = duration.as_micros();

        if micros < 1_000 {
            format!("{}µs", micros)
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1_000.0)
        } else {
            format!("{:.2}s", micros as f64 / 1_000_000.0)
        }
    }
}
