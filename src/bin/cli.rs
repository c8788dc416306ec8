// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! scadlabel CLI

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use scadlabel::cli::Reporter;
use scadlabel::input::{self, JobSource};
use scadlabel::label::parse_diameter;
use scadlabel::{logging, Batch, BatchOptions, ExportFormat, Exporter, LabelConfig, OpenScad};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "scadlabel", version)]
#[command(about = "Generate printable cable labels with OpenSCAD", long_about = None)]
struct Cli {
    /// Text of the label (words are joined into one label)
    #[arg(value_name = "TEXT", conflicts_with = "csv")]
    text: Vec<String>,

    /// Cable diameter in mm
    #[arg(short, long, value_name = "MM", value_parser = diameter_arg)]
    diameter: Option<f64>,

    /// Name of the font to be used
    #[arg(short, long)]
    font: Option<String>,

    /// CSV file with several labels at once. Format: label text, diameter
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,

    /// Path to the output directory
    #[arg(short = 'o', long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Output format (stl, 3mf, off, amf)
    #[arg(long, value_parser = format_arg)]
    format: Option<ExportFormat>,

    /// Make one label per TEXT argument
    #[arg(long)]
    separate: bool,

    /// Number of labels rendered in parallel
    #[arg(short, long, value_name = "N")]
    jobs: Option<usize>,

    /// Stop at the first malformed CSV row or failed label
    #[arg(long)]
    fail_fast: bool,

    /// Custom cable-label SCAD description
    #[arg(long, value_name = "FILE")]
    scad_file: Option<PathBuf>,

    /// OpenSCAD executable
    #[arg(long, value_name = "PATH")]
    openscad: Option<String>,

    /// Configuration file (default: ./scadlabel.toml if present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write a JSON report of the run
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn diameter_arg(value: &str) -> Result<f64, String> {
    parse_diameter(value).map_err(|e| e.to_string())
}

fn format_arg(value: &str) -> Result<ExportFormat, String> {
    value.parse().map_err(|e: scadlabel::LabelError| e.to_string())
}

impl Cli {
    /// Command-line flags win over the config file and environment
    fn merge_into(&self, config: &mut LabelConfig) {
        if let Some(diameter) = self.diameter {
            config.diameter_mm = diameter;
        }
        if let Some(font) = &self.font {
            config.font = font.clone();
        }
        if let Some(output_dir) = &self.output_dir {
            config.output_dir = output_dir.clone();
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(jobs) = self.jobs {
            config.jobs = jobs;
        }
        if let Some(scad_file) = &self.scad_file {
            config.scad_file = Some(scad_file.clone());
        }
        if let Some(openscad) = &self.openscad {
            config.openscad_path = openscad.clone();
        }
        config.fail_fast |= self.fail_fast;
    }

    fn source(&self, config: &LabelConfig) -> Option<JobSource> {
        if let Some(path) = &self.csv {
            return Some(JobSource::Csv {
                path: path.clone(),
                font: config.font.clone(),
            });
        }
        if self.text.iter().all(|t| t.trim().is_empty()) {
            return None;
        }
        Some(JobSource::Text {
            words: self.text.clone(),
            diameter_mm: config.diameter_mm,
            font: config.font.clone(),
            separate: self.separate,
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_cli_logger(cli.verbose);

    let mut config = LabelConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.merge_into(&mut config);

    let Some(source) = cli.source(&config) else {
        Reporter::report_error("no label text or --csv file given\n");
        Cli::command().write_help(&mut std::io::stderr())?;
        std::process::exit(2);
    };

    let engine = OpenScad::new(&config.openscad_path, config.scad_file.clone())
        .context("Failed to prepare the SCAD description")?;
    if let Err(e) = engine.version() {
        Reporter::report_error(&e.to_string());
        std::process::exit(1);
    }

    let resolved = match input::resolve(&source, config.fail_fast) {
        Ok(resolved) => resolved,
        Err(e) => {
            Reporter::report_error(&e.to_string());
            std::process::exit(1);
        }
    };

    let batch_mode = matches!(source, JobSource::Csv { .. }) || resolved.jobs.len() > 1;
    if resolved.jobs.is_empty() {
        if resolved.rejected.is_empty() {
            Reporter::report_info("No labels to generate");
        } else {
            Reporter::report_warning("No usable rows in the CSV file");
        }
    }

    let exporter = Exporter::new(&config.output_dir, config.format);
    let options = BatchOptions {
        jobs: config.jobs.max(1),
        fail_fast: config.fail_fast,
    };

    let progress = if resolved.jobs.len() > 1 {
        let pb = ProgressBar::new(resolved.jobs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let report = Batch::new(&engine, &exporter, options).run(&resolved.jobs, resolved.rejected, |outcome| {
        match &progress {
            Some(pb) => {
                pb.suspend(|| Reporter::report_outcome(outcome));
                pb.inc(1);
            }
            None => Reporter::report_outcome(outcome),
        }
    })?;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    if batch_mode {
        Reporter::report_summary(&report);
    }

    if let Some(path) = &cli.report {
        report
            .write_json(path)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        if cli.verbose {
            Reporter::report_info(&format!("Report written to {}", path.display()));
        }
    }

    if !report.is_success() {
        std::process::exit(1);
    }

    Ok(())
}
