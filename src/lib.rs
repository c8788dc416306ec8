// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! scadlabel
//!
//! Printable cable labels from text and a cable diameter. Jobs come from the
//! command line or a CSV file; geometry is produced by OpenSCAD from a
//! parametric cable-label description and written to the output directory.

pub mod batch;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod input;
pub mod label;
pub mod logging;

pub use batch::{Batch, BatchOptions, BatchReport, JobOutcome, JobStatus};
pub use config::LabelConfig;
pub use engine::{ModelGenerator, OpenScad, RenderSummary};
pub use error::{LabelError, Result};
pub use export::Exporter;
pub use input::{JobSource, RejectedRow};
pub use label::{ExportFormat, LabelJob};

/// Resolve `source` and render every job, calling `observer` per finished job
pub fn generate_with<F>(
    source: &JobSource,
    generator: &dyn ModelGenerator,
    exporter: &Exporter,
    options: BatchOptions,
    observer: F,
) -> Result<BatchReport>
where
    F: Fn(&JobOutcome) + Sync,
{
    let resolved = input::resolve(source, options.fail_fast)?;
    Batch::new(generator, exporter, options).run(&resolved.jobs, resolved.rejected, observer)
}

/// Resolve `source` and render every job
pub fn generate(
    source: &JobSource,
    generator: &dyn ModelGenerator,
    exporter: &Exporter,
    options: BatchOptions,
) -> Result<BatchReport> {
    generate_with(source, generator, exporter, options, |_| {})
}
