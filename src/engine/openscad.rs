// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! OpenSCAD subprocess backend

use super::{ModelGenerator, RenderSummary};
use crate::error::{LabelError, Result};
use crate::label::LabelJob;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;
use tempfile::NamedTempFile;
use tracing::debug;

/// The bundled cable-label description
pub const CABLE_LABEL_SCAD: &str = include_str!("../../assets/cable-label.scad");

/// Format a `-D` override so OpenSCAD parses it as a string literal
pub fn scad_param(key: &str, value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("{}=\"{}\"", key, escaped)
}

enum ScadSource {
    /// Bundled description written out for the lifetime of the backend
    Embedded(NamedTempFile),
    Custom(PathBuf),
}

/// Renders labels by running the `openscad` binary
pub struct OpenScad {
    binary: PathBuf,
    scad: ScadSource,
}

impl OpenScad {
    /// Backend using `binary` and either a custom SCAD file or the bundled one
    pub fn new(binary: impl Into<PathBuf>, scad_file: Option<PathBuf>) -> Result<Self> {
        let scad = match scad_file {
            Some(path) => {
                if !path.is_file() {
                    return Err(LabelError::io(
                        &path,
                        std::io::Error::new(std::io::ErrorKind::NotFound, "SCAD file not found"),
                    ));
                }
                ScadSource::Custom(path)
            }
            None => {
                let mut file = tempfile::Builder::new()
                    .prefix("cable-label-")
                    .suffix(".scad")
                    .tempfile()
                    .map_err(|e| LabelError::io(std::env::temp_dir(), e))?;
                let path = file.path().to_path_buf();
                file.write_all(CABLE_LABEL_SCAD.as_bytes())
                    .map_err(|e| LabelError::io(path, e))?;
                ScadSource::Embedded(file)
            }
        };

        Ok(Self {
            binary: binary.into(),
            scad,
        })
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn scad_file(&self) -> &Path {
        match &self.scad {
            ScadSource::Embedded(file) => file.path(),
            ScadSource::Custom(path) => path,
        }
    }

    /// Check the binary runs and is OpenSCAD; returns its version line
    pub fn version(&self) -> Result<String> {
        let not_found = || LabelError::EngineNotFound {
            binary: self.binary.display().to_string(),
        };

        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .map_err(|_| not_found())?;

        // Older releases print the version on stderr
        let text = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        if !output.status.success() || !text.contains("OpenSCAD") {
            return Err(not_found());
        }

        let version = text
            .lines()
            .find(|line| line.contains("OpenSCAD"))
            .unwrap_or_default()
            .trim()
            .to_string();
        debug!(%version, binary = %self.binary.display(), "found OpenSCAD");
        Ok(version)
    }

    /// Command-line arguments for rendering `job` into `output`
    pub fn args(&self, job: &LabelJob, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-D".into(),
            scad_param("text", job.text()).into(),
            "-D".into(),
            format!("cable_dia={}", job.diameter_mm()).into(),
            "-D".into(),
            scad_param("font", job.font()).into(),
            "--enable=textmetrics".into(),
            "--summary".into(),
            "all".into(),
            "--summary-file".into(),
            "-".into(),
            "-o".into(),
        ];
        args.push(output.as_os_str().to_owned());
        args.push(self.scad_file().as_os_str().to_owned());
        args
    }
}

impl ModelGenerator for OpenScad {
    fn generate(&self, job: &LabelJob, output: &Path) -> Result<RenderSummary> {
        let start = Instant::now();
        let args = self.args(job, output);
        debug!(binary = %self.binary.display(), ?args, "running OpenSCAD");

        let result = Command::new(&self.binary)
            .args(&args)
            .output()
            .map_err(|_| LabelError::EngineNotFound {
                binary: self.binary.display().to_string(),
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(LabelError::Engine {
                status: result.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&result.stdout);
        let summary = RenderSummary::parse(&stdout).unwrap_or_else(|e| {
            debug!(error = %e, "OpenSCAD summary not parseable");
            RenderSummary::default()
        });

        debug!(
            label = job.text(),
            elapsed = ?start.elapsed(),
            facets = ?summary.facets(),
            "OpenSCAD finished"
        );
        Ok(summary)
    }
}
