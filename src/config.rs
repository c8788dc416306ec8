// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Configuration: defaults, `scadlabel.toml`, then environment overrides

use crate::error::{LabelError, Result};
use crate::label::ExportFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "scadlabel.toml";

/// Label generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Cable diameter used for text given on the command line
    pub diameter_mm: f64,
    /// Font passed to the SCAD description
    pub font: String,
    /// Where model files are written
    pub output_dir: PathBuf,
    /// Model file format
    pub format: ExportFormat,
    /// OpenSCAD executable
    pub openscad_path: String,
    /// Custom cable-label description, the bundled one otherwise
    pub scad_file: Option<PathBuf>,
    /// Worker threads
    pub jobs: usize,
    /// Stop on the first malformed row or failed label
    pub fail_fast: bool,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            diameter_mm: 6.0,
            font: "Bahnschrift".to_string(),
            output_dir: PathBuf::from("."),
            format: ExportFormat::Stl,
            openscad_path: "openscad".to_string(),
            scad_file: None,
            jobs: 1,
            fail_fast: false,
        }
    }
}

impl LabelConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| LabelError::io(path, e))?;
        toml::from_str(&content).map_err(|e| LabelError::Config {
            message: format!("failed to parse {}: {}", path.display(), e),
        })
    }

    /// Load `path` (or `scadlabel.toml` if present) and apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE)?,
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `OPENSCAD_PATH` and `SCADLABEL_*` overrides read through `var`
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        let invalid = |key: &str, value: &str| LabelError::Config {
            message: format!("invalid {}={:?}", key, value),
        };

        if let Some(openscad) = var("OPENSCAD_PATH") {
            self.openscad_path = openscad;
        }

        if let Some(font) = var("SCADLABEL_FONT") {
            self.font = font;
        }

        if let Some(diameter) = var("SCADLABEL_DIAMETER") {
            self.diameter_mm = crate::label::parse_diameter(&diameter)
                .map_err(|_| invalid("SCADLABEL_DIAMETER", &diameter))?;
        }

        if let Some(output_dir) = var("SCADLABEL_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(output_dir);
        }

        if let Some(jobs) = var("SCADLABEL_JOBS") {
            self.jobs = jobs.parse().map_err(|_| invalid("SCADLABEL_JOBS", &jobs))?;
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| LabelError::Config {
            message: format!("failed to serialize config: {}", e),
        })?;
        std::fs::write(path, content).map_err(|e| LabelError::io(path, e))
    }
}
