// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Label jobs and their output naming

use crate::error::{LabelError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A single label to render: text, cable diameter and font
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLabelJob")]
pub struct LabelJob {
    text: String,
    diameter_mm: f64,
    font: String,
}

/// Unchecked wire form of [`LabelJob`], validated through [`LabelJob::new`]
#[derive(Deserialize)]
struct RawLabelJob {
    text: String,
    diameter_mm: f64,
    font: String,
}

impl TryFrom<RawLabelJob> for LabelJob {
    type Error = LabelError;

    fn try_from(raw: RawLabelJob) -> Result<Self> {
        LabelJob::new(raw.text, raw.diameter_mm, raw.font)
    }
}

impl LabelJob {
    /// Create a job, trimming the text and validating the diameter
    pub fn new(text: impl AsRef<str>, diameter_mm: f64, font: impl Into<String>) -> Result<Self> {
        if !diameter_mm.is_finite() || diameter_mm <= 0.0 {
            return Err(LabelError::InvalidDiameter {
                value: diameter_mm.to_string(),
            });
        }

        Ok(Self {
            text: text.as_ref().trim().to_string(),
            diameter_mm,
            font: font.into(),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn diameter_mm(&self) -> f64 {
        self.diameter_mm
    }

    pub fn font(&self) -> &str {
        &self.font
    }

    /// File name without extension, e.g. `USB_C-6.5`
    pub fn file_stem(&self) -> String {
        let text: String = self
            .text
            .chars()
            .map(|c| match c {
                ' ' | '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect();

        format!("{}-{}", text, self.diameter_mm)
    }

    /// Final path of this label's model inside `dir`
    pub fn output_path(&self, dir: &Path, format: ExportFormat) -> PathBuf {
        dir.join(format!("{}.{}", self.file_stem(), format.extension()))
    }
}

impl fmt::Display for LabelJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" ({} mm, {})", self.text, self.diameter_mm, self.font)
    }
}

/// Parse a diameter field from the command line or a CSV cell
pub fn parse_diameter(value: &str) -> Result<f64> {
    let invalid = || LabelError::InvalidDiameter {
        value: value.to_string(),
    };

    let diameter: f64 = value.trim().parse().map_err(|_| invalid())?;
    if !diameter.is_finite() || diameter <= 0.0 {
        return Err(invalid());
    }

    Ok(diameter)
}

/// Model file formats OpenSCAD can export and slicers accept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Stl,
    #[serde(rename = "3mf")]
    ThreeMf,
    Off,
    Amf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Stl => "stl",
            ExportFormat::ThreeMf => "3mf",
            ExportFormat::Off => "off",
            ExportFormat::Amf => "amf",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "stl" => Ok(ExportFormat::Stl),
            "3mf" => Ok(ExportFormat::ThreeMf),
            "off" => Ok(ExportFormat::Off),
            "amf" => Ok(ExportFormat::Amf),
            other => Err(LabelError::Config {
                message: format!("unsupported format {:?} (supported: stl, 3mf, off, amf)", other),
            }),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
