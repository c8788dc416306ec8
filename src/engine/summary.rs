// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! OpenSCAD render summary (`--summary all --summary-file -`)

use serde::{Deserialize, Serialize};

/// Statistics OpenSCAD reports after rendering a model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSummary {
    pub geometry: Option<GeometrySummary>,
    pub time: Option<TimeSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometrySummary {
    pub dimensions: Option<u8>,
    pub vertices: Option<u64>,
    pub facets: Option<u64>,
    pub bounding_box: Option<BoundingBox>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundingBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
    pub size: [f64; 3],
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeSummary {
    /// Total render time in milliseconds
    pub total: Option<f64>,
}

impl RenderSummary {
    /// Parse the summary from OpenSCAD's stdout, which may carry other output
    /// before the JSON document.
    pub fn parse(stdout: &str) -> serde_json::Result<Self> {
        let start = stdout.find('{').unwrap_or(0);
        serde_json::from_str(&stdout[start..])
    }

    pub fn facets(&self) -> Option<u64> {
        self.geometry.as_ref().and_then(|g| g.facets)
    }

    pub fn vertices(&self) -> Option<u64> {
        self.geometry.as_ref().and_then(|g| g.vertices)
    }

    pub fn size(&self) -> Option<[f64; 3]> {
        self.geometry
            .as_ref()
            .and_then(|g| g.bounding_box.as_ref())
            .map(|b| b.size)
    }
}
