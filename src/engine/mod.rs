// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Model generation
//!
//! Geometry is not built here: a [`ModelGenerator`] hands each job to an
//! external CAD engine, which writes the solid model to the requested path.

mod openscad;
mod summary;

pub use openscad::{scad_param, OpenScad, CABLE_LABEL_SCAD};
pub use summary::{BoundingBox, GeometrySummary, RenderSummary, TimeSummary};

use crate::error::Result;
use crate::label::LabelJob;
use std::path::Path;

/// Something that can turn a label job into a model file
pub trait ModelGenerator: Send + Sync {
    /// Render `job` into `output`; the format follows the file extension
    fn generate(&self, job: &LabelJob, output: &Path) -> Result<RenderSummary>;
}
