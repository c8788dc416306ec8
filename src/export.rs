// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Writing generated models into the output directory
//!
//! The engine renders into a hidden staging file next to the final location.
//! Only a model that rendered successfully (and, for STL, has at least one
//! facet) is moved to its final name, so a failed job never leaves a partial
//! file behind.

use crate::engine::{ModelGenerator, RenderSummary};
use crate::error::{LabelError, Result};
use crate::label::{ExportFormat, LabelJob};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// A model file that has been rendered but not yet committed
pub struct StagedModel {
    file: NamedTempFile,
}

impl StagedModel {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// A committed model
#[derive(Debug, Clone)]
pub struct ExportedModel {
    pub path: PathBuf,
    pub summary: RenderSummary,
}

/// Labels whose model files would land on the same path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetCollision {
    pub path: PathBuf,
    pub labels: Vec<String>,
}

/// Places model files in an output directory
#[derive(Debug, Clone)]
pub struct Exporter {
    dir: PathBuf,
    format: ExportFormat,
}

impl Exporter {
    pub fn new(dir: impl Into<PathBuf>, format: ExportFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn format(&self) -> ExportFormat {
        self.format
    }

    /// Create the output directory if it does not exist
    pub fn prepare(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| LabelError::io(&self.dir, e))
    }

    /// Final location of `job`'s model
    pub fn target(&self, job: &LabelJob) -> PathBuf {
        job.output_path(&self.dir, self.format)
    }

    /// Groups of jobs that map to the same file, in input order
    pub fn collisions(&self, jobs: &[LabelJob]) -> Vec<TargetCollision> {
        let mut index: HashMap<PathBuf, usize> = HashMap::new();
        let mut groups: Vec<TargetCollision> = Vec::new();

        for job in jobs {
            let target = self.target(job);
            match index.get(&target) {
                Some(&i) => groups[i].labels.push(job.text().to_string()),
                None => {
                    index.insert(target.clone(), groups.len());
                    groups.push(TargetCollision {
                        path: target,
                        labels: vec![job.text().to_string()],
                    });
                }
            }
        }

        groups.retain(|g| g.labels.len() > 1);
        groups
    }

    /// Reserve a staging file the engine can render into
    pub fn stage(&self) -> Result<StagedModel> {
        let file = tempfile::Builder::new()
            .prefix(".scadlabel-")
            .suffix(&format!(".{}", self.format.extension()))
            .tempfile_in(&self.dir)
            .map_err(|e| LabelError::io(&self.dir, e))?;
        Ok(StagedModel { file })
    }

    /// Check the staged model and move it to its final name
    pub fn commit(&self, staged: StagedModel, job: &LabelJob) -> Result<PathBuf> {
        if self.format == ExportFormat::Stl {
            check_stl(staged.path(), job)?;
        }

        let target = self.target(job);
        staged
            .file
            .persist(&target)
            .map_err(|e| LabelError::io(&target, e.error))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&target, std::fs::Permissions::from_mode(0o644))
                .map_err(|e| LabelError::io(&target, e))?;
        }

        debug!(path = %target.display(), "model written");
        Ok(target)
    }

    /// Render `job` with `generator` and commit the result
    pub fn export(&self, generator: &dyn ModelGenerator, job: &LabelJob) -> Result<ExportedModel> {
        let staged = self.stage()?;
        let summary = generator.generate(job, staged.path())?;
        let path = self.commit(staged, job)?;
        Ok(ExportedModel { path, summary })
    }
}

/// Reject STL files without any facets
fn check_stl(path: &Path, job: &LabelJob) -> Result<()> {
    let empty = || LabelError::EmptyModel {
        text: job.text().to_string(),
    };

    let len = std::fs::metadata(path)
        .map_err(|e| LabelError::io(path, e))?
        .len();
    if len == 0 {
        return Err(empty());
    }

    let mut file = File::open(path).map_err(|e| LabelError::io(path, e))?;
    let mesh = stl_io::read_stl(&mut file).map_err(|e| LabelError::io(path, e))?;
    if mesh.faces.is_empty() {
        return Err(empty());
    }

    Ok(())
}
