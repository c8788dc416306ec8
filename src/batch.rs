// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Running a list of label jobs and collecting the outcome

use crate::engine::{ModelGenerator, RenderSummary};
use crate::error::{LabelError, Result};
use crate::export::{Exporter, TargetCollision};
use crate::input::RejectedRow;
use crate::label::LabelJob;
use chrono::Utc;
use rayon::prelude::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{info, warn};

fn serialize_duration<S>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(duration.as_secs_f64())
}

fn deserialize_duration<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = f64::deserialize(deserializer)?;
    Ok(Duration::from_secs_f64(secs))
}

/// How a batch is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Worker threads; 1 runs jobs one after another on the calling thread
    pub jobs: usize,
    /// Stop starting new jobs after the first failure
    pub fail_fast: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            jobs: 1,
            fail_fast: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Written,
    Failed,
    Skipped,
}

/// Result of one label job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOutcome {
    pub job: LabelJob,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<RenderSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(serialize_with = "serialize_duration", deserialize_with = "deserialize_duration")]
    pub duration: Duration,
}

impl JobOutcome {
    fn skipped(job: &LabelJob) -> Self {
        Self {
            job: job.clone(),
            status: JobStatus::Skipped,
            output: None,
            summary: None,
            error: Some("skipped after an earlier failure".to_string()),
            duration: Duration::ZERO,
        }
    }
}

/// Summary of a whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub timestamp: String,
    pub total: usize,
    pub written: usize,
    pub failed: usize,
    pub skipped: usize,
    pub rejected: Vec<RejectedRow>,
    /// Labels that overwrote each other's model file
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collisions: Vec<TargetCollision>,
    pub outcomes: Vec<JobOutcome>,
}

impl BatchReport {
    fn new(outcomes: Vec<JobOutcome>, rejected: Vec<RejectedRow>, collisions: Vec<TargetCollision>) -> Self {
        let count = |status: JobStatus| outcomes.iter().filter(|o| o.status == status).count();
        Self {
            timestamp: Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            total: outcomes.len(),
            written: count(JobStatus::Written),
            failed: count(JobStatus::Failed),
            skipped: count(JobStatus::Skipped),
            rejected,
            collisions,
            outcomes,
        }
    }

    /// Every job written and no input row rejected
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.skipped == 0 && self.rejected.is_empty()
    }

    pub fn written_paths(&self) -> impl Iterator<Item = &Path> {
        self.outcomes.iter().filter_map(|o| o.output.as_deref())
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| LabelError::io(path, e))
    }
}

/// Runs jobs through a generator and an exporter
pub struct Batch<'a> {
    generator: &'a dyn ModelGenerator,
    exporter: &'a Exporter,
    options: BatchOptions,
}

impl<'a> Batch<'a> {
    pub fn new(generator: &'a dyn ModelGenerator, exporter: &'a Exporter, options: BatchOptions) -> Self {
        Self {
            generator,
            exporter,
            options,
        }
    }

    /// Process `jobs`, calling `observer` as each one finishes.
    ///
    /// Outcomes are returned in input order regardless of worker count.
    pub fn run<F>(&self, jobs: &[LabelJob], rejected: Vec<RejectedRow>, observer: F) -> Result<BatchReport>
    where
        F: Fn(&JobOutcome) + Sync,
    {
        if !jobs.is_empty() {
            self.exporter.prepare()?;
        }

        let collisions = self.exporter.collisions(jobs);
        for collision in &collisions {
            warn!(
                path = %collision.path.display(),
                labels = ?collision.labels,
                "labels share an output file, only the last one is kept"
            );
        }

        let stop = AtomicBool::new(false);
        let process = |job: &LabelJob| -> JobOutcome {
            let outcome = if stop.load(Ordering::SeqCst) {
                JobOutcome::skipped(job)
            } else {
                let outcome = self.run_one(job);
                if outcome.status == JobStatus::Failed && self.options.fail_fast {
                    stop.store(true, Ordering::SeqCst);
                }
                outcome
            };
            observer(&outcome);
            outcome
        };

        let outcomes: Vec<JobOutcome> = if self.options.jobs > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.options.jobs)
                .thread_name(|i| format!("label-worker-{}", i))
                .build()
                .map_err(|e| LabelError::Config {
                    message: format!("failed to start worker pool: {}", e),
                })?;
            pool.install(|| jobs.par_iter().map(process).collect())
        } else {
            jobs.iter().map(process).collect()
        };

        Ok(BatchReport::new(outcomes, rejected, collisions))
    }

    fn run_one(&self, job: &LabelJob) -> JobOutcome {
        let start = Instant::now();
        match self.exporter.export(self.generator, job) {
            Ok(exported) => {
                info!(label = job.text(), path = %exported.path.display(), "label written");
                JobOutcome {
                    job: job.clone(),
                    status: JobStatus::Written,
                    output: Some(exported.path),
                    summary: Some(exported.summary),
                    error: None,
                    duration: start.elapsed(),
                }
            }
            Err(e) => {
                warn!(job = %job, error = %e, "label failed");
                JobOutcome {
                    job: job.clone(),
                    status: JobStatus::Failed,
                    output: None,
                    summary: None,
                    error: Some(e.to_string()),
                    duration: start.elapsed(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::ExportFormat;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Writes a one-facet ASCII STL, failing for labels named `FAIL`
    struct Flaky;

    impl ModelGenerator for Flaky {
        fn generate(&self, job: &LabelJob, output: &Path) -> Result<RenderSummary> {
            if job.text() == "FAIL" {
                return Err(LabelError::Engine {
                    status: "exit status: 1".into(),
                    stderr: "ERROR: font not found".into(),
                });
            }
            let mut file = File::create(output).map_err(|e| LabelError::io(output, e))?;
            write!(
                file,
                "solid label\nfacet normal 0 0 1\nouter loop\nvertex 0 0 0\nvertex 1 0 0\nvertex 0 1 0\nendloop\nendfacet\nendsolid label\n"
            )
            .map_err(|e| LabelError::io(output, e))?;
            Ok(RenderSummary::default())
        }
    }

    fn jobs(texts: &[&str]) -> Vec<LabelJob> {
        texts
            .iter()
            .map(|t| LabelJob::new(t, 6.5, "Bahnschrift").unwrap())
            .collect()
    }

    #[test]
    fn test_best_effort_continues_after_failure() {
        let tmp = TempDir::new().unwrap();
        let exporter = Exporter::new(tmp.path(), ExportFormat::Stl);
        let batch = Batch::new(&Flaky, &exporter, BatchOptions::default());

        let report = batch.run(&jobs(&["A", "FAIL", "B"]), Vec::new(), |_| {}).unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.written, 2);
        assert_eq!(report.failed, 1);
        assert!(!report.is_success());
        assert!(tmp.path().join("B-6.5.stl").is_file());
    }

    #[test]
    fn test_fail_fast_skips_remaining() {
        let tmp = TempDir::new().unwrap();
        let exporter = Exporter::new(tmp.path(), ExportFormat::Stl);
        let options = BatchOptions {
            jobs: 1,
            fail_fast: true,
        };
        let batch = Batch::new(&Flaky, &exporter, options);

        let report = batch.run(&jobs(&["A", "FAIL", "B"]), Vec::new(), |_| {}).unwrap();
        let statuses: Vec<_> = report.outcomes.iter().map(|o| o.status).collect();
        assert_eq!(statuses, [JobStatus::Written, JobStatus::Failed, JobStatus::Skipped]);
        assert!(!tmp.path().join("B-6.5.stl").exists());
    }

    #[test]
    fn test_parallel_keeps_input_order() {
        let tmp = TempDir::new().unwrap();
        let exporter = Exporter::new(tmp.path(), ExportFormat::Stl);
        let options = BatchOptions {
            jobs: 4,
            fail_fast: false,
        };
        let batch = Batch::new(&Flaky, &exporter, options);
        let texts: Vec<String> = (0..16).map(|i| format!("L{}", i)).collect();
        let texts: Vec<&str> = texts.iter().map(String::as_str).collect();

        let seen = Mutex::new(0usize);
        let report = batch
            .run(&jobs(&texts), Vec::new(), |_| *seen.lock().unwrap() += 1)
            .unwrap();

        assert!(report.is_success());
        assert_eq!(*seen.lock().unwrap(), 16);
        let order: Vec<_> = report.outcomes.iter().map(|o| o.job.text()).collect();
        assert_eq!(order, texts);
        assert_eq!(report.written_paths().count(), 16);
    }

    #[test]
    fn test_empty_batch_creates_nothing() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("never");
        let exporter = Exporter::new(&out, ExportFormat::Stl);
        let batch = Batch::new(&Flaky, &exporter, BatchOptions::default());

        let report = batch.run(&[], Vec::new(), |_| {}).unwrap();
        assert_eq!(report.total, 0);
        assert!(report.is_success());
        assert!(!out.exists());
    }

    #[test]
    fn test_rejected_rows_fail_the_report() {
        let tmp = TempDir::new().unwrap();
        let exporter = Exporter::new(tmp.path(), ExportFormat::Stl);
        let batch = Batch::new(&Flaky, &exporter, BatchOptions::default());
        let rejected = vec![RejectedRow {
            line: 2,
            reason: "label text is empty".into(),
        }];

        let report = batch.run(&jobs(&["A"]), rejected, |_| {}).unwrap();
        assert_eq!(report.written, 1);
        assert!(!report.is_success());
    }

    #[test]
    fn test_colliding_targets_are_reported() {
        let tmp = TempDir::new().unwrap();
        let exporter = Exporter::new(tmp.path(), ExportFormat::Stl);
        let batch = Batch::new(&Flaky, &exporter, BatchOptions::default());

        let report = batch.run(&jobs(&["USB C", "USB_C", "DOCK"]), Vec::new(), |_| {}).unwrap();
        assert_eq!(report.written, 3);
        assert_eq!(report.collisions.len(), 1);
        assert_eq!(report.collisions[0].path, tmp.path().join("USB_C-6.5.stl"));
        assert_eq!(report.collisions[0].labels, ["USB C", "USB_C"]);
    }

    #[test]
    fn test_report_json() {
        let tmp = TempDir::new().unwrap();
        let exporter = Exporter::new(tmp.path().join("out"), ExportFormat::Stl);
        let batch = Batch::new(&Flaky, &exporter, BatchOptions::default());
        let report = batch.run(&jobs(&["A", "FAIL"]), Vec::new(), |_| {}).unwrap();

        let path = tmp.path().join("report.json");
        report.write_json(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["written"], 1);
        assert_eq!(value["outcomes"][1]["status"], "failed");
    }
}
