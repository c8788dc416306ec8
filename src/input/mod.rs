// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Input resolution: command-line text or a CSV file become label jobs

mod sniff;

pub use sniff::{Dialect, SAMPLE_SIZE};

use crate::error::{LabelError, Result};
use crate::label::{parse_diameter, LabelJob};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Where label jobs come from
#[derive(Debug, Clone)]
pub enum JobSource {
    /// Positional words from the command line
    Text {
        words: Vec<String>,
        diameter_mm: f64,
        font: String,
        /// One job per word instead of one joined label
        separate: bool,
    },
    /// A headerless `text,diameter` file
    Csv { path: PathBuf, font: String },
}

/// A CSV row that could not be turned into a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRow {
    pub line: u64,
    pub reason: String,
}

/// Jobs produced from a source, plus any rows that were skipped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedJobs {
    pub jobs: Vec<LabelJob>,
    pub rejected: Vec<RejectedRow>,
}

/// Resolve a source into an ordered list of jobs.
///
/// With `fail_fast` the first malformed CSV row aborts resolution, otherwise
/// malformed rows are collected in [`ResolvedJobs::rejected`].
pub fn resolve(source: &JobSource, fail_fast: bool) -> Result<ResolvedJobs> {
    match source {
        JobSource::Text {
            words,
            diameter_mm,
            font,
            separate,
        } => {
            let jobs = text_jobs(words, *diameter_mm, font, *separate)?;
            Ok(ResolvedJobs {
                jobs,
                rejected: Vec::new(),
            })
        }
        JobSource::Csv { path, font } => {
            let resolved = read_csv_jobs(path, font)?;
            if fail_fast {
                if let Some(first) = resolved.rejected.first() {
                    return Err(LabelError::MalformedRow {
                        line: first.line,
                        reason: first.reason.clone(),
                    });
                }
            }
            Ok(resolved)
        }
    }
}

fn text_jobs(words: &[String], diameter_mm: f64, font: &str, separate: bool) -> Result<Vec<LabelJob>> {
    let words: Vec<&str> = words
        .iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        return Err(LabelError::Usage);
    }

    if separate {
        words
            .into_iter()
            .map(|w| LabelJob::new(w, diameter_mm, font))
            .collect()
    } else {
        Ok(vec![LabelJob::new(words.join(" "), diameter_mm, font)?])
    }
}

/// Read every row of a CSV file into jobs, sniffing the dialect first
pub fn read_csv_jobs(path: &Path, font: &str) -> Result<ResolvedJobs> {
    let content = std::fs::read_to_string(path).map_err(|e| LabelError::io(path, e))?;
    parse_csv_jobs(&content, font)
}

/// Parse CSV content into jobs; see [`read_csv_jobs`]
pub fn parse_csv_jobs(content: &str, font: &str) -> Result<ResolvedJobs> {
    let mut resolved = ResolvedJobs::default();
    if content.trim().is_empty() {
        return Ok(resolved);
    }

    let dialect = Dialect::sniff_prefix(content);
    debug!(
        delimiter = %(dialect.delimiter as char).escape_default(),
        quote = %(dialect.quote as char),
        "sniffed CSV dialect"
    );

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(dialect.delimiter)
        .quote(dialect.quote)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        match row_to_job(&record, dialect, font) {
            Ok(job) => resolved.jobs.push(job),
            Err(reason) => reject(&mut resolved, line, reason),
        }
    }

    Ok(resolved)
}

fn reject(resolved: &mut ResolvedJobs, line: u64, reason: String) {
    warn!(line, %reason, "skipping malformed CSV row");
    resolved.rejected.push(RejectedRow { line, reason });
}

fn row_to_job(record: &csv::StringRecord, dialect: Dialect, font: &str) -> std::result::Result<LabelJob, String> {
    let text = record.get(0).unwrap_or_default();
    let diameter = match record.get(1) {
        Some(d) if !d.is_empty() => d,
        _ => return Err(format!("expected `text{}diameter`", dialect.delimiter as char)),
    };
    if text.is_empty() {
        return Err("label text is empty".to_string());
    }
    if record.len() > 2 && record.iter().skip(2).any(|f| !f.is_empty()) {
        return Err(format!("expected 2 fields, found {}", record.len()));
    }

    let diameter_mm = parse_csv_diameter(diameter, dialect.delimiter).map_err(|e| e.to_string())?;
    LabelJob::new(text, diameter_mm, font).map_err(|e| e.to_string())
}

/// Parse a diameter cell; `6,5` is a decimal comma when the file is not comma separated
pub(crate) fn parse_csv_diameter(value: &str, delimiter: u8) -> Result<f64> {
    if delimiter != b',' {
        parse_diameter(&value.replace(',', "."))
    } else {
        parse_diameter(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const FONT: &str = "Bahnschrift";

    #[test]
    fn test_text_words_join_into_one_job() {
        let jobs = text_jobs(&["USB".into(), "C".into()], 4.0, FONT, false).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].text(), "USB C");
    }

    #[test]
    fn test_text_words_separate() {
        let jobs = text_jobs(&["USB".into(), "HDMI".into()], 4.0, FONT, true).unwrap();
        let texts: Vec<_> = jobs.iter().map(|j| j.text()).collect();
        assert_eq!(texts, ["USB", "HDMI"]);
        assert!(jobs.iter().all(|j| j.diameter_mm() == 4.0));
    }

    #[test]
    fn test_no_text_is_usage_error() {
        assert!(matches!(text_jobs(&[], 6.0, FONT, false), Err(LabelError::Usage)));
        assert!(matches!(
            text_jobs(&["  ".into()], 6.0, FONT, false),
            Err(LabelError::Usage)
        ));
    }

    #[test]
    fn test_csv_rows_in_order() {
        let resolved = parse_csv_jobs("SCREEN,6.5\nDOCK,7\n", FONT).unwrap();
        assert!(resolved.rejected.is_empty());
        assert_eq!(resolved.jobs.len(), 2);
        assert_eq!(resolved.jobs[0].text(), "SCREEN");
        assert_relative_eq!(resolved.jobs[0].diameter_mm(), 6.5);
        assert_eq!(resolved.jobs[1].text(), "DOCK");
        assert_relative_eq!(resolved.jobs[1].diameter_mm(), 7.0);
        assert!(resolved.jobs.iter().all(|j| j.font() == FONT));
    }

    #[test]
    fn test_csv_quoted_comma() {
        let resolved = parse_csv_jobs("\"USB, left\",6.5\nLAN,5\n", FONT).unwrap();
        assert_eq!(resolved.jobs[0].text(), "USB, left");
        assert_eq!(resolved.jobs.len(), 2);
    }

    #[test]
    fn test_csv_semicolon_decimal_comma() {
        let resolved = parse_csv_jobs("SCREEN;6,5\nDOCK;7\n", FONT).unwrap();
        assert_relative_eq!(resolved.jobs[0].diameter_mm(), 6.5);
    }

    #[test]
    fn test_csv_decimal_comma_on_every_row() {
        let resolved = parse_csv_jobs("SCREEN;6,5\nDOCK;7,5\n", FONT).unwrap();
        assert!(resolved.rejected.is_empty());
        let texts: Vec<_> = resolved.jobs.iter().map(|j| j.text()).collect();
        assert_eq!(texts, ["SCREEN", "DOCK"]);
        assert_relative_eq!(resolved.jobs[0].diameter_mm(), 6.5);
        assert_relative_eq!(resolved.jobs[1].diameter_mm(), 7.5);
    }

    #[test]
    fn test_csv_semicolon_with_comma_in_text() {
        let resolved = parse_csv_jobs("Power, main;5\nUSB, left;6\n", FONT).unwrap();
        assert!(resolved.rejected.is_empty());
        let texts: Vec<_> = resolved.jobs.iter().map(|j| j.text()).collect();
        assert_eq!(texts, ["Power, main", "USB, left"]);
        assert_relative_eq!(resolved.jobs[1].diameter_mm(), 6.0);
    }

    #[test]
    fn test_csv_empty_is_not_error() {
        assert!(parse_csv_jobs("", FONT).unwrap().jobs.is_empty());
        assert!(parse_csv_jobs("\n\n  \n", FONT).unwrap().jobs.is_empty());
    }

    #[test]
    fn test_csv_blank_lines_skipped() {
        let resolved = parse_csv_jobs("A,5\n\nB,6\n", FONT).unwrap();
        assert_eq!(resolved.jobs.len(), 2);
        assert!(resolved.rejected.is_empty());
    }

    #[test]
    fn test_csv_malformed_rows_collected() {
        let resolved = parse_csv_jobs("A,5\nB\nC,wide\n,4\nD,6\n", FONT).unwrap();
        let texts: Vec<_> = resolved.jobs.iter().map(|j| j.text()).collect();
        assert_eq!(texts, ["A", "D"]);
        let lines: Vec<_> = resolved.rejected.iter().map(|r| r.line).collect();
        assert_eq!(lines, [2, 3, 4]);
    }

    #[test]
    fn test_csv_too_many_fields() {
        let resolved = parse_csv_jobs("A,5,Arial\n", FONT).unwrap();
        assert!(resolved.jobs.is_empty());
        assert_eq!(resolved.rejected.len(), 1);
    }
}
