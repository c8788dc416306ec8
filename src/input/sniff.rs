// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CSV dialect detection
//!
//! Label lists are usually typed by hand or exported from a spreadsheet, so the
//! delimiter varies with locale (`,` vs `;`) and text may be quoted with either
//! quote character. The sniffer inspects a short sample and guesses both.

use std::cmp::Reverse;

/// Number of bytes inspected when sniffing a file
pub const SAMPLE_SIZE: usize = 1024;

const DELIMITERS: [u8; 5] = [b',', b';', b'\t', b'|', b':'];
const QUOTES: [u8; 2] = [b'"', b'\''];

/// Delimiter and quote character of a CSV file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub delimiter: u8,
    pub quote: u8,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
        }
    }
}

impl Dialect {
    /// Guess the dialect of `sample`
    pub fn sniff(sample: &str) -> Self {
        let quote = sniff_quote(sample);
        let delimiter = sniff_delimiter(sample, quote);
        Self { delimiter, quote }
    }

    /// Guess the dialect from the first [`SAMPLE_SIZE`] bytes of `content`
    pub fn sniff_prefix(content: &str) -> Self {
        let mut end = content.len().min(SAMPLE_SIZE);
        while !content.is_char_boundary(end) {
            end -= 1;
        }
        Self::sniff(&content[..end])
    }
}

/// A quote character counts when it opens a field and is closed later on
fn sniff_quote(sample: &str) -> u8 {
    let mut best = (QUOTES[0], 0usize);

    for &quote in &QUOTES {
        let mut hits = 0;
        for line in sample.lines() {
            let bytes = line.as_bytes();
            for (i, &b) in bytes.iter().enumerate() {
                if b != quote {
                    continue;
                }
                let opens_field = i == 0 || DELIMITERS.contains(&bytes[i - 1]);
                let closed = bytes[i + 1..].contains(&quote);
                if opens_field && closed {
                    hits += 1;
                    break;
                }
            }
        }
        if hits > best.1 {
            best = (quote, hits);
        }
    }

    best.0
}

/// Per-line counts of `delimiter` outside quoted regions
fn delimiter_counts(sample: &str, delimiter: u8, quote: u8) -> Vec<usize> {
    sample
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let mut quoted = false;
            line.bytes()
                .filter(|&b| {
                    if b == quote {
                        quoted = !quoted;
                    }
                    b == delimiter && !quoted
                })
                .count()
        })
        .collect()
}

/// Fields of `line` split on `delimiter` outside quotes, trimmed and unquoted
fn split_fields(line: &str, delimiter: u8, quote: u8) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut quoted = false;
    let mut start = 0;
    for (i, b) in line.bytes().enumerate() {
        if b == quote {
            quoted = !quoted;
        } else if b == delimiter && !quoted {
            fields.push(&line[start..i]);
            start = i + 1;
        }
    }
    fields.push(&line[start..]);

    fields
        .into_iter()
        .map(|f| f.trim().trim_matches(quote as char).trim())
        .collect()
}

/// How well a delimiter explains the sample as `text,diameter` rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Fit {
    /// Lines that split into exactly a text and a diameter
    rows: usize,
    /// Other candidate delimiters left inside the text fields, fewer is better
    stray: Reverse<usize>,
    /// Lines containing the delimiter at all
    present: usize,
    /// Lines agreeing with the most common delimiter count
    consistent: usize,
}

fn fit(sample: &str, delimiter: u8, quote: u8) -> Option<Fit> {
    let counts = delimiter_counts(sample, delimiter, quote);
    let present = counts.iter().filter(|&&c| c > 0).count();
    if present == 0 {
        return None;
    }

    let mode = counts
        .iter()
        .filter(|&&c| c > 0)
        .max_by_key(|&&c| (counts.iter().filter(|&&o| o == c).count(), Reverse(c)))
        .copied()
        .unwrap_or(0);
    let consistent = counts.iter().filter(|&&c| c == mode).count();

    let mut rows = 0;
    let mut stray = 0;
    for line in sample.lines().filter(|line| !line.trim().is_empty()) {
        let fields = split_fields(line, delimiter, quote);
        if fields.len() != 2 || fields[0].is_empty() {
            continue;
        }
        if super::parse_csv_diameter(fields[1], delimiter).is_err() {
            continue;
        }
        rows += 1;
        stray += fields[0]
            .bytes()
            .filter(|b| *b != delimiter && DELIMITERS.contains(b))
            .count();
    }

    Some(Fit {
        rows,
        stray: Reverse(stray),
        present,
        consistent,
    })
}

/// Pick the candidate that turns the most lines into `text,diameter` rows;
/// ties go to the candidate with fewer stray delimiters in the text, then
/// to the one present on more lines, then to candidate order.
fn sniff_delimiter(sample: &str, quote: u8) -> u8 {
    let mut best: Option<(u8, Fit)> = None;

    for &delimiter in &DELIMITERS {
        let Some(fit) = fit(sample, delimiter, quote) else {
            continue;
        };
        if best.map_or(true, |(_, best_fit)| fit > best_fit) {
            best = Some((delimiter, fit));
        }
    }

    best.map(|(d, _)| d).unwrap_or(b',')
}
