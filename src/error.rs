// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error type shared by the label pipeline

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabelError {
    #[error("no label text or CSV file given")]
    Usage,

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    #[error("invalid cable diameter {value:?}: must be a positive number of millimeters")]
    InvalidDiameter { value: String },

    #[error("unable to find OpenSCAD binary {binary:?}, please add it to PATH or set OPENSCAD_PATH")]
    EngineNotFound { binary: String },

    #[error("OpenSCAD exited with {status}: {stderr}")]
    Engine { status: String, stderr: String },

    #[error("OpenSCAD produced an empty model for {text:?}")]
    EmptyModel { text: String },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LabelError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LabelError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, LabelError>;
