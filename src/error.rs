//! Error types shared across the recognition cascade.
//!
//! Only [`PipelineError`] ever escapes [`crate::Pipeline::run`]. The softer
//! failures (no detection, degenerate crop, OCR backend missing) are recorded
//! on the returned [`crate::PipelineOutcome`] instead.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Stage of the cascade an adapter failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Detection,
    Classification,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Detection => write!(f, "detection"),
            Stage::Classification => write!(f, "classification"),
        }
    }
}

/// Crop geometry failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// The padded, clamped box has no area inside the image.
    #[error("invalid crop region: {width}x{height} at ({x}, {y})")]
    InvalidRegion { x: i64, y: i64, width: i64, height: i64 },
}

/// Failures while loading or validating a label vocabulary.
#[derive(Error, Debug)]
pub enum VocabularyError {
    #[error("failed to read vocabulary {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse vocabulary {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("vocabulary is empty")]
    Empty,

    #[error("vocabulary entry {index} is blank")]
    BlankLabel { index: usize },

    #[error("duplicate vocabulary label '{label}'")]
    DuplicateLabel { label: String },

    /// Two labels differ only in case or punctuation, so text matching
    /// could never tell them apart.
    #[error("vocabulary label '{label}' is indistinguishable from '{existing}'")]
    AmbiguousLabel { label: String, existing: String },

    #[error("failed to compile matcher for label '{label}'")]
    Pattern {
        label: String,
        #[source]
        source: regex::Error,
    },
}

/// Checkpoint discovery and selection failures.
#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("no checkpoint found in {}", .dir.display())]
    NoCheckpointFound { dir: PathBuf },

    #[error("failed to scan checkpoint directory {}", .dir.display())]
    Io {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration file failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

/// Unrecoverable failures of a pipeline invocation.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A detection or classification adapter raised; passed through untouched.
    #[error("{stage} adapter failed")]
    AdapterFailure {
        stage: Stage,
        #[source]
        source: anyhow::Error,
    },

    #[error("detection threshold {0} is outside [0, 1]")]
    InvalidThreshold(f32),
}

impl PipelineError {
    pub fn adapter(stage: Stage, source: anyhow::Error) -> Self {
        PipelineError::AdapterFailure { stage, source }
    }
}
