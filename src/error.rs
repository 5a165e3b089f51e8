//! Error taxonomy for the engine
//!
//! Training-time errors (`Configuration`, `InsufficientData`, `TrainingTimeout`) are fatal for
//! the operator invoking training. `ModelUnavailable` is what prediction callers see when no
//! artifact could be loaded or trained. Falling back to synthetic data or to a default crop
//! profile is not an error and never goes through this type.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Dataset present but unusable as configured (missing columns, schema mismatch)
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("insufficient training data in {path:?}: {reason}")]
    InsufficientData { path: PathBuf, reason: String },

    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("training exceeded time budget after {rounds_completed} rounds ({elapsed_secs:.1}s)")]
    TrainingTimeout {
        elapsed_secs: f64,
        rounds_completed: usize,
    },

    #[error("invalid booster parameters: {0}")]
    InvalidParameters(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("dataset error: {0}")]
    Dataset(#[from] polars::prelude::PolarsError),

    #[error("artifact encoding error: {0}")]
    Artifact(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
