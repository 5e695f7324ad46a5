//! Error kinds surfaced by the pipeline.
//!
//! Row-level problems (no protein-change notation, unknown residue code) are
//! not errors: they are counted and the row is skipped. Everything in here is
//! fatal for the batch or request that raised it.

use std::path::PathBuf;

use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictorError {
    /// A required column is missing from an uploaded or raw table
    #[error("required column `{column}` missing from {source_name}")]
    Schema { column: String, source_name: String },

    /// The persisted model is missing, unreadable or inconsistent
    #[error("failed to load model artifact {}: {reason}", path.display())]
    ArtifactLoad { path: PathBuf, reason: String },

    /// Uploaded content could not be read as a tab-separated table
    #[error("malformed upload: {0}")]
    MalformedUpload(String),

    /// Bad configuration values or unusable training data
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Polars(#[from] PolarsError),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl PredictorError {
    pub(crate) fn schema(column: &str, source_name: &str) -> Self {
        PredictorError::Schema {
            column: column.to_string(),
            source_name: source_name.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PredictorError>;
