use thiserror::Error;

use super::model::NumericField;

/// Everything that can abort a dataset load.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Required input columns are missing.
    #[error("missing required columns: {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    /// The source locator carries no file identifier.
    #[error("invalid source URL (no file id): {0}")]
    InvalidLocator(String),

    #[error("download failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The host answered with something that is not a tabular file.
    #[error("download did not return a CSV file (content type: `{0}`)")]
    ContentType(String),

    #[error("could not read the file as CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("could not read the file as JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not read the Parquet file: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("could not decode Parquet columns: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("malformed tabular content: {0}")]
    Malformed(String),

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Misuse of the filter pipeline.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("column `{0}` is not present in this dataset")]
    MissingColumn(NumericField),
}
