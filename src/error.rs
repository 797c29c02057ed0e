use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Error type shared by every stage of the pipeline
// ---------------------------------------------------------------------------

/// Everything that can go wrong between reading the arguments and closing
/// the chart window.
#[derive(Debug, Error)]
pub enum PlotError {
    #[error("unsupported file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("failed to open {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to read parquet file {}", path.display())]
    Parquet {
        path: PathBuf,
        #[source]
        source: parquet::errors::ParquetError,
    },

    #[error("failed to decode record batch from {}", path.display())]
    Arrow {
        path: PathBuf,
        #[source]
        source: arrow::error::ArrowError,
    },

    #[error("invalid pandas metadata in {}", path.display())]
    PandasMetadata {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} contains no data", .0.display())]
    EmptyData(PathBuf),

    #[error("invalid delimiter {0:?}: expected a single character")]
    InvalidDelimiter(String),

    #[error("column not found: {0:?}")]
    ColumnNotFound(String),

    #[error("column index {index} is out of range for a table with {len} columns")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("no numeric data to plot")]
    NoNumericData,

    #[error("failed to read interactive input")]
    Prompt(#[source] std::io::Error),

    #[error("failed to draw chart to {}: {message}", path.display())]
    Export { path: PathBuf, message: String },

    #[error("failed to encode image {}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("chart window failed: {0}")]
    Window(String),
}

pub type Result<T> = std::result::Result<T, PlotError>;
