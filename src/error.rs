use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, aggregating or plotting benchmark runs.
#[derive(Debug, Error)]
pub enum PlotError {
    /// Input CSV does not exist
    #[error("CSV file not found: {}", path.display())]
    InputNotFound {
        /// The path that was looked up
        path: PathBuf,
    },

    /// Filesystem failure other than a missing input
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Malformed CSV content
    #[error("CSV parse error at line {line}: {message}")]
    Csv {
        /// 1-based line number, header included
        line: u64,
        /// Reader message
        message: String,
    },

    /// A required column is absent from the header row
    #[error("missing column '{column}', available: {available:?}")]
    MissingColumn {
        /// Column that was required
        column: &'static str,
        /// Columns actually present
        available: Vec<String>,
    },

    /// A cell could not be converted to the column's type
    #[error("line {line}: cannot convert {column}={value:?} to {expected}")]
    Coerce {
        /// 1-based line number, header included
        line: u64,
        /// Column name
        column: &'static str,
        /// Raw cell text
        value: String,
        /// Target type description
        expected: &'static str,
    },

    /// Chart drawing or image encoding failed
    #[error("render failed: {0}")]
    Render(String),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, PlotError>;
