// Error types. Per spec §7, nearly every condition inside the chunking
// engine is recoverable and yields a (possibly flagged) chunk rather than
// an `Err` — these types exist for the handful of places that really do
// need to fail: invalid configuration and export I/O.

use thiserror::Error;

/// Errors raised while validating configuration or building a chunker.
/// Chunking itself, once a chunker is constructed, never returns this.
#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("invalid size configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid regular expression: {0}")]
    InvalidPattern(#[from] regex::Error),
}

pub type ChunkResult<T> = Result<T, ChunkError>;

/// Errors raised while exporting a chunk collection.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("format {0:?} is not supported for streaming export; use the batch exporter instead")]
    UnsupportedFormat(crate::config::ExportFormat),

    #[error("export failed at batch {index}: {source}")]
    Batch {
        index: usize,
        #[source]
        source: Box<ExportError>,
    },

    #[error("export failed at record {index}: {source}")]
    Record {
        index: usize,
        #[source]
        source: Box<ExportError>,
    },
}

pub type ExportResult<T> = Result<T, ExportError>;
