//! Error types shared by every transform.
//!
//! Only [`TransformError::Decode`] is ever recovered from (the aggregator
//! downgrades it to a warning); every other variant propagates to the
//! dispatcher, which reports it and exits non-zero.

use std::path::{Path, PathBuf};
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum TransformError {
    /// The input parsed, but its top-level shape is not one the transform accepts.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A column holds values the tabular output cannot encode.
    #[error("cannot infer a type for column '{column}': {reason}")]
    SchemaInference { column: String, reason: String },

    /// Writing the output failed. The destination may be left truncated.
    #[error("failed to write output: {source}")]
    SinkWrite {
        #[source]
        source: BoxError,
    },

    /// The input file or directory does not exist.
    #[error("source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// One file of an aggregated directory failed to parse.
    #[error("could not decode JSON from {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    /// Reading the input failed after it was opened.
    #[error("failed to read {}: {source}", path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
}

impl TransformError {
    pub fn schema(column: impl Into<String>, reason: impl Into<String>) -> Self {
        TransformError::SchemaInference {
            column: column.into(),
            reason: reason.into(),
        }
    }

    pub fn sink(source: impl Into<BoxError>) -> Self {
        TransformError::SinkWrite {
            source: source.into(),
        }
    }

    pub fn source(path: &Path, source: impl Into<BoxError>) -> Self {
        TransformError::Source {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }

    /// Map an I/O error from opening `path`, turning `NotFound` into
    /// [`TransformError::SourceNotFound`].
    pub fn open(path: &Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            TransformError::SourceNotFound(path.to_path_buf())
        } else {
            TransformError::source(path, err)
        }
    }
}

pub type Result<T> = std::result::Result<T, TransformError>;
