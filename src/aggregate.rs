//! Merge a directory of JSON files into one array

use crate::document::read_bytes;
use crate::error::{Result, TransformError};
use crate::progress::{NoProgress, Progress};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Extension of the files picked up from the directory
pub const EXTENSION: &str = "json";

/// Outcome of an aggregation
#[derive(Debug, Default)]
pub struct Aggregation {
    /// Merged documents: array files spliced in, anything else appended
    pub documents: Vec<Value>,

    /// Files that parsed and were merged
    pub merged: Vec<PathBuf>,

    /// Files skipped because they could not be read or decoded
    pub skipped: Vec<PathBuf>,
}

/// `*.json` files directly inside `dir`, ordered by file name
pub fn json_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == EXTENSION) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Merge every JSON file of `dir`.
///
/// Never fails: a missing directory or one without JSON files yields an empty
/// result, and a file that does not decode is skipped with a warning.
pub fn aggregate_with_progress(dir: &Path, progress: &dyn Progress) -> Aggregation {
    let mut aggregation = Aggregation::default();

    if !dir.is_dir() {
        warn!(path = %dir.display(), "directory not found");
        return aggregation;
    }

    let files = match json_files(dir) {
        Ok(files) => files,
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "could not list directory");
            return aggregation;
        }
    };
    if files.is_empty() {
        warn!(path = %dir.display(), "no JSON files found in the directory");
        return aggregation;
    }

    progress.start(Some(files.len() as u64));
    for path in files {
        match decode_file(&path) {
            Ok(Value::Array(items)) => {
                aggregation.documents.extend(items);
                aggregation.merged.push(path);
            }
            Ok(doc) => {
                aggregation.documents.push(doc);
                aggregation.merged.push(path);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping file");
                aggregation.skipped.push(path);
            }
        }
        progress.inc(1);
    }
    progress.finish();

    info!(
        files = aggregation.merged.len(),
        skipped = aggregation.skipped.len(),
        documents = aggregation.documents.len(),
        "aggregated JSON files"
    );
    aggregation
}

/// Parse one file of the directory; a malformed file is a [`TransformError::Decode`]
fn decode_file(path: &Path) -> Result<Value> {
    let mut bytes = read_bytes(path)?;
    simd_json::serde::from_slice::<Value>(&mut bytes).map_err(|e| TransformError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Merge every JSON file of `dir` into one sequence
pub fn aggregate(dir: &Path) -> Vec<Value> {
    aggregate_with_progress(dir, &NoProgress).documents
}
