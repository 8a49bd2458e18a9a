//! Loading JSON documents from disk

use crate::error::{Result, TransformError};
use serde_json::Value;
use std::path::Path;

/// Read a whole file into memory
pub fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| TransformError::open(path, e))
}

/// Parse a single JSON document.
///
/// Uses SIMD parsing; the buffer is used as scratch space and is not valid
/// JSON afterwards. Malformed input is [`TransformError::InvalidInput`].
pub fn parse_document(path: &Path, bytes: &mut [u8]) -> Result<Value> {
    simd_json::serde::from_slice::<Value>(bytes).map_err(|e| malformed(path, e))
}

/// Read and parse the single JSON document in `path`
pub fn load_document(path: &Path) -> Result<Value> {
    let mut bytes = read_bytes(path)?;
    parse_document(path, &mut bytes)
}

/// Parse a stream of whitespace-separated JSON values (JSON Lines included)
pub fn parse_values(path: &Path, bytes: &[u8]) -> Result<Vec<Value>> {
    serde_json::Deserializer::from_slice(bytes)
        .into_iter::<Value>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| malformed(path, e))
}

fn malformed(path: &Path, err: impl std::fmt::Display) -> TransformError {
    TransformError::InvalidInput(format!("{} is not valid JSON: {}", path.display(), err))
}
