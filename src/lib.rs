//! # Niv - Streaming File-Format Transforms
//!
//! Converters between CSV, XLSX, JSON and JSON Lines, driven from one
//! command line dispatcher.
//!
//! ## Modules
//!
//! - **flatten**: Turn nested JSON into flat `key.path -> scalar` records
//! - **table**: Explode list columns and unnest struct columns until a table is flat
//! - **stream**: Lazy row sources, batched output sinks and row-count estimates
//! - **aggregate**: Merge a directory of JSON files into one array
//! - **transforms**: The registry of named transforms the CLI dispatches to
//!
//! ## Quick Start
//!
//! ### Flattening
//!
//! ```rust
//! use niv::flatten::flatten;
//! use serde_json::json;
//!
//! let record = flatten(json!({"user": {"name": "Alice", "tags": ["a", "b"]}}), ".");
//! assert_eq!(record["user.name"], "Alice");
//! assert_eq!(record["user.tags.1"], "b");
//! ```
//!
//! ### Running a transform
//!
//! ```rust,no_run
//! use niv::{run_transform, TransformConfig};
//! use std::path::Path;
//!
//! # fn main() -> niv::Result<()> {
//! let report = run_transform(
//!     "json2csv",
//!     Path::new("events.jsonl"),
//!     Path::new("events.csv"),
//!     &TransformConfig::default(),
//! )?;
//! println!("{} rows", report.records);
//! # Ok(())
//! # }
//! ```

use std::path::Path;

pub mod aggregate;
pub mod config;
pub mod document;
pub mod error;
pub mod flatten;
pub mod logging;
pub mod progress;
pub mod stream;
pub mod table;
pub mod transforms;

// Re-export commonly used types for convenience
pub use aggregate::{aggregate, Aggregation};
pub use config::TransformConfig;
pub use error::{Result, TransformError};
pub use flatten::{flatten, FlatRecord, KeyPathFlattener};
pub use stream::{estimate_row_count, write_streaming, Format, FormatWriter};
pub use table::{unnest, Table, Unnester};
pub use transforms::{lookup, TransformReport, TransformSpec, TRANSFORMS};

/// Run a registered transform by name
pub fn run_transform(
    name: &str,
    input: &Path,
    output: &Path,
    config: &TransformConfig,
) -> Result<TransformReport> {
    let spec = lookup(name)
        .ok_or_else(|| TransformError::InvalidInput(format!("unknown transform '{}'", name)))?;
    (spec.run)(input, output, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_run_transform_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.json");
        let output = dir.path().join("out.json");
        std::fs::write(&input, r#"{"id": 1, "posts": [{"id": 10}]}"#).unwrap();

        let config = TransformConfig {
            show_progress: false,
            ..TransformConfig::default()
        };
        let report = run_transform("flatten", &input, &output, &config).unwrap();
        assert_eq!(report.records, 1);

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written, json!([{"id": 1, "posts.0.id": 10}]));
    }

    #[test]
    fn test_unknown_transform() {
        let err = run_transform(
            "csv2parquet",
            Path::new("a"),
            Path::new("b"),
            &TransformConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TransformError::InvalidInput(_)));
    }
}
