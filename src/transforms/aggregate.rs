use crate::aggregate::aggregate_with_progress;
use crate::config::TransformConfig;
use crate::error::{Result, TransformError};
use crate::progress::progress_for;
use crate::transforms::TransformReport;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Merge the JSON files of the `input` directory into one JSON array.
///
/// A missing or empty directory still produces an empty array.
pub fn transform(input: &Path, output: &Path, config: &TransformConfig) -> Result<TransformReport> {
    let progress = progress_for(config, "Aggregating JSON files");
    let aggregation = aggregate_with_progress(input, progress.as_ref());

    let file = File::create(output).map_err(TransformError::sink)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &aggregation.documents).map_err(TransformError::sink)?;
    writer.flush().map_err(TransformError::sink)?;

    Ok(TransformReport {
        records: aggregation.documents.len() as u64,
    })
}
