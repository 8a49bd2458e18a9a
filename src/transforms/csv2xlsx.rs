use crate::config::TransformConfig;
use crate::error::Result;
use crate::progress::progress_for;
use crate::stream::{estimate_row_count, write_streaming, CsvRows, Format, XlsxSink};
use crate::transforms::TransformReport;
use std::path::Path;
use tracing::info;

/// Convert comma-delimited text to a single-sheet workbook
pub fn transform(input: &Path, output: &Path, config: &TransformConfig) -> Result<TransformReport> {
    convert(input, output, config.delimiter_or(b','), config)
}

/// Convert semicolon-delimited text to a single-sheet workbook
pub fn transform_semicolon(
    input: &Path,
    output: &Path,
    config: &TransformConfig,
) -> Result<TransformReport> {
    convert(input, output, config.delimiter_or(b';'), config)
}

fn convert(input: &Path, output: &Path, delimiter: u8, config: &TransformConfig) -> Result<TransformReport> {
    let total = estimate_row_count(input, Format::Csv);
    let rows = CsvRows::open(input, delimiter)?;
    let columns = rows.headers().to_vec();
    info!(columns = columns.len(), estimated_rows = total, "converting CSV to XLSX");

    let mut sink = XlsxSink::create(output)?;
    let progress = progress_for(config, "Converting CSV to XLSX");
    let records = write_streaming(
        &columns,
        rows,
        &mut sink,
        config.batch_size,
        Some(total),
        progress.as_ref(),
    )?;

    Ok(TransformReport { records })
}
