use crate::config::TransformConfig;
use crate::error::{Result, TransformError};
use crate::progress::progress_for;
use crate::stream::{estimate_row_count, sheet_cell, write_streaming, CsvSink, Format, SheetRows};
use crate::transforms::TransformReport;
use calamine::{open_workbook, Reader, Xlsx, XlsxError};
use std::path::Path;
use tracing::{info, warn};

/// Copy the first sheet of a workbook to CSV, streaming cell by cell.
///
/// Every sheet row, the first included, is written as a CSV record. An input
/// that is not a readable workbook is an error; a sheet that reports no rows
/// aborts the conversion without creating the output.
pub fn transform(input: &Path, output: &Path, config: &TransformConfig) -> Result<TransformReport> {
    if !input.exists() {
        return Err(TransformError::SourceNotFound(input.to_path_buf()));
    }

    let mut workbook: Xlsx<_> =
        open_workbook(input).map_err(|e: XlsxError| TransformError::source(input, e))?;

    let total = estimate_row_count(input, Format::Xlsx);
    if total == 0 {
        warn!(path = %input.display(), "aborting conversion as the sheet has no rows");
        return Ok(TransformReport::default());
    }

    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| TransformError::InvalidInput("workbook has no sheets".to_string()))?;
    let mut cells = workbook
        .worksheet_cells_reader(&sheet)
        .map_err(|e| TransformError::source(input, e))?;
    let dimensions = cells.dimensions();
    info!(%sheet, rows = total, "converting XLSX to CSV");

    let rows = SheetRows::new(
        || match cells.next_cell() {
            Ok(cell) => Ok(cell.as_ref().map(sheet_cell)),
            Err(e) => Err(TransformError::source(input, e)),
        },
        dimensions,
    );

    let mut sink = CsvSink::create(output, config.delimiter_or(b','))?;
    let progress = progress_for(config, "Converting XLSX to CSV");
    let records = write_streaming(
        &[],
        rows,
        &mut sink,
        config.batch_size,
        Some(total),
        progress.as_ref(),
    )?;

    Ok(TransformReport { records })
}
