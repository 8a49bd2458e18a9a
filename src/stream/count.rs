//! Cheap row-count estimates used to size progress bars
//!
//! The two formats count differently. A CSV estimate excludes the header
//! line; an XLSX estimate is the sheet's last row number and so includes it.
//! Each matches what its transform counts as progress: CSV readers consume
//! the header, the sheet reader copies every sheet row.

use calamine::{open_workbook, Reader, Xlsx, XlsxError};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};

/// File formats with a row-count estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Xlsx,
}

/// Estimate the number of rows in `path` without parsing its content.
///
/// Never fails: a missing or unreadable file is reported as a warning and
/// counts as zero rows.
pub fn estimate_row_count(path: &Path, format: Format) -> u64 {
    if !path.exists() {
        warn!(path = %path.display(), "file not found, assuming zero rows");
        return 0;
    }

    let counted = match format {
        Format::Csv => count_data_lines(path),
        Format::Xlsx => sheet_max_row(path),
    };

    match counted {
        Ok(rows) => rows,
        Err(reason) => {
            warn!(path = %path.display(), %reason, "could not count rows, assuming zero");
            0
        }
    }
}

/// Newline-terminated lines minus the header line
fn count_data_lines(path: &Path) -> Result<u64, String> {
    let lines = match wc_lines(path) {
        Some(lines) => lines,
        None => scan_lines(path)?,
    };
    Ok(lines.saturating_sub(1))
}

/// Ask `wc -l`, if it is installed and answers sensibly
fn wc_lines(path: &Path) -> Option<u64> {
    let output = Command::new("wc").arg("-l").arg(path).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines = stdout.split_whitespace().next()?.parse().ok();
    debug!(path = %path.display(), ?lines, "counted lines with wc");
    lines
}

fn scan_lines(path: &Path) -> Result<u64, String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    let mut reader = BufReader::new(file);
    let mut lines = 0u64;

    loop {
        let buf = reader.fill_buf().map_err(|e| e.to_string())?;
        if buf.is_empty() {
            break;
        }
        lines += buf.iter().filter(|&&b| b == b'\n').count() as u64;
        let len = buf.len();
        reader.consume(len);
    }

    Ok(lines)
}

/// One-based index of the first sheet's last row, from its dimension record
fn sheet_max_row(path: &Path) -> Result<u64, String> {
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e: XlsxError| e.to_string())?;
    let Some(sheet) = workbook.sheet_names().first().cloned() else {
        return Ok(0);
    };
    let cells = workbook
        .worksheet_cells_reader(&sheet)
        .map_err(|e| e.to_string())?;
    Ok(u64::from(cells.dimensions().end.0) + 1)
}
