//! Lazy row sources over CSV files and XLSX sheets

use crate::error::{Result, TransformError};
use crate::stream::writer::Record;
use calamine::{Cell, DataRef, Dimensions};
use serde_json::{Number, Value};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Reads a delimited file one record at a time
pub struct CsvRows {
    reader: csv::Reader<File>,
    headers: Vec<String>,
    record: csv::StringRecord,
    path: PathBuf,
}

impl CsvRows {
    pub fn open(path: &Path, delimiter: u8) -> Result<Self> {
        let file = File::open(path).map_err(|e| TransformError::open(path, e))?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .from_reader(file);
        let headers = reader
            .headers()
            .map_err(|e| TransformError::source(path, e))?
            .iter()
            .map(str::to_string)
            .collect();

        Ok(CsvRows {
            reader,
            headers,
            record: csv::StringRecord::new(),
            path: path.to_path_buf(),
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }
}

impl Iterator for CsvRows {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record(&mut self.record) {
            Ok(true) => Some(Ok(self.record.iter().map(typed_cell).collect())),
            Ok(false) => None,
            Err(e) => Some(Err(TransformError::source(&self.path, e))),
        }
    }
}

/// Give a text cell its natural type: integer, float, boolean, else string.
/// Empty cells are null.
pub fn typed_cell(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        if let Some(n) = Number::from_f64(f).filter(|_| f.is_finite()) {
            return Value::Number(n);
        }
    }
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

/// A sheet cell reduced to its position and text
pub type SheetCell = ((u32, u32), String);

/// Assembles the sparse cell stream of a sheet into dense rows of text.
///
/// Rows run from the first sheet row to the last reported by the sheet's
/// dimension (or further, if cells appear beyond it). Each row is as wide as
/// the dimension, with missing cells as empty strings.
pub struct SheetRows<F> {
    next_cell: F,
    width: usize,
    next_row: u32,
    last_row: u32,
    pending: Option<SheetCell>,
    exhausted: bool,
}

impl<F> SheetRows<F>
where
    F: FnMut() -> Result<Option<SheetCell>>,
{
    /// `next_cell` yields the sheet's non-empty cells in row-major order
    pub fn new(next_cell: F, dimensions: Dimensions) -> Self {
        SheetRows {
            next_cell,
            width: dimensions.end.1 as usize + 1,
            next_row: 0,
            last_row: dimensions.end.0,
            pending: None,
            exhausted: false,
        }
    }

    fn pull(&mut self) -> Result<Option<SheetCell>> {
        if let Some(cell) = self.pending.take() {
            return Ok(Some(cell));
        }
        if self.exhausted {
            return Ok(None);
        }
        let cell = (self.next_cell)()?;
        if cell.is_none() {
            self.exhausted = true;
        }
        Ok(cell)
    }
}

impl<F> Iterator for SheetRows<F>
where
    F: FnMut() -> Result<Option<SheetCell>>,
{
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_row > self.last_row {
            match self.pull() {
                Ok(Some(cell)) => {
                    self.last_row = cell.0 .0;
                    self.pending = Some(cell);
                }
                Ok(None) => return None,
                Err(e) => return Some(Err(e)),
            }
        }

        let row_idx = self.next_row;
        let mut record: Record = vec![Value::String(String::new()); self.width];
        loop {
            let ((row, col), text) = match self.pull() {
                Ok(Some(cell)) => cell,
                Ok(None) => break,
                Err(e) => return Some(Err(e)),
            };
            if row > row_idx {
                self.pending = Some(((row, col), text));
                break;
            }
            if row < row_idx {
                continue;
            }
            let col = col as usize;
            if col >= record.len() {
                record.resize(col + 1, Value::String(String::new()));
            }
            record[col] = Value::String(text);
        }

        self.next_row += 1;
        Some(Ok(record))
    }
}

/// Adapt a calamine cell for [`SheetRows`]
pub fn sheet_cell(cell: &Cell<DataRef<'_>>) -> SheetCell {
    (cell.get_position(), render_cell(cell.get_value()))
}

/// Text form of a sheet cell
pub fn render_cell(value: &DataRef<'_>) -> String {
    match value {
        DataRef::Empty => String::new(),
        DataRef::String(s) => s.clone(),
        DataRef::SharedString(s) => s.to_string(),
        DataRef::Int(i) => i.to_string(),
        DataRef::Float(f) => render_float(*f),
        DataRef::Bool(b) => b.to_string(),
        DataRef::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.to_string())
            .unwrap_or_else(|| render_float(dt.as_f64())),
        DataRef::DateTimeIso(s) | DataRef::DurationIso(s) => s.clone(),
        DataRef::Error(e) => e.to_string(),
    }
}

/// Whole floats print without a fraction, matching how spreadsheets show them
fn render_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}
