//! Bounded-memory batch writing to CSV and XLSX sinks

use crate::error::{Result, TransformError};
use crate::progress::Progress;
use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use serde_json::Value;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A row of cells handed to a sink
pub type Record = Vec<Value>;

/// An output format that accepts a header and then batches of rows
pub trait FormatWriter {
    fn write_header(&mut self, columns: &[String]) -> Result<()>;

    fn write_batch(&mut self, rows: &[Record]) -> Result<()>;

    /// Flush everything still buffered; called once after the last batch
    fn finish(&mut self) -> Result<()>;
}

/// Write `source` to `sink` in batches of at most `batch_size` rows.
///
/// The header is written once before any row (and also for an empty source)
/// unless `columns` is empty. Only the current batch is held in memory and
/// progress advances by each batch's length after it is written. Returns the
/// number of rows written. Output does not depend on the batch size.
pub fn write_streaming<I, W>(
    columns: &[String],
    source: I,
    sink: &mut W,
    batch_size: usize,
    total_rows: Option<u64>,
    progress: &dyn Progress,
) -> Result<u64>
where
    I: IntoIterator<Item = Result<Record>>,
    W: FormatWriter + ?Sized,
{
    let batch_size = batch_size.max(1);
    progress.start(total_rows);

    if !columns.is_empty() {
        sink.write_header(columns)?;
    }

    let mut batch: Vec<Record> = Vec::with_capacity(batch_size);
    let mut written: u64 = 0;

    for row in source {
        batch.push(row?);
        if batch.len() == batch_size {
            written += flush_batch(&mut batch, sink, progress)?;
        }
    }
    if !batch.is_empty() {
        written += flush_batch(&mut batch, sink, progress)?;
    }

    sink.finish()?;
    progress.finish();
    debug!(rows = written, "streaming write complete");
    Ok(written)
}

fn flush_batch<W: FormatWriter + ?Sized>(
    batch: &mut Vec<Record>,
    sink: &mut W,
    progress: &dyn Progress,
) -> Result<u64> {
    sink.write_batch(batch)?;
    let len = batch.len() as u64;
    progress.inc(len);
    batch.clear();
    Ok(len)
}

/// Text form of a cell: empty for null, raw for strings, JSON otherwise
pub fn cell_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed(""),
        Value::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

/// Delimited-text sink
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl CsvSink<BufWriter<File>> {
    /// Create (or truncate) `path` and write to it
    pub fn create<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Self> {
        let file = File::create(path.as_ref()).map_err(TransformError::sink)?;
        Ok(Self::new(BufWriter::new(file), delimiter))
    }
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W, delimiter: u8) -> Self {
        let writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_writer(writer);
        CsvSink { writer }
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| TransformError::sink(e.into_error()))
    }
}

impl<W: Write> FormatWriter for CsvSink<W> {
    fn write_header(&mut self, columns: &[String]) -> Result<()> {
        self.writer
            .write_record(columns)
            .map_err(TransformError::sink)
    }

    fn write_batch(&mut self, rows: &[Record]) -> Result<()> {
        for row in rows {
            self.writer
                .write_record(row.iter().map(|cell| cell_text(cell).into_owned()))
                .map_err(TransformError::sink)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush().map_err(TransformError::sink)
    }
}

/// Single-sheet workbook sink.
///
/// The sheet runs in constant-memory mode: each row is flushed to a temporary
/// file as soon as a later row is written, so rows must arrive in order.
pub struct XlsxSink {
    workbook: Workbook,
    path: PathBuf,
    next_row: u32,
}

impl XlsxSink {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut workbook = Workbook::new();
        workbook.add_worksheet_with_constant_memory();
        Ok(XlsxSink {
            workbook,
            path: path.as_ref().to_path_buf(),
            next_row: 0,
        })
    }

    fn sheet(&mut self) -> Result<&mut Worksheet> {
        self.workbook
            .worksheet_from_index(0)
            .map_err(TransformError::sink)
    }
}

impl FormatWriter for XlsxSink {
    fn write_header(&mut self, columns: &[String]) -> Result<()> {
        let row = self.next_row;
        let sheet = self.sheet()?;
        for (col, name) in columns.iter().enumerate() {
            sheet
                .write_string(row, column_index(col)?, name.as_str())
                .map_err(TransformError::sink)?;
        }
        self.next_row += 1;
        Ok(())
    }

    fn write_batch(&mut self, rows: &[Record]) -> Result<()> {
        let first = self.next_row;
        let sheet = self.sheet()?;
        for (offset, record) in rows.iter().enumerate() {
            let row = first + offset as u32;
            for (col, cell) in record.iter().enumerate() {
                write_cell(sheet, row, column_index(col)?, cell).map_err(TransformError::sink)?;
            }
        }
        self.next_row += rows.len() as u32;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let path = self.path.clone();
        self.workbook.save(&path).map_err(TransformError::sink)
    }
}

fn column_index(col: usize) -> Result<u16> {
    u16::try_from(col).map_err(|_| {
        TransformError::sink(format!("column {} exceeds the worksheet width", col))
    })
}

fn write_cell(sheet: &mut Worksheet, row: u32, col: u16, cell: &Value) -> std::result::Result<(), XlsxError> {
    match cell {
        Value::Null => {}
        Value::Bool(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
        Value::Number(n) => match n.as_f64() {
            Some(f) => {
                sheet.write_number(row, col, f)?;
            }
            None => {
                sheet.write_string(row, col, n.to_string())?;
            }
        },
        Value::String(s) => {
            sheet.write_string(row, col, s.as_str())?;
        }
        other => {
            sheet.write_string(row, col, other.to_string())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::testing::CountingProgress;
    use crate::progress::NoProgress;
    use serde_json::json;

    fn columns() -> Vec<String> {
        vec!["id".to_string(), "name".to_string(), "score".to_string()]
    }

    fn rows(n: usize) -> Vec<Result<Record>> {
        (0..n)
            .map(|i| Ok(vec![json!(i), json!(format!("row {}", i)), json!(i as f64 / 4.0)]))
            .collect()
    }

    fn write_csv(n: usize, batch_size: usize) -> String {
        let mut sink = CsvSink::new(Vec::new(), b',');
        write_streaming(&columns(), rows(n), &mut sink, batch_size, None, &NoProgress).unwrap();
        String::from_utf8(sink.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_header_written_once() {
        let output = write_csv(5, 2);
        assert_eq!(output.matches("id,name,score").count(), 1);
        assert!(output.starts_with("id,name,score\n0,row 0,0.0\n"));
        assert_eq!(output.lines().count(), 6);
    }

    #[test]
    fn test_batch_size_does_not_change_output() {
        assert_eq!(write_csv(10_000, 1), write_csv(10_000, 10_000));
        assert_eq!(write_csv(10_000, 7), write_csv(10_000, 10_000));
    }

    #[test]
    fn test_empty_source_writes_header() {
        assert_eq!(write_csv(0, 10), "id,name,score\n");
    }

    #[test]
    fn test_progress_per_batch() {
        let progress = CountingProgress::default();
        let mut sink = CsvSink::new(Vec::new(), b',');
        let written =
            write_streaming(&columns(), rows(25), &mut sink, 10, Some(25), &progress).unwrap();

        assert_eq!(written, 25);
        assert_eq!(progress.total.get(), Some(25));
        assert_eq!(*progress.increments.borrow(), vec![10, 10, 5]);
        assert!(progress.finished.get());
    }

    #[test]
    fn test_zero_batch_size_is_clamped() {
        let progress = CountingProgress::default();
        let mut sink = CsvSink::new(Vec::new(), b',');
        write_streaming(&columns(), rows(3), &mut sink, 0, None, &progress).unwrap();
        assert_eq!(progress.count(), 3);
    }

    #[test]
    fn test_source_error_stops_write() {
        let source = vec![
            Ok(vec![json!(1)]),
            Err(TransformError::InvalidInput("bad row".into())),
        ];
        let mut sink = CsvSink::new(Vec::new(), b',');
        let err = write_streaming(&[], source, &mut sink, 10, None, &NoProgress).unwrap_err();
        assert!(matches!(err, TransformError::InvalidInput(_)));
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Value::Null), "");
        assert_eq!(cell_text(&json!("plain")), "plain");
        assert_eq!(cell_text(&json!(true)), "true");
        assert_eq!(cell_text(&json!(1.5)), "1.5");
        assert_eq!(cell_text(&json!([1, 2])), "[1,2]");
    }

    #[test]
    fn test_custom_delimiter_quotes_when_needed() {
        let mut sink = CsvSink::new(Vec::new(), b';');
        let source = vec![Ok(vec![json!("a;b"), json!("c")])];
        write_streaming(&["x".to_string(), "y".to_string()], source, &mut sink, 10, None, &NoProgress)
            .unwrap();
        let output = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        assert_eq!(output, "x;y\n\"a;b\";c\n");
    }

    #[test]
    fn test_xlsx_sink_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let mut sink = XlsxSink::create(&path).unwrap();
        write_streaming(&columns(), rows(3), &mut sink, 2, Some(3), &NoProgress).unwrap();
        assert!(path.metadata().unwrap().len() > 0);
    }
}
