//! Streaming I/O - lazy row sources, batch writers and row-count estimates
//!
//! Rows flow from a source iterator into a [`FormatWriter`] in fixed-size
//! batches, so memory use depends on the batch size rather than the file size.

pub mod count;
pub mod reader;
pub mod writer;

pub use count::{estimate_row_count, Format};
pub use reader::{sheet_cell, typed_cell, CsvRows, SheetCell, SheetRows};
pub use writer::{cell_text, write_streaming, CsvSink, FormatWriter, Record, XlsxSink};
