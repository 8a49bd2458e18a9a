//! The transform registry
//!
//! Every transform is a plain function from an input path and an output path
//! to a report. The registry is a fixed table, so a transform that fails to
//! build fails the whole crate instead of silently disappearing.

use crate::config::TransformConfig;
use crate::error::Result;
use std::path::Path;

pub mod aggregate;
pub mod csv2xlsx;
pub mod flatten;
pub mod json2csv;
pub mod xlsx2csv;

/// What a transform did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformReport {
    /// Records or rows written to the output
    pub records: u64,
}

pub type TransformFn = fn(&Path, &Path, &TransformConfig) -> Result<TransformReport>;

/// A registered transform
#[derive(Clone, Copy)]
pub struct TransformSpec {
    /// Registry name
    pub name: &'static str,

    /// One-line help text
    pub summary: &'static str,

    /// Entry point: input path, output path, settings
    pub run: TransformFn,
}

impl TransformSpec {
    /// Name used on the command line (`_` becomes `-`)
    pub fn command_name(&self) -> String {
        self.name.replace('_', "-")
    }
}

pub static TRANSFORMS: &[TransformSpec] = &[
    TransformSpec {
        name: "aggregate",
        summary: "Aggregates all JSON files in a directory into a single JSON file.",
        run: aggregate::transform,
    },
    TransformSpec {
        name: "csv2excel",
        summary: "Converts a semicolon-delimited CSV file to an XLSX (Excel) file.",
        run: csv2xlsx::transform_semicolon,
    },
    TransformSpec {
        name: "csv2xlsx",
        summary: "Converts a CSV file to an XLSX (Excel) file.",
        run: csv2xlsx::transform,
    },
    TransformSpec {
        name: "flatten",
        summary: "Flattens a JSON file (list of objects or a single object) into a JSON array.",
        run: flatten::transform,
    },
    TransformSpec {
        name: "json2csv",
        summary: "Converts a JSON or JSON Lines file to a CSV file, flattening nested objects and lists.",
        run: json2csv::transform,
    },
    TransformSpec {
        name: "xlsx2csv",
        summary: "Converts the first sheet of an XLSX file to a CSV file.",
        run: xlsx2csv::transform,
    },
];

/// Find a transform by registry or command-line name
pub fn lookup(name: &str) -> Option<&'static TransformSpec> {
    let wanted = name.replace('-', "_");
    TRANSFORMS.iter().find(|spec| spec.name == wanted)
}
