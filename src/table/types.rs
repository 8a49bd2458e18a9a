use crate::error::{Result, TransformError};
use crate::flatten::flattener::kind_of;
use serde_json::Value;
use std::collections::HashMap;

/// One table row, aligned with [`Table::columns`]
pub type Row = Vec<Value>;

/// Row-oriented table whose cells may still hold arrays or records
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Table {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from parts, padding or truncating rows to the column count
    pub fn from_parts(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let mut table = Table::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    /// Build a table from JSON objects.
    ///
    /// Columns are the union of keys in first-seen order; a key missing from
    /// a record becomes a null cell.
    pub fn from_records(records: Vec<Value>) -> Result<Self> {
        let mut columns: Vec<String> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for (idx, record) in records.iter().enumerate() {
            let Value::Object(obj) = record else {
                return Err(TransformError::InvalidInput(format!(
                    "record {} is {}, expected an object",
                    idx,
                    kind_of(record)
                )));
            };
            for key in obj.keys() {
                if !positions.contains_key(key) {
                    positions.insert(key.clone(), columns.len());
                    columns.push(key.clone());
                }
            }
        }

        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            let mut row = vec![Value::Null; columns.len()];
            if let Value::Object(obj) = record {
                for (key, value) in obj.into_iter() {
                    row[positions[&key]] = value;
                }
            }
            rows.push(row);
        }

        Ok(Table { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Iterate over the cells of one column
    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |row| &row[idx])
    }

    pub fn push_row(&mut self, mut row: Row) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Row>) {
        (self.columns, self.rows)
    }

    /// Number of cells that hold a scalar (including null)
    pub fn scalar_cell_count(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|row| row.iter())
            .filter(|cell| !cell.is_array() && !cell.is_object())
            .count()
    }
}
