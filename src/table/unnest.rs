//! Explode list columns and unnest struct columns until the table is flat
//!
//! Each pass either explodes one list column or unnests every struct column.
//! Unnesting can surface new list columns, so the two interleave until no
//! nested column is left. A pass always removes one container level from the
//! column schema, so the number of distinct container paths in the input,
//! counted per source column, bounds the number of passes.
//!
//! Column types come from the rows whose source record is among the first
//! `infer_schema_length` input records, however many rows exploding has
//! turned those records into.
//!
//! Exploding an empty array drops its row: the row has zero replicas. A null
//! cell in a list column is kept as a single row with a null cell.

use crate::config::TransformConfig;
use crate::error::{Result, TransformError};
use crate::table::schema::{infer_column_types, ColumnType};
use crate::table::types::{Row, Table};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Where a column of an unnested table takes its values from
enum ColumnSource {
    Plain(usize),
    Field(usize, String),
}

#[derive(Debug, Clone)]
pub struct Unnester {
    separator: String,
    infer_schema_length: usize,
}

impl Unnester {
    pub fn new(separator: impl Into<String>, infer_schema_length: usize) -> Self {
        Unnester {
            separator: separator.into(),
            infer_schema_length: infer_schema_length.max(1),
        }
    }

    pub fn from_config(config: &TransformConfig) -> Self {
        Self::new(config.separator.clone(), config.infer_schema_length)
    }

    /// Flatten a table to fixpoint
    pub fn unnest(&self, mut table: Table) -> Result<Table> {
        let max_passes = self.pass_bound(&table);
        // Source record of each row, non-decreasing since explode keeps order
        let mut origins: Vec<usize> = (0..table.len()).collect();

        for pass in 0..=max_passes {
            let window = origins.partition_point(|&origin| origin < self.infer_schema_length);
            let types = infer_column_types(&table, window)?;

            if let Some(idx) = types.iter().position(|t| *t == ColumnType::List) {
                debug!(pass, column = %table.columns()[idx], window, "exploding list column");
                let (exploded, parents) = self.explode_rows(table, idx)?;
                origins = parents.into_iter().map(|parent| origins[parent]).collect();
                table = exploded;
                continue;
            }

            let structs: Vec<usize> = types
                .iter()
                .enumerate()
                .filter(|(_, t)| **t == ColumnType::Struct)
                .map(|(idx, _)| idx)
                .collect();

            if structs.is_empty() {
                ensure_flat(&table)?;
                return Ok(table);
            }

            debug!(pass, columns = structs.len(), "unnesting struct columns");
            table = self.unnest_structs(table, &structs)?;
        }

        Err(TransformError::schema(
            "*",
            format!("no fixpoint reached after {} passes", max_passes + 1),
        ))
    }

    /// Replace each row with one replica per element of its list cell
    pub fn explode(&self, table: Table, idx: usize) -> Result<Table> {
        self.explode_rows(table, idx).map(|(exploded, _)| exploded)
    }

    /// Explode, also returning the input row index of every output row
    fn explode_rows(&self, table: Table, idx: usize) -> Result<(Table, Vec<usize>)> {
        let (columns, rows) = table.into_parts();
        let mut exploded: Vec<Row> = Vec::with_capacity(rows.len());
        let mut parents: Vec<usize> = Vec::with_capacity(rows.len());

        for (row_no, mut row) in rows.into_iter().enumerate() {
            match std::mem::take(&mut row[idx]) {
                Value::Array(items) => {
                    for item in items {
                        let mut replica = row.clone();
                        replica[idx] = item;
                        exploded.push(replica);
                        parents.push(row_no);
                    }
                }
                Value::Null => {
                    exploded.push(row);
                    parents.push(row_no);
                }
                other => {
                    return Err(TransformError::schema(
                        &columns[idx],
                        format!(
                            "row {} holds a {} in a list column",
                            row_no,
                            ColumnType::of(&other)
                        ),
                    ));
                }
            }
        }

        Ok((Table::from_parts(columns, exploded), parents))
    }

    /// Replace every listed struct column with one column per observed field.
    ///
    /// New columns are named `{column}{separator}{field}` and take the struct
    /// column's position. When a generated name equals an existing column, the
    /// later column in schema order wins and the earlier one is dropped.
    pub fn unnest_structs(&self, table: Table, structs: &[usize]) -> Result<Table> {
        let (columns, rows) = table.into_parts();
        let struct_set: HashSet<usize> = structs.iter().copied().collect();

        let mut fields: HashMap<usize, Vec<String>> = HashMap::new();
        for &idx in structs {
            let mut seen = HashSet::new();
            let mut names = Vec::new();
            for (row_no, row) in rows.iter().enumerate() {
                match &row[idx] {
                    Value::Object(obj) => {
                        for key in obj.keys() {
                            if seen.insert(key.clone()) {
                                names.push(key.clone());
                            }
                        }
                    }
                    Value::Null => {}
                    other => {
                        return Err(TransformError::schema(
                            &columns[idx],
                            format!(
                                "row {} holds a {} in a struct column",
                                row_no,
                                ColumnType::of(other)
                            ),
                        ));
                    }
                }
            }
            fields.insert(idx, names);
        }

        let mut layout: Vec<(String, ColumnSource)> = Vec::new();
        for (idx, name) in columns.iter().enumerate() {
            if struct_set.contains(&idx) {
                for field in &fields[&idx] {
                    let column = format!("{}{}{}", name, self.separator, field);
                    layout.push((column, ColumnSource::Field(idx, field.clone())));
                }
            } else {
                layout.push((name.clone(), ColumnSource::Plain(idx)));
            }
        }
        let layout = last_writer_wins(layout);

        let mut new_columns = Vec::with_capacity(layout.len());
        let mut sources = Vec::with_capacity(layout.len());
        for (name, source) in layout {
            new_columns.push(name);
            sources.push(source);
        }

        let mut new_rows = Vec::with_capacity(rows.len());
        for mut row in rows {
            let mut records: HashMap<usize, Map<String, Value>> = HashMap::new();
            for &idx in structs {
                if let Value::Object(obj) = std::mem::take(&mut row[idx]) {
                    records.insert(idx, obj);
                }
            }

            let new_row: Row = sources
                .iter()
                .map(|source| match source {
                    ColumnSource::Plain(idx) => std::mem::take(&mut row[*idx]),
                    ColumnSource::Field(idx, field) => records
                        .get_mut(idx)
                        .and_then(|obj| obj.remove(field))
                        .unwrap_or(Value::Null),
                })
                .collect();
            new_rows.push(new_row);
        }

        Ok(Table::from_parts(new_columns, new_rows))
    }

    /// Count distinct container paths, per source column.
    ///
    /// Paths of different columns are never merged, even when a plain column
    /// is named like a field path of a struct column.
    fn pass_bound(&self, table: &Table) -> usize {
        let mut total = 0;
        for (idx, name) in table.columns().iter().enumerate() {
            let mut paths = HashSet::new();
            for cell in table.column_values(idx) {
                self.collect_container_paths(cell, name.clone(), &mut paths);
            }
            total += paths.len();
        }
        total
    }

    fn collect_container_paths(&self, value: &Value, path: String, paths: &mut HashSet<String>) {
        match value {
            Value::Array(items) => {
                let element_path = format!("{}[]", path);
                paths.insert(path);
                for item in items {
                    self.collect_container_paths(item, element_path.clone(), paths);
                }
            }
            Value::Object(obj) => {
                for (key, child) in obj.iter() {
                    let child_path = format!("{}{}{}", path, self.separator, key);
                    self.collect_container_paths(child, child_path, paths);
                }
                paths.insert(format!("{}{{}}", path));
            }
            _ => {}
        }
    }
}

impl Default for Unnester {
    fn default() -> Self {
        Self::from_config(&TransformConfig::default())
    }
}

/// Unnest a table with the default separator and inference window
pub fn unnest(table: Table) -> Result<Table> {
    Unnester::default().unnest(table)
}

/// Keep only the last column of each name, at the position it was generated
fn last_writer_wins(layout: Vec<(String, ColumnSource)>) -> Vec<(String, ColumnSource)> {
    let mut last: HashMap<&str, usize> = HashMap::new();
    for (pos, (name, _)) in layout.iter().enumerate() {
        last.insert(name.as_str(), pos);
    }
    let keep: HashSet<usize> = last.into_values().collect();

    layout
        .into_iter()
        .enumerate()
        .filter(|(pos, _)| keep.contains(pos))
        .map(|(_, entry)| entry)
        .collect()
}

/// Reject containers left behind in rows outside the inference window
fn ensure_flat(table: &Table) -> Result<()> {
    for (row_no, row) in table.rows().iter().enumerate() {
        for (name, cell) in table.columns().iter().zip(row.iter()) {
            if cell.is_array() || cell.is_object() {
                return Err(TransformError::schema(
                    name,
                    format!(
                        "row {} holds a {} but the column was inferred as scalar",
                        row_no,
                        ColumnType::of(cell)
                    ),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(records: Vec<Value>) -> Table {
        Table::from_records(records).unwrap()
    }

    fn dotted() -> Unnester {
        Unnester::new(".", 100)
    }

    #[test]
    fn test_explode_list_column() {
        let out = dotted().unnest(table(vec![json!({"tags": ["x", "y"], "name": "n"})])).unwrap();

        assert_eq!(out.columns(), &["tags", "name"]);
        assert_eq!(out.rows(), &[vec![json!("x"), json!("n")], vec![json!("y"), json!("n")]]);
    }

    #[test]
    fn test_empty_array_drops_row() {
        let out = dotted()
            .unnest(table(vec![
                json!({"id": 1, "tags": []}),
                json!({"id": 2, "tags": ["a"]}),
            ]))
            .unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out.rows()[0], vec![json!(2), json!("a")]);
    }

    #[test]
    fn test_null_list_cell_keeps_row() {
        let out = dotted()
            .unnest(table(vec![json!({"id": 1, "tags": null}), json!({"id": 2, "tags": ["a", "b"]})]))
            .unwrap();

        assert_eq!(out.len(), 3);
        assert_eq!(out.rows()[0], vec![json!(1), Value::Null]);
    }

    #[test]
    fn test_two_list_columns_cross() {
        let out = dotted().unnest(table(vec![json!({"a": [1, 2], "b": ["x", "y"]})])).unwrap();
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_unnest_struct_column() {
        let out = dotted()
            .unnest(table(vec![
                json!({"id": 1, "user": {"name": "Alice", "age": 30}}),
                json!({"id": 2, "user": {"name": "Bob", "email": "bob@example.com"}}),
            ]))
            .unwrap();

        assert_eq!(out.columns(), &["id", "user.name", "user.age", "user.email"]);
        assert_eq!(out.rows()[0], vec![json!(1), json!("Alice"), json!(30), Value::Null]);
        assert_eq!(out.rows()[1], vec![json!(2), json!("Bob"), Value::Null, json!("bob@example.com")]);
    }

    #[test]
    fn test_underscore_separator() {
        let out = Unnester::new("_", 100)
            .unnest(table(vec![json!({"user": {"name": "Alice"}})]))
            .unwrap();
        assert_eq!(out.columns(), &["user_name"]);
    }

    #[test]
    fn test_struct_exposing_list_is_exploded() {
        let out = dotted()
            .unnest(table(vec![json!({"id": 1, "meta": {"tags": ["a", "b"], "owner": {"name": "z"}}})]))
            .unwrap();

        assert_eq!(out.columns(), &["id", "meta.tags", "meta.owner.name"]);
        assert_eq!(out.len(), 2);
        assert_eq!(out.rows()[1], vec![json!(1), json!("b"), json!("z")]);
    }

    #[test]
    fn test_list_of_records() {
        let out = dotted()
            .unnest(table(vec![json!({"id": 1, "posts": [{"title": "a"}, {"title": "b"}]})]))
            .unwrap();

        assert_eq!(out.columns(), &["id", "posts.title"]);
        assert_eq!(out.rows(), &[vec![json!(1), json!("a")], vec![json!(1), json!("b")]]);
    }

    #[test]
    fn test_name_collision_last_writer_wins() {
        let out = dotted()
            .unnest(table(vec![json!({"a.b": "old", "a": {"b": "new"}})]))
            .unwrap();

        assert_eq!(out.columns(), &["a.b"]);
        assert_eq!(out.rows()[0], vec![json!("new")]);
    }

    #[test]
    fn test_flat_table_is_unchanged() {
        let input = table(vec![
            json!({"id": 1, "name": "Alice", "score": 2.5, "active": true}),
            json!({"id": 2, "name": null, "score": 3, "active": false}),
        ]);
        let out = dotted().unnest(input.clone()).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn test_unnest_is_idempotent() {
        let once = dotted()
            .unnest(table(vec![json!({"a": [{"b": [1, 2]}], "c": {"d": 1}})]))
            .unwrap();
        let twice = dotted().unnest(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_row_count_matches_array_lengths() {
        let input = table(vec![
            json!({"id": 1, "v": [1, 2, 3]}),
            json!({"id": 2, "v": [4]}),
            json!({"id": 3, "v": []}),
        ]);
        let out = dotted().unnest(input).unwrap();
        assert_eq!(out.len(), 4);
        assert_eq!(out.scalar_cell_count(), 8);
    }

    #[test]
    fn test_incompatible_column_fails() {
        let err = dotted()
            .unnest(table(vec![json!({"a": 1}), json!({"a": {"b": 2}})]))
            .unwrap_err();
        assert!(matches!(err, TransformError::SchemaInference { .. }));
    }

    #[test]
    fn test_nested_value_outside_window_fails() {
        let err = Unnester::new(".", 1)
            .unnest(table(vec![json!({"a": 1}), json!({"a": [2]})]))
            .unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn test_window_counts_source_records_not_exploded_rows() {
        // Both records sit in a two-record window even though the first
        // explodes into three rows ahead of the second
        let out = Unnester::new(".", 2)
            .unnest(table(vec![
                json!({"t": [1, 2, 3], "u": null}),
                json!({"t": [4], "u": {"k": 1}}),
            ]))
            .unwrap();

        assert_eq!(out.columns(), &["t", "u.k"]);
        assert_eq!(out.len(), 4);
        assert_eq!(out.rows()[3], vec![json!(4), json!(1)]);
    }

    #[test]
    fn test_window_still_excludes_later_records() {
        let err = Unnester::new(".", 1)
            .unnest(table(vec![
                json!({"t": [1, 2], "u": null}),
                json!({"t": [3], "u": {"k": 1}}),
            ]))
            .unwrap_err();
        assert!(matches!(err, TransformError::SchemaInference { .. }));
    }

    #[test]
    fn test_colliding_column_keeps_enough_passes() {
        let input = table(vec![json!({"a.b": [[2]], "a": {"b": [[1]]}})]);
        // a.b, a.b[] from the plain column; a{}, a.b, a.b[] from the struct
        assert_eq!(dotted().pass_bound(&input), 5);

        let out = dotted().unnest(input).unwrap();
        assert_eq!(out.columns(), &["a.b"]);
        assert_eq!(out.rows(), &[vec![json!(1)]]);
    }

    #[test]
    fn test_pass_bound_counts_container_paths() {
        let input = table(vec![json!({"a": [{"b": [1]}], "c": {"d": 1}})]);
        // a (list), a[] (struct), a[].b (list), c (struct)
        assert_eq!(dotted().pass_bound(&input), 4);
    }
}
