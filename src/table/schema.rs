//! Column type inference
//!
//! Counts the type of every sampled cell in a column and resolves the counts
//! to one declared type, the way a streaming schema builder accumulates
//! statistics before building.

use crate::error::{Result, TransformError};
use crate::table::types::Table;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Declared type of a table column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Null,
    Boolean,
    Integer,
    Float,
    String,
    List,
    Struct,
}

impl ColumnType {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ColumnType::Null,
            Value::Bool(_) => ColumnType::Boolean,
            Value::Number(n) => {
                if n.is_f64() {
                    ColumnType::Float
                } else {
                    ColumnType::Integer
                }
            }
            Value::String(_) => ColumnType::String,
            Value::Array(_) => ColumnType::List,
            Value::Object(_) => ColumnType::Struct,
        }
    }

    pub fn is_nested(self) -> bool {
        matches!(self, ColumnType::List | ColumnType::Struct)
    }

    fn as_str(self) -> &'static str {
        match self {
            ColumnType::Null => "null",
            ColumnType::Boolean => "boolean",
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::String => "string",
            ColumnType::List => "list",
            ColumnType::Struct => "struct",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accumulates type counts for one column
#[derive(Debug, Default)]
pub struct ColumnTypeBuilder {
    type_counts: HashMap<ColumnType, usize>,
}

impl ColumnTypeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_value(&mut self, value: &Value) {
        let column_type = ColumnType::of(value);
        if column_type != ColumnType::Null {
            *self.type_counts.entry(column_type).or_insert(0) += 1;
        }
    }

    /// Resolve the accumulated counts to one type.
    ///
    /// Nulls fit any type. Integers widen to floats, other mixed scalars fall
    /// back to strings, and a list or struct mixed with anything else is an
    /// error.
    pub fn build(self, column: &str) -> Result<ColumnType> {
        let mut seen: Vec<ColumnType> = self.type_counts.into_keys().collect();
        seen.sort_by_key(|t| t.as_str());

        match seen.as_slice() {
            [] => Ok(ColumnType::Null),
            [single] => Ok(*single),
            _ if seen.iter().any(|t| t.is_nested()) => {
                let names: Vec<&str> = seen.iter().map(|t| t.as_str()).collect();
                Err(TransformError::schema(
                    column,
                    format!("values mix incompatible types: {}", names.join(", ")),
                ))
            }
            _ if seen
                .iter()
                .all(|t| matches!(t, ColumnType::Integer | ColumnType::Float)) =>
            {
                Ok(ColumnType::Float)
            }
            _ => Ok(ColumnType::String),
        }
    }
}

/// Infer one type per column from the first `limit` rows
pub fn infer_column_types(table: &Table, limit: usize) -> Result<Vec<ColumnType>> {
    table
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let mut builder = ColumnTypeBuilder::new();
            for value in table.column_values(idx).take(limit) {
                builder.add_value(value);
            }
            builder.build(name)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn infer(values: Vec<Value>) -> Result<ColumnType> {
        let mut builder = ColumnTypeBuilder::new();
        for v in &values {
            builder.add_value(v);
        }
        builder.build("col")
    }

    #[test]
    fn test_single_type() {
        assert_eq!(infer(vec![json!(1), json!(2)]).unwrap(), ColumnType::Integer);
        assert_eq!(infer(vec![json!("a")]).unwrap(), ColumnType::String);
        assert_eq!(infer(vec![json!([1])]).unwrap(), ColumnType::List);
        assert_eq!(infer(vec![json!({"a": 1})]).unwrap(), ColumnType::Struct);
    }

    #[test]
    fn test_nulls_fit_anything() {
        assert_eq!(infer(vec![]).unwrap(), ColumnType::Null);
        assert_eq!(infer(vec![json!(null), json!(null)]).unwrap(), ColumnType::Null);
        assert_eq!(infer(vec![json!(null), json!([1])]).unwrap(), ColumnType::List);
    }

    #[test]
    fn test_numeric_widening() {
        assert_eq!(infer(vec![json!(1), json!(2.5)]).unwrap(), ColumnType::Float);
    }

    #[test]
    fn test_mixed_scalars_become_strings() {
        assert_eq!(infer(vec![json!(1), json!("x"), json!(true)]).unwrap(), ColumnType::String);
    }

    #[test]
    fn test_scalar_and_record_conflict() {
        let err = infer(vec![json!(1), json!({"a": 1})]).unwrap_err();
        assert!(matches!(err, TransformError::SchemaInference { .. }));
        assert!(err.to_string().contains("integer, struct"));
    }

    #[test]
    fn test_list_and_record_conflict() {
        assert!(infer(vec![json!([1]), json!({"a": 1})]).is_err());
    }

    #[test]
    fn test_inference_window() {
        let table = Table::from_records(vec![
            json!({"a": 1}),
            json!({"a": 2}),
            json!({"a": {"nested": true}}),
        ])
        .unwrap();

        assert_eq!(infer_column_types(&table, 2).unwrap(), vec![ColumnType::Integer]);
        assert!(infer_column_types(&table, 3).is_err());
    }
}
