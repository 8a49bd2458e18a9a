use crate::config::TransformConfig;
use crate::document::{parse_values, read_bytes};
use crate::error::Result;
use crate::progress::progress_for;
use crate::stream::{write_streaming, CsvSink};
use crate::table::{Table, Unnester};
use crate::transforms::TransformReport;
use serde_json::Value;
use std::path::Path;
use tracing::info;

/// Convert JSON or JSON Lines to CSV, exploding lists and unnesting records.
///
/// A top-level array yields one row per element, a single object one row,
/// and a stream of values one row per value.
pub fn transform(input: &Path, output: &Path, config: &TransformConfig) -> Result<TransformReport> {
    let bytes = read_bytes(input)?;
    let records = into_records(parse_values(input, &bytes)?);
    drop(bytes);

    let table = Table::from_records(records)?;
    let source_rows = table.len();
    let table = Unnester::from_config(config).unnest(table)?;
    info!(
        source_rows,
        rows = table.len(),
        columns = table.columns().len(),
        "unnested JSON records"
    );

    let (columns, rows) = table.into_parts();
    let total = rows.len() as u64;
    let mut sink = CsvSink::create(output, config.delimiter_or(b','))?;
    let progress = progress_for(config, "Writing CSV");
    let records = write_streaming(
        &columns,
        rows.into_iter().map(Ok),
        &mut sink,
        config.batch_size,
        Some(total),
        progress.as_ref(),
    )?;

    Ok(TransformReport { records })
}

fn into_records(mut values: Vec<Value>) -> Vec<Value> {
    if values.len() == 1 {
        match values.pop() {
            Some(Value::Array(items)) => return items,
            Some(single) => return vec![single],
            None => {}
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransformError;
    use serde_json::json;

    fn quiet() -> TransformConfig {
        TransformConfig {
            show_progress: false,
            ..TransformConfig::default()
        }
    }

    fn run(input: &str, config: &TransformConfig) -> Result<String> {
        let dir = tempfile::tempdir().unwrap();
        let in_path = dir.path().join("in.json");
        let out_path = dir.path().join("out.csv");
        std::fs::write(&in_path, input).unwrap();

        transform(&in_path, &out_path, config)?;
        Ok(std::fs::read_to_string(&out_path).unwrap())
    }

    #[test]
    fn test_into_records() {
        assert_eq!(into_records(vec![json!([{"a": 1}, {"a": 2}])]).len(), 2);
        assert_eq!(into_records(vec![json!({"a": 1})]), vec![json!({"a": 1})]);
        assert_eq!(into_records(vec![json!({"a": 1}), json!({"a": 2})]).len(), 2);
        assert!(into_records(vec![]).is_empty());
    }

    #[test]
    fn test_nested_array_input() {
        let csv = run(
            r#"[
                {"id": 1, "user": {"name": "Alice"}, "tags": ["x", "y"]},
                {"id": 2, "user": {"name": "Bob"}, "tags": []}
            ]"#,
            &quiet(),
        )
        .unwrap();

        assert_eq!(csv, "id,user.name,tags\n1,Alice,x\n1,Alice,y\n");
    }

    #[test]
    fn test_json_lines_input() {
        let csv = run("{\"a\": 1, \"b\": null}\n{\"a\": 2.5, \"b\": \"t\"}\n", &quiet()).unwrap();
        assert_eq!(csv, "a,b\n1,\n2.5,t\n");
    }

    #[test]
    fn test_single_object_input() {
        let csv = run(r#"{"a": {"b": [1, 2]}}"#, &quiet()).unwrap();
        assert_eq!(csv, "a.b\n1\n2\n");
    }

    #[test]
    fn test_delimiter_override() {
        let config = TransformConfig {
            delimiter: Some(b';'),
            ..quiet()
        };
        let csv = run(r#"[{"a": 1, "b": 2}]"#, &config).unwrap();
        assert_eq!(csv, "a;b\n1;2\n");
    }

    #[test]
    fn test_non_object_rows_rejected() {
        let err = run("[1, 2]", &quiet()).unwrap_err();
        assert!(matches!(err, TransformError::InvalidInput(_)));
    }

    #[test]
    fn test_incompatible_types_rejected() {
        let err = run(r#"[{"a": 1}, {"a": {"b": 1}}]"#, &quiet()).unwrap_err();
        assert!(matches!(err, TransformError::SchemaInference { .. }));
    }

    #[test]
    fn test_malformed_input() {
        let err = run("{\"a\": ", &quiet()).unwrap_err();
        assert!(matches!(err, TransformError::InvalidInput(_)));
    }
}
