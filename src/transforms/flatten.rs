use crate::config::TransformConfig;
use crate::document::load_document;
use crate::error::{Result, TransformError};
use crate::flatten::KeyPathFlattener;
use crate::progress::progress_for;
use crate::transforms::TransformReport;
use serde::ser::{SerializeSeq, Serializer};
use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Flatten a JSON object or array of objects into a JSON array of flat records.
///
/// The whole input is loaded as one document; records are serialized one at
/// a time as they are flattened.
pub fn transform(input: &Path, output: &Path, config: &TransformConfig) -> Result<TransformReport> {
    let doc = load_document(input)?;
    if doc.is_object() {
        info!("input is a single JSON object; flattening");
    }
    let docs = KeyPathFlattener::into_batch(doc)?;
    let flattener = KeyPathFlattener::new(config.separator.clone());

    let file = File::create(output).map_err(TransformError::sink)?;
    let mut writer = BufWriter::new(file);
    let records = write_flattened(&flattener, docs, &mut writer, config)?;
    writer.flush().map_err(TransformError::sink)?;

    Ok(TransformReport { records })
}

fn write_flattened<W: Write>(
    flattener: &KeyPathFlattener,
    docs: Vec<Value>,
    writer: W,
    config: &TransformConfig,
) -> Result<u64> {
    let progress = progress_for(config, "Flattening JSON");
    progress.start(Some(docs.len() as u64));

    let mut serializer = serde_json::Serializer::new(writer);
    let mut seq = serializer
        .serialize_seq(Some(docs.len()))
        .map_err(TransformError::sink)?;

    let mut written = 0u64;
    for (idx, doc) in docs.into_iter().enumerate() {
        if !doc.is_object() && !doc.is_array() {
            debug!(index = idx, "scalar document has no key paths, writing an empty record");
        }
        let record = flattener.flatten(doc);
        seq.serialize_element(&record).map_err(TransformError::sink)?;
        progress.inc(1);
        written += 1;
    }

    seq.end().map_err(TransformError::sink)?;
    progress.finish();
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn quiet() -> TransformConfig {
        TransformConfig {
            show_progress: false,
            ..TransformConfig::default()
        }
    }

    fn run(input: &str, config: &TransformConfig) -> Result<(TransformReport, Value)> {
        let dir = tempfile::tempdir().unwrap();
        let in_path = dir.path().join("in.json");
        let out_path = dir.path().join("out.json");
        std::fs::write(&in_path, input).unwrap();

        let report = transform(&in_path, &out_path, config)?;
        let output = std::fs::read_to_string(&out_path).unwrap();
        Ok((report, serde_json::from_str(&output).unwrap()))
    }

    #[test]
    fn test_array_input() {
        let (report, output) = run(r#"[{"a": {"b": 1}}, {"a": {"b": 2}, "c": [true]}]"#, &quiet()).unwrap();
        assert_eq!(report.records, 2);
        assert_eq!(output, json!([{"a.b": 1}, {"a.b": 2, "c.0": true}]));
    }

    #[test]
    fn test_single_object_uses_configured_separator() {
        let config = TransformConfig {
            separator: "_".to_string(),
            ..quiet()
        };
        let (report, output) = run(r#"{"a": {"b": 1}}"#, &config).unwrap();
        assert_eq!(report.records, 1);
        assert_eq!(output, json!([{"a_b": 1}]));
    }

    #[test]
    fn test_scalar_elements_become_empty_records() {
        let (_, output) = run(r#"[1, {"a": 2}]"#, &quiet()).unwrap();
        assert_eq!(output, json!([{}, {"a": 2}]));
    }

    #[test]
    fn test_scalar_input_is_rejected() {
        let err = run("42", &quiet()).unwrap_err();
        assert!(matches!(err, TransformError::InvalidInput(_)));
    }

    #[test]
    fn test_malformed_input_is_invalid() {
        let err = run(r#"[{"a": 1},"#, &quiet()).unwrap_err();
        assert!(matches!(err, TransformError::InvalidInput(_)));
    }

    #[test]
    fn test_output_is_compact_and_ordered() {
        let dir = tempfile::tempdir().unwrap();
        let in_path = dir.path().join("in.json");
        let out_path = dir.path().join("out.json");
        std::fs::write(&in_path, r#"[{"z": 1, "a": [1, 2]}]"#).unwrap();

        transform(&in_path, &out_path, &quiet()).unwrap();
        assert_eq!(std::fs::read_to_string(&out_path).unwrap(), r#"[{"z":1,"a.0":1,"a.1":2}]"#);
    }
}
