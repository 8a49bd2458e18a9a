use crate::error::{Result, TransformError};
use serde_json::{Map, Value};

/// A flattened document: key-path to scalar leaf, in traversal order
pub type FlatRecord = Map<String, Value>;

/// Depth-first flattener joining path segments with a separator
#[derive(Debug, Clone)]
pub struct KeyPathFlattener {
    separator: String,
}

impl KeyPathFlattener {
    pub fn new(separator: impl Into<String>) -> Self {
        KeyPathFlattener {
            separator: separator.into(),
        }
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Flatten one document into a record.
    ///
    /// A scalar root has no key path and therefore yields an empty record.
    /// Empty maps and arrays contain no leaves and leave no trace either.
    pub fn flatten(&self, doc: Value) -> FlatRecord {
        let mut record = FlatRecord::new();
        self.flatten_into(doc, String::new(), &mut record);
        record
    }

    /// Flatten every document of a batch, preserving order.
    ///
    /// See [`into_batch`](Self::into_batch) for what counts as a batch.
    pub fn flatten_many(&self, docs: Value) -> Result<Vec<FlatRecord>> {
        Ok(Self::into_batch(docs)?
            .into_iter()
            .map(|doc| self.flatten(doc))
            .collect())
    }

    /// Split a top-level value into the documents to flatten.
    ///
    /// An array is a batch of its elements; a single map is a batch of one.
    pub fn into_batch(docs: Value) -> Result<Vec<Value>> {
        match docs {
            Value::Array(items) => Ok(items),
            Value::Object(_) => Ok(vec![docs]),
            other => Err(TransformError::InvalidInput(format!(
                "expected a JSON object or an array of objects, found {}",
                kind_of(&other)
            ))),
        }
    }

    /// Recursively move the leaves of `value` into `record`
    fn flatten_into(&self, value: Value, parent: String, record: &mut FlatRecord) {
        match value {
            Value::Object(obj) => {
                for (key, child) in obj.into_iter() {
                    let path = self.join(&parent, &key);
                    self.flatten_into(child, path, record);
                }
            }
            Value::Array(arr) => {
                for (idx, child) in arr.into_iter().enumerate() {
                    let path = self.join(&parent, &idx.to_string());
                    self.flatten_into(child, path, record);
                }
            }
            leaf => {
                if !parent.is_empty() {
                    record.insert(parent, leaf);
                }
            }
        }
    }

    fn join(&self, parent: &str, segment: &str) -> String {
        if parent.is_empty() {
            segment.to_string()
        } else {
            format!("{}{}{}", parent, self.separator, segment)
        }
    }
}

impl Default for KeyPathFlattener {
    fn default() -> Self {
        KeyPathFlattener::new(".")
    }
}

/// Flatten a single document with the given separator
pub fn flatten(doc: Value, separator: &str) -> FlatRecord {
    KeyPathFlattener::new(separator).flatten(doc)
}

/// Flatten a document batch with the given separator
pub fn flatten_many(docs: Value, separator: &str) -> Result<Vec<FlatRecord>> {
    KeyPathFlattener::new(separator).flatten_many(docs)
}

/// Rebuild a nested document from a flat record.
///
/// Segments that parse as an index become array positions, everything else a
/// map key, so keys that are themselves numeric or contain the separator do
/// not survive the trip.
pub fn unflatten(record: &FlatRecord, separator: &str) -> Value {
    let mut root = Value::Null;
    for (path, leaf) in record.iter() {
        let segments: Vec<&str> = path.split(separator).collect();
        insert_path(&mut root, &segments, leaf.clone());
    }
    root
}

fn insert_path(node: &mut Value, segments: &[&str], leaf: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *node = leaf;
        return;
    };

    let child = match head.parse::<usize>() {
        Ok(idx) => {
            if !node.is_array() {
                *node = Value::Array(Vec::new());
            }
            let Value::Array(items) = node else { return };
            if items.len() <= idx {
                items.resize(idx + 1, Value::Null);
            }
            &mut items[idx]
        }
        Err(_) => {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            let Value::Object(obj) = node else { return };
            obj.entry(head.to_string()).or_insert(Value::Null)
        }
    };

    insert_path(child, rest, leaf);
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
