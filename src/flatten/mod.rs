//! Key-path flattening - turn nested JSON into flat `path -> scalar` records
//!
//! Every scalar leaf of a document is kept, keyed by the joined path of map
//! keys and array indices leading to it:
//!
//! ```rust
//! use niv::flatten::KeyPathFlattener;
//! use serde_json::json;
//!
//! let flattener = KeyPathFlattener::new(".");
//! let record = flattener.flatten(json!({"a": {"b": 1, "c": [2, 3]}}));
//!
//! assert_eq!(record["a.b"], 1);
//! assert_eq!(record["a.c.0"], 2);
//! assert_eq!(record["a.c.1"], 3);
//! ```

pub mod flattener;

pub use flattener::{flatten, flatten_many, unflatten, FlatRecord, KeyPathFlattener};
