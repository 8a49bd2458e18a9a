//! Tabular unnesting - flatten tables whose cells hold arrays or records
//!
//! JSON records become a [`Table`] with one column per key. List columns are
//! exploded into extra rows and struct columns unnested into extra columns
//! until every cell is a scalar:
//!
//! ```rust
//! use niv::table::{unnest, Table};
//! use serde_json::json;
//!
//! # fn main() -> niv::Result<()> {
//! let table = Table::from_records(vec![json!({"tags": ["x", "y"], "name": "n"})])?;
//! let flat = unnest(table)?;
//!
//! assert_eq!(flat.len(), 2);
//! assert_eq!(flat.rows()[0], vec![json!("x"), json!("n")]);
//! # Ok(())
//! # }
//! ```

pub mod schema;
pub mod types;
pub mod unnest;

pub use schema::{infer_column_types, ColumnType, ColumnTypeBuilder};
pub use types::{Row, Table};
pub use unnest::{unnest, Unnester};
