//! # tabjson - relational tables to JSON
//!
//! Streams the tables of a relational source into a single JSON document,
//! optionally rewriting names into identifier-safe keys and turning
//! number-looking strings into JSON numbers.
//!
//! ## Modules
//!
//! - **export**: name normalization, number coercion, override registry,
//!   table projection and the incremental document emitter
//! - **source**: the `TableSource` seam plus SQLite and in-memory sources
//! - **info**: table/column listings
//!
//! ## Quick Start
//!
//! ```rust
//! use tabjson::{export_json, ExportOptions, MemorySource, OverrideRegistry};
//! use tabjson::types::{ColumnDescriptor, Field, NativeType, Row, TableDescriptor};
//!
//! # fn main() -> anyhow::Result<()> {
//! let table = TableDescriptor::new("Ädress")
//!     .with_column(ColumnDescriptor::new("Städer", NativeType::Text))
//!     .with_column(ColumnDescriptor::new("Note", NativeType::Text));
//! let rows = vec![Row::new(vec![
//!     Field::new("Städer", "42", NativeType::Text),
//!     Field::new("Note", "hej", NativeType::Text),
//! ])];
//! let source = MemorySource::new().with_table(table, rows);
//!
//! let options = ExportOptions::default()
//!     .with_normalized_names(true)
//!     .with_number_coercion(true)
//!     .with_overrides(OverrideRegistry::parse("Adress.Note")?);
//!
//! let out = export_json(&source, &options, Vec::new())?;
//! assert_eq!(String::from_utf8(out)?, "{\"Adress\":[{\"Stader\":42,\"Note\":\"hej\"}]}\n");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod export;
pub mod info;
pub mod logging;
pub mod source;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{Error, Result, SourceError};
pub use export::{coerce, export_json, export_json_to_path, normalize, DocumentEmitter, OverrideRegistry, Projector};
pub use source::{MemorySource, SqliteSource, TableSource};
pub use types::{ExportOptions, FieldValue};
