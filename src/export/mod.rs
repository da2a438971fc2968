//! JSON export - project relational tables into one JSON document
//!
//! The pipeline per field is: normalize the column name, look the
//! `(table, column)` pair up in the override registry, coerce the value
//! unless exempt, and hand it to the emitter.

pub mod coerce;
pub mod emitter;
pub mod normalize;
pub mod overrides;
pub mod projector;

pub use coerce::{coerce, parse_numeric_literal};
pub use emitter::{to_json, DocumentEmitter};
pub use normalize::normalize;
pub use overrides::OverrideRegistry;
pub use projector::{export_json, export_json_to_path, ColumnPlan, Projector, TablePlan};
