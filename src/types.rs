use crate::export::OverrideRegistry;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column type tag as declared by the data source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NativeType {
    Integer,
    Float,
    Numeric,
    Text,
    Boolean,
    DateTime,
    Binary,
    Guid,
    /// Anything the source declares that has no closer match
    Other(String),
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeType::Integer => f.write_str("integer"),
            NativeType::Float => f.write_str("float"),
            NativeType::Numeric => f.write_str("numeric"),
            NativeType::Text => f.write_str("text"),
            NativeType::Boolean => f.write_str("boolean"),
            NativeType::DateTime => f.write_str("datetime"),
            NativeType::Binary => f.write_str("binary"),
            NativeType::Guid => f.write_str("guid"),
            NativeType::Other(name) => write!(f, "other({})", name),
        }
    }
}

/// One column of a table, in source order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub description: Option<String>,
    pub native_type: NativeType,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, native_type: NativeType) -> Self {
        ColumnDescriptor {
            name: name.into(),
            description: None,
            native_type,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Metadata snapshot of one source table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Display name as the source reports it, e.g. "Ädress"
    pub name: String,
    pub description: Option<String>,
    pub columns: Vec<ColumnDescriptor>,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        TableDescriptor {
            name: name.into(),
            description: None,
            columns: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }
}

/// A raw scalar read from the source.
///
/// The set of kinds is closed: every value a source hands over must be one
/// of these, and the emitter knows how to write each of them.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    DateTime(NaiveDateTime),
    Binary(Vec<u8>),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// One cell of a row
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
    pub declared_type: NativeType,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<FieldValue>, declared_type: NativeType) -> Self {
        Field {
            name: name.into(),
            value: value.into(),
            declared_type,
        }
    }
}

/// A row fetched from a cursor; fields follow the table's column order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub fields: Vec<Field>,
}

impl Row {
    pub fn new(fields: Vec<Field>) -> Self {
        Row { fields }
    }
}

/// Configuration for a JSON export run
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Tables to export, by display name. Empty means every table.
    pub tables: Vec<String>,

    /// Rewrite table and column names into identifier-safe keys
    pub normalize_names: bool,

    /// Turn number-looking strings into JSON numbers
    pub coerce_numbers: bool,

    /// Indented output instead of compact
    pub pretty: bool,

    /// Columns exempt from number coercion, by normalized key
    pub overrides: OverrideRegistry,
}

impl ExportOptions {
    pub fn with_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables = tables.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_normalized_names(mut self, enabled: bool) -> Self {
        self.normalize_names = enabled;
        self
    }

    pub fn with_number_coercion(mut self, enabled: bool) -> Self {
        self.coerce_numbers = enabled;
        self
    }

    pub fn with_pretty(mut self, enabled: bool) -> Self {
        self.pretty = enabled;
        self
    }

    pub fn with_overrides(mut self, overrides: OverrideRegistry) -> Self {
        self.overrides = overrides;
        self
    }
}
