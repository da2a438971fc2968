use crate::export::normalize;
use crate::types::{NativeType, TableDescriptor};
use serde::Serialize;
use std::io::{self, Write};

/// Write a human-readable listing of tables and their columns.
///
/// With `normalize_names` set, each table and column also shows the key it
/// would be exported under.
pub fn describe_tables<W: Write>(tables: &[TableDescriptor], normalize_names: bool, out: &mut W) -> io::Result<()> {
    for table in tables {
        write!(out, "{}", table.name)?;
        if normalize_names {
            write!(out, " -> {}", normalize(&table.name, true))?;
        }
        writeln!(out)?;

        if let Some(description) = &table.description {
            writeln!(out, "  {}", description)?;
        }

        for column in &table.columns {
            write!(out, "    {} ({})", column.name, column.native_type)?;
            if normalize_names {
                write!(out, " -> {}", normalize(&column.name, true))?;
            }
            if let Some(description) = &column.description {
                write!(out, " - {}", description)?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct TableListing<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    description: Option<&'a str>,
    columns: Vec<ColumnListing<'a>>,
}

#[derive(Serialize)]
struct ColumnListing<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    description: Option<&'a str>,
    native_type: &'a NativeType,
}

/// Write table metadata as pretty-printed JSON.
///
/// With `normalize_names` set, tables and columns carry a `key` entry.
pub fn describe_tables_json<W: Write>(tables: &[TableDescriptor], normalize_names: bool, out: &mut W) -> io::Result<()> {
    let key_for = |name: &str| normalize_names.then(|| normalize(name, true).into_owned());

    let listing: Vec<TableListing<'_>> = tables
        .iter()
        .map(|table| TableListing {
            name: &table.name,
            key: key_for(&table.name),
            description: table.description.as_deref(),
            columns: table
                .columns
                .iter()
                .map(|column| ColumnListing {
                    name: &column.name,
                    key: key_for(&column.name),
                    description: column.description.as_deref(),
                    native_type: &column.native_type,
                })
                .collect(),
        })
        .collect();

    serde_json::to_writer_pretty(&mut *out, &listing)?;
    writeln!(out)
}
