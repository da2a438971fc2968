//! Table/row projection into the output document
//!
//! Each selected table gets a `TablePlan` computed once from its metadata:
//! the normalized table key plus, per column, the normalized field key and
//! whether the column is exempt from number coercion. Rows are then pulled
//! from the source one at a time and written straight to the emitter.

use crate::error::Result;
use crate::export::coerce::coerce;
use crate::export::emitter::DocumentEmitter;
use crate::export::normalize::normalize;
use crate::source::{select_tables, TableSource};
use crate::types::{ExportOptions, Row, TableDescriptor};
use std::collections::HashSet;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Per-column decisions, fixed for the whole table
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnPlan {
    pub key: String,
    pub exempt: bool,
}

/// Pre-computed emission plan for one table
#[derive(Debug, Clone, PartialEq)]
pub struct TablePlan {
    pub key: String,
    pub columns: Vec<ColumnPlan>,
}

impl TablePlan {
    pub fn new(table: &TableDescriptor, options: &ExportOptions) -> Self {
        let key = normalize(&table.name, options.normalize_names).into_owned();
        let columns = table
            .columns
            .iter()
            .map(|column| Self::column_plan(&key, &column.name, options))
            .collect::<Vec<_>>();

        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.key.as_str()) {
                warn!(table = %table.name, key = %column.key, "duplicate field key after normalization");
            }
        }

        debug!(
            table = %table.name,
            key = %key,
            columns = columns.len(),
            exempt = columns.iter().filter(|c| c.exempt).count(),
            "built table plan"
        );

        TablePlan { key, columns }
    }

    fn column_plan(table_key: &str, column_name: &str, options: &ExportOptions) -> ColumnPlan {
        let key = normalize(column_name, options.normalize_names).into_owned();
        let exempt = options.overrides.is_exempt(table_key, &key);
        ColumnPlan { key, exempt }
    }
}

/// Drives emission of the selected tables into one JSON document
pub struct Projector<'a, W: Write> {
    options: &'a ExportOptions,
    emitter: DocumentEmitter<W>,
}

impl<'a, W: Write> Projector<'a, W> {
    pub fn new(options: &'a ExportOptions, writer: W) -> Self {
        Projector {
            options,
            emitter: DocumentEmitter::new(writer, options.pretty),
        }
    }

    /// Project every selected table and return the writer.
    ///
    /// Table selection is resolved before the first byte is written, so an
    /// unknown table name produces no output at all. When a later error
    /// interrupts the document, open structures are closed before the error
    /// is returned; the output must still be treated as failed.
    pub fn run<S: TableSource + ?Sized>(mut self, source: &S) -> Result<W> {
        let tables = select_tables(source.tables()?, &self.options.tables)?;

        if let Err(err) = self.project_all(source, &tables) {
            if let Err(close_err) = self.emitter.close_open() {
                debug!(error = %close_err, "could not close document after failure");
            }
            return Err(err);
        }

        Ok(self.emitter.finish()?)
    }

    fn project_all<S: TableSource + ?Sized>(&mut self, source: &S, tables: &[TableDescriptor]) -> Result<()> {
        self.emitter.begin_object()?;
        for table in tables {
            self.project_table(source, table)?;
        }
        self.emitter.end_object()?;
        Ok(())
    }

    fn project_table<S: TableSource + ?Sized>(&mut self, source: &S, table: &TableDescriptor) -> Result<()> {
        let mut plan = TablePlan::new(table, self.options);

        self.emitter.write_key(&plan.key)?;
        self.emitter.begin_array()?;

        let mut count = 0u64;
        source.scan(table, &mut |cursor| {
            for row in cursor {
                self.project_row(&mut plan, row?)?;
                count += 1;
            }
            Ok(())
        })?;

        self.emitter.end_array()?;
        info!(table = %table.name, key = %plan.key, rows = count, "projected table");
        Ok(())
    }

    fn project_row(&mut self, plan: &mut TablePlan, row: Row) -> Result<()> {
        self.emitter.begin_object()?;
        for (idx, field) in row.fields.into_iter().enumerate() {
            if idx >= plan.columns.len() {
                // Row wider than the declared columns: plan the extra field by its own name
                let extra = TablePlan::column_plan(&plan.key, &field.name, self.options);
                plan.columns.push(extra);
            }
            let column = &plan.columns[idx];

            let value = if column.exempt {
                field.value
            } else {
                coerce(field.value, self.options.coerce_numbers)
            };

            self.emitter.write_key(&column.key)?;
            self.emitter.write_value(&value)?;
        }
        self.emitter.end_object()?;
        Ok(())
    }
}

/// Write the selected tables of `source` as a JSON document into `writer`
pub fn export_json<S, W>(source: &S, options: &ExportOptions, writer: W) -> Result<W>
where
    S: TableSource + ?Sized,
    W: Write,
{
    Projector::new(options, writer).run(source)
}

/// Write the document to `path`, all or nothing.
///
/// Output goes to a temporary file in the destination directory, which is
/// moved into place only after the whole document has been written. On
/// failure the temporary file is removed and `path` is left untouched.
pub fn export_json_to_path<S>(source: &S, options: &ExportOptions, path: &Path) -> Result<()>
where
    S: TableSource + ?Sized,
{
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let tmp = NamedTempFile::new_in(dir)?;
    let writer = export_json(source, options, BufWriter::new(tmp))?;
    let tmp = writer.into_inner().map_err(|e| e.into_error())?;
    tmp.persist(path).map_err(|e| e.error)?;

    info!(path = %path.display(), "wrote document");
    Ok(())
}
