//! Relational data sources
//!
//! A source enumerates its tables and opens one forward-only row cursor per
//! table scan. Rows are pulled one at a time; nothing is materialized beyond
//! the row being emitted.

pub mod memory;
pub mod sqlite;

pub use memory::MemorySource;
pub use sqlite::SqliteSource;

use crate::error::{Error, SourceError};
use crate::types::{Row, TableDescriptor};

/// Forward-only cursor over one table's rows
pub type RowCursor<'a> = dyn Iterator<Item = Result<Row, SourceError>> + 'a;

/// Supplies table metadata and row cursors
pub trait TableSource {
    /// All tables in the source's enumeration order
    fn tables(&self) -> Result<Vec<TableDescriptor>, SourceError>;

    /// Open a cursor over `table` and hand it to `visit`.
    ///
    /// The cursor lives only for the duration of the call and is released
    /// when `scan` returns, whatever the outcome.
    fn scan(
        &self,
        table: &TableDescriptor,
        visit: &mut dyn FnMut(&mut RowCursor<'_>) -> Result<(), Error>,
    ) -> Result<(), Error>;
}

/// Resolve requested table names against the source's tables.
///
/// An empty request selects every table in source order. Otherwise names
/// resolve in request order, by exact display name first and then
/// case-insensitively. Unknown names fail before anything is scanned.
pub fn select_tables(
    available: Vec<TableDescriptor>,
    requested: &[String],
) -> Result<Vec<TableDescriptor>, Error> {
    if requested.is_empty() {
        return Ok(available);
    }

    requested
        .iter()
        .map(|name| {
            available
                .iter()
                .find(|t| &t.name == name)
                .or_else(|| available.iter().find(|t| t.name.to_lowercase() == name.to_lowercase()))
                .cloned()
                .ok_or_else(|| Error::UnknownTable(name.clone()))
        })
        .collect()
}
