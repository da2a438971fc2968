use crate::error::{Error, SourceError};
use crate::source::{RowCursor, TableSource};
use crate::types::{Row, TableDescriptor};

/// Vector-backed source, handy for tests and for embedding callers that
/// already hold their data in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: Vec<(TableDescriptor, Vec<Row>)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: TableDescriptor, rows: Vec<Row>) -> Self {
        self.tables.push((table, rows));
        self
    }
}

impl TableSource for MemorySource {
    fn tables(&self) -> Result<Vec<TableDescriptor>, SourceError> {
        Ok(self.tables.iter().map(|(table, _)| table.clone()).collect())
    }

    fn scan(
        &self,
        table: &TableDescriptor,
        visit: &mut dyn FnMut(&mut RowCursor<'_>) -> Result<(), Error>,
    ) -> Result<(), Error> {
        let (_, rows) = self
            .tables
            .iter()
            .find(|(t, _)| t.name == table.name)
            .ok_or_else(|| Error::UnknownTable(table.name.clone()))?;

        let mut cursor = rows.iter().cloned().map(Ok::<Row, SourceError>);
        visit(&mut cursor)
    }
}
