use crate::error::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;

/// Columns exempt from number coercion.
///
/// Keys are normalized table and column names, compared case-sensitively.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideRegistry {
    entries: HashMap<String, HashSet<String>>,
}

impl OverrideRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a comma-separated `table.column,table.column` list.
    ///
    /// The column is everything after the first dot. Empty items between
    /// commas are skipped; an item without a dot, or with an empty side,
    /// is rejected.
    pub fn parse(list: &str) -> Result<Self> {
        Self::from_entries(list.split(',').map(str::trim).filter(|s| !s.is_empty()))
    }

    pub fn from_entries<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self::new();
        for entry in entries {
            let entry = entry.as_ref();
            match entry.split_once('.') {
                Some((table, column)) if !table.is_empty() && !column.is_empty() => {
                    registry.insert(table, column);
                }
                _ => return Err(Error::MalformedOverride(entry.to_string())),
            }
        }
        Ok(registry)
    }

    pub fn insert(&mut self, table: impl Into<String>, column: impl Into<String>) {
        self.entries
            .entry(table.into())
            .or_default()
            .insert(column.into());
    }

    /// True iff `(table, column)` was registered
    pub fn is_exempt(&self, table: &str, column: &str) -> bool {
        self.entries
            .get(table)
            .map_or(false, |columns| columns.contains(column))
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromStr for OverrideRegistry {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
