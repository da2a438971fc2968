//! Error types for export runs
//!
//! Three classes of failure can end a run: bad configuration (detected
//! before any output is produced), a failing data source, and a failing
//! output sink. Name normalization and number coercion never fail.

use std::io;
use std::path::PathBuf;

/// Result type alias for library operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Override entry without a `table.column` shape
    #[error("malformed override entry '{0}': expected table.column")]
    MalformedOverride(String),

    /// Requested table is not known to the source
    #[error("table '{0}' not found in source")]
    UnknownTable(String),

    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("failed to write output: {0}")]
    Sink(#[from] io::Error),
}

impl Error {
    /// True for errors caused by caller configuration rather than I/O
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::MalformedOverride(_) | Error::UnknownTable(_))
    }
}

/// Failure opening or reading the relational source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("cannot open database {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("cannot open {}: password given but built without the sqlcipher feature", path.display())]
    PasswordUnsupported { path: PathBuf },

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// Cursor failure from a non-SQLite source
    #[error("{0}")]
    Cursor(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_classification() {
        assert!(Error::MalformedOverride("x".into()).is_configuration());
        assert!(Error::UnknownTable("x".into()).is_configuration());
        assert!(!Error::Source(SourceError::Cursor("lost".into())).is_configuration());
        assert!(!Error::Sink(io::Error::new(io::ErrorKind::Other, "full")).is_configuration());
    }

    #[test]
    fn test_messages() {
        let err = Error::UnknownTable("Kunder".into());
        assert_eq!(err.to_string(), "table 'Kunder' not found in source");

        let err = Error::from(SourceError::Cursor("connection lost".into()));
        assert_eq!(err.to_string(), "source error: connection lost");
    }
}
