//! SQLite database source
//!
//! SQLite stores five storage classes; the declared column type decides how
//! a stored value is presented (integers in boolean columns become booleans,
//! text in date/time columns becomes a timestamp when it parses as one).

use crate::error::{Error, SourceError};
use crate::source::{RowCursor, TableSource};
use crate::types::{ColumnDescriptor, Field, FieldValue, NativeType, Row, TableDescriptor};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use tracing::debug;

const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// Read-only view of a SQLite database file
pub struct SqliteSource {
    conn: Connection,
}

impl SqliteSource {
    /// Open `path` read-only.
    ///
    /// A password needs the `sqlcipher` feature: it is applied as `PRAGMA key`
    /// and checked by reading the schema, so a wrong key fails here. Without
    /// the feature a password is refused rather than ignored.
    pub fn open<P: AsRef<Path>>(path: P, password: Option<&str>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| SourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(password) = password {
            apply_key(&conn, path, password)?;
        }

        debug!(path = %path.display(), "opened database");
        Ok(Self::from_connection(conn))
    }

    /// Wrap an already open connection
    pub fn from_connection(conn: Connection) -> Self {
        SqliteSource { conn }
    }

    fn columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>, SourceError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
        let columns = stmt
            .query_map([table], |row| {
                let name: String = row.get(0)?;
                let declared: String = row.get(1)?;
                Ok(ColumnDescriptor::new(name, native_type(&declared)))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(columns)
    }
}

impl TableSource for SqliteSource {
    fn tables(&self) -> Result<Vec<TableDescriptor>, SourceError> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND substr(name, 1, 7) <> 'sqlite_' \
             ORDER BY rowid",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        names
            .into_iter()
            .map(|name| {
                let columns = self.columns(&name)?;
                Ok(TableDescriptor {
                    name,
                    description: None,
                    columns,
                })
            })
            .collect()
    }

    fn scan(
        &self,
        table: &TableDescriptor,
        visit: &mut dyn FnMut(&mut RowCursor<'_>) -> Result<(), Error>,
    ) -> Result<(), Error> {
        let sql = format!("SELECT * FROM {}", quote_identifier(&table.name));
        let mut stmt = self.conn.prepare(&sql).map_err(SourceError::from)?;
        let mut rows = stmt.query([]).map_err(SourceError::from)?;

        let mut cursor = std::iter::from_fn(|| match rows.next() {
            Ok(Some(row)) => Some(convert_row(row, &table.columns)),
            Ok(None) => None,
            Err(e) => Some(Err(SourceError::from(e))),
        });
        visit(&mut cursor)
    }
}

#[cfg(feature = "sqlcipher")]
fn apply_key(conn: &Connection, path: &Path, password: &str) -> Result<(), SourceError> {
    let open_error = |source: rusqlite::Error| SourceError::Open {
        path: path.to_path_buf(),
        source,
    };
    conn.pragma_update(None, "key", password).map_err(open_error)?;
    // SQLCipher only notices a wrong key on first read
    conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))
        .map_err(open_error)?;
    Ok(())
}

#[cfg(not(feature = "sqlcipher"))]
fn apply_key(_conn: &Connection, path: &Path, _password: &str) -> Result<(), SourceError> {
    Err(SourceError::PasswordUnsupported {
        path: path.to_path_buf(),
    })
}

fn convert_row(row: &rusqlite::Row<'_>, columns: &[ColumnDescriptor]) -> Result<Row, SourceError> {
    let fields = columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let value = convert_value(row.get_ref(idx)?, &column.native_type);
            Ok(Field {
                name: column.name.clone(),
                value,
                declared_type: column.native_type.clone(),
            })
        })
        .collect::<Result<Vec<_>, SourceError>>()?;
    Ok(Row::new(fields))
}

fn convert_value(value: ValueRef<'_>, declared: &NativeType) -> FieldValue {
    match value {
        ValueRef::Null => FieldValue::Null,
        ValueRef::Integer(i) if *declared == NativeType::Boolean => FieldValue::Bool(i != 0),
        ValueRef::Integer(i) => FieldValue::Int(i),
        ValueRef::Real(f) => FieldValue::Float(f),
        ValueRef::Text(bytes) => {
            let text = String::from_utf8_lossy(bytes);
            match declared {
                NativeType::DateTime => parse_timestamp(&text)
                    .map(FieldValue::DateTime)
                    .unwrap_or_else(|| FieldValue::Text(text.into_owned())),
                _ => FieldValue::Text(text.into_owned()),
            }
        }
        ValueRef::Blob(bytes) => FieldValue::Binary(bytes.to_vec()),
    }
}

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Map a declared column type onto a type tag, following SQLite's
/// affinity rules where they apply
pub fn native_type(declared: &str) -> NativeType {
    let upper = declared.trim().to_uppercase();

    if upper.is_empty() || upper.contains("BLOB") {
        NativeType::Binary
    } else if upper.contains("BOOL") {
        NativeType::Boolean
    } else if upper.contains("DATE") || upper.contains("TIME") {
        NativeType::DateTime
    } else if upper.contains("GUID") || upper.contains("UUID") {
        NativeType::Guid
    } else if upper.contains("INT") {
        NativeType::Integer
    } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
        NativeType::Text
    } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
        NativeType::Float
    } else if upper.contains("NUMERIC") || upper.contains("DECIMAL") {
        NativeType::Numeric
    } else {
        NativeType::Other(declared.trim().to_string())
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> SqliteSource {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE "Ädress" ("Städer" TEXT, "Note" VARCHAR(20), "Aktiv" BOOLEAN);
            CREATE TABLE "Order" (id INTEGER PRIMARY KEY, total REAL, placed DATETIME, payload BLOB, code GUID);
            INSERT INTO "Ädress" VALUES ('42', 'hej', 1);
            INSERT INTO "Ädress" VALUES (NULL, 'då', 0);
            INSERT INTO "Order" VALUES (1, 9.5, '2024-03-01 12:30:05', x'686a', 'abc');
            INSERT INTO "Order" VALUES (2, NULL, 'soon', NULL, NULL);
            "#,
        )
        .unwrap();
        SqliteSource::from_connection(conn)
    }

    fn collect(source: &SqliteSource, table: &TableDescriptor) -> Vec<Row> {
        let mut rows = Vec::new();
        source
            .scan(table, &mut |cursor| {
                for row in cursor {
                    rows.push(row?);
                }
                Ok(())
            })
            .unwrap();
        rows
    }

    #[test]
    fn test_tables_in_creation_order() {
        let source = fixture();
        let tables = source.tables().unwrap();
        let names: Vec<_> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Ädress", "Order"]);

        let columns: Vec<_> = tables[0]
            .columns
            .iter()
            .map(|c| (c.name.as_str(), c.native_type.clone()))
            .collect();
        assert_eq!(
            columns,
            vec![
                ("Städer", NativeType::Text),
                ("Note", NativeType::Text),
                ("Aktiv", NativeType::Boolean),
            ]
        );
    }

    #[test]
    fn test_values_follow_declared_types() {
        let source = fixture();
        let tables = source.tables().unwrap();

        let rows = collect(&source, &tables[0]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].fields[0].value, FieldValue::Text("42".into()));
        assert_eq!(rows[0].fields[2].value, FieldValue::Bool(true));
        assert_eq!(rows[1].fields[0].value, FieldValue::Null);
        assert_eq!(rows[1].fields[2].value, FieldValue::Bool(false));

        let rows = collect(&source, &tables[1]);
        let placed = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(12, 30, 5).unwrap();
        assert_eq!(rows[0].fields[0].value, FieldValue::Int(1));
        assert_eq!(rows[0].fields[1].value, FieldValue::Float(9.5));
        assert_eq!(rows[0].fields[2].value, FieldValue::DateTime(placed));
        assert_eq!(rows[0].fields[3].value, FieldValue::Binary(b"hj".to_vec()));
        assert_eq!(rows[0].fields[4].value, FieldValue::Text("abc".into()));
        assert_eq!(rows[1].fields[2].value, FieldValue::Text("soon".into()));
    }

    #[test]
    fn test_native_type_mapping() {
        assert_eq!(native_type("INTEGER"), NativeType::Integer);
        assert_eq!(native_type("bigint"), NativeType::Integer);
        assert_eq!(native_type("NVARCHAR(50)"), NativeType::Text);
        assert_eq!(native_type("double precision"), NativeType::Float);
        assert_eq!(native_type("DECIMAL(10,2)"), NativeType::Numeric);
        assert_eq!(native_type("timestamp"), NativeType::DateTime);
        assert_eq!(native_type(""), NativeType::Binary);
        assert_eq!(native_type("Money"), NativeType::Other("Money".into()));
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("Order"), "\"Order\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    fn database_file(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("kunder.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("CREATE TABLE Kund (id INTEGER);").unwrap();
        path
    }

    #[test]
    fn test_open_without_password() {
        let dir = tempfile::tempdir().unwrap();
        let source = SqliteSource::open(database_file(&dir), None).unwrap();
        assert_eq!(source.tables().unwrap().len(), 1);
    }

    #[cfg(not(feature = "sqlcipher"))]
    #[test]
    fn test_password_refused_without_sqlcipher() {
        let dir = tempfile::tempdir().unwrap();
        let err = SqliteSource::open(database_file(&dir), Some("hemligt")).err().unwrap();
        assert!(matches!(err, SourceError::PasswordUnsupported { .. }));
    }

    #[cfg(feature = "sqlcipher")]
    #[test]
    fn test_wrong_password_fails_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("krypterad.db");
        let conn = Connection::open(&path).unwrap();
        conn.pragma_update(None, "key", "rätt").unwrap();
        conn.execute_batch("CREATE TABLE Kund (id INTEGER);").unwrap();
        drop(conn);

        assert!(SqliteSource::open(&path, Some("rätt")).is_ok());
        let err = SqliteSource::open(&path, Some("fel")).err().unwrap();
        assert!(matches!(err, SourceError::Open { .. }));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SqliteSource::open(dir.path().join("missing.db"), None).err().unwrap();
        assert!(matches!(err, SourceError::Open { .. }));
    }
}
