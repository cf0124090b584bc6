//! Record store access
//!
//! Connection records live in SQLite: one database file per dataset and one
//! table per collection. The report only reads; databases are opened
//! read-only.
//!
//! # Collection schema
//!
//! ```sql
//! CREATE TABLE conn (
//!     src TEXT NOT NULL,
//!     spt INTEGER NOT NULL,
//!     dst TEXT NOT NULL,
//!     dpt INTEGER NOT NULL,
//!     duration REAL NOT NULL,
//!     proto TEXT NOT NULL
//! );
//! ```
//!
//! Ties on the sort column keep insertion (`rowid`) order, so fetches are
//! deterministic.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rusqlite::{Connection, OpenFlags, params};

use crate::conn::{ConnField, ConnRecord};
use crate::error::{Result, StorageError};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Field plus direction, written as `"-duration"` (descending) or
/// `"duration"` / `"+duration"` (ascending)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: ConnField,
    pub order: SortOrder,
}

impl SortKey {
    #[must_use]
    pub fn descending(field: ConnField) -> Self {
        Self {
            field,
            order: SortOrder::Descending,
        }
    }

    /// SQL `ORDER BY` clause for this key, with `rowid` as the tie breaker
    fn order_by(self) -> String {
        let direction = match self.order {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        };
        format!("{} {direction}, rowid ASC", self.field.column())
    }

    /// Stable in-process sort matching the SQL ordering
    pub fn sort(self, records: &mut [ConnRecord]) {
        match self.order {
            SortOrder::Ascending => records.sort_by(|a, b| self.field.compare(a, b)),
            SortOrder::Descending => records.sort_by(|a, b| self.field.compare(b, a)),
        }
    }
}

impl FromStr for SortKey {
    type Err = StorageError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (order, name) = if let Some(rest) = trimmed.strip_prefix('-') {
            (SortOrder::Descending, rest)
        } else if let Some(rest) = trimmed.strip_prefix('+') {
            (SortOrder::Ascending, rest)
        } else {
            (SortOrder::Ascending, trimmed)
        };

        let field =
            ConnField::from_name(name).ok_or_else(|| StorageError::InvalidSortKey(s.to_string()))?;
        Ok(Self { field, order })
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.order {
            SortOrder::Ascending => write!(f, "{}", self.field.column()),
            SortOrder::Descending => write!(f, "-{}", self.field.column()),
        }
    }
}

/// Read access to collections of connection records
pub trait RecordSource {
    /// Fetch every record in `collection`, ordered by `sort`.
    ///
    /// A collection that does not exist yields an empty result.
    fn fetch_all(&self, collection: &str, sort: SortKey) -> Result<Vec<ConnRecord>>;
}

/// Check that a collection name is a plain SQL identifier
#[must_use]
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn ensure_identifier(collection: &str) -> Result<()> {
    if is_valid_identifier(collection) {
        Ok(())
    } else {
        Err(StorageError::InvalidCollection(collection.to_string()).into())
    }
}

// =============================================================================
// SQLite
// =============================================================================

/// SQLite-backed record source for one dataset
pub struct SqliteRecordSource {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteRecordSource {
    /// Open an existing dataset database read-only
    ///
    /// # Errors
    /// Returns `DatasetNotFound` if the file does not exist.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(StorageError::DatasetNotFound(path.display().to_string()).into());
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| StorageError::Database(format!("Failed to open database: {e}")))?;

        tracing::debug!(path = %path.display(), "Opened dataset");

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Wrap an already open connection
    #[must_use]
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn, path: None }
    }

    /// Database file backing this source, if any
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl RecordSource for SqliteRecordSource {
    fn fetch_all(&self, collection: &str, sort: SortKey) -> Result<Vec<ConnRecord>> {
        ensure_identifier(collection)?;

        if !table_exists(&self.conn, collection)? {
            tracing::debug!(collection, "Collection does not exist");
            return Ok(Vec::new());
        }

        query_conns(&self.conn, collection, sort)
    }
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            [table],
            |row| row.get(0),
        )
        .map_err(|e| StorageError::Database(e.to_string()))?;

    Ok(count > 0)
}

/// Query all records of a collection table
fn query_conns(conn: &Connection, table: &str, sort: SortKey) -> Result<Vec<ConnRecord>> {
    let sql = format!(
        "SELECT src, spt, dst, dpt, duration, proto FROM \"{table}\" ORDER BY {}",
        sort.order_by()
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| StorageError::Database(format!("Failed to prepare query: {e}")))?;

    let rows = stmt
        .query_map([], |row| {
            Ok(ConnRecord {
                src: row.get(0)?,
                spt: row.get(1)?,
                dst: row.get(2)?,
                dpt: row.get(3)?,
                dur: row.get(4)?,
                proto: row.get(5)?,
            })
        })
        .map_err(|e| StorageError::Database(format!("Query failed: {e}")))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row.map_err(|e| StorageError::Database(format!("Row error: {e}")))?);
    }

    Ok(results)
}

/// Create a collection table with the connection schema
pub fn create_conn_table(conn: &Connection, table: &str) -> Result<()> {
    ensure_identifier(table)?;
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS \"{table}\" (
            src TEXT NOT NULL,
            spt INTEGER NOT NULL,
            dst TEXT NOT NULL,
            dpt INTEGER NOT NULL,
            duration REAL NOT NULL,
            proto TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS \"idx_{table}_duration\" ON \"{table}\"(duration);"
    ))
    .map_err(|e| StorageError::Database(format!("Create table failed: {e}")))?;
    Ok(())
}

/// Append a record to a collection table
pub fn insert_conn(conn: &Connection, table: &str, record: &ConnRecord) -> Result<()> {
    ensure_identifier(table)?;
    conn.execute(
        &format!(
            "INSERT INTO \"{table}\" (src, spt, dst, dpt, duration, proto)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
        ),
        params![
            record.src,
            record.spt,
            record.dst,
            record.dpt,
            record.dur,
            record.proto
        ],
    )
    .map_err(|e| StorageError::Database(format!("Insert failed: {e}")))?;
    Ok(())
}

// =============================================================================
// In-memory
// =============================================================================

/// In-process record source; sorts on fetch
#[derive(Debug, Default, Clone)]
pub struct MemoryRecordSource {
    collections: HashMap<String, Vec<ConnRecord>>,
}

impl MemoryRecordSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a collection
    #[must_use]
    pub fn with_collection(
        mut self,
        collection: impl Into<String>,
        records: Vec<ConnRecord>,
    ) -> Self {
        self.collections.insert(collection.into(), records);
        self
    }
}

impl RecordSource for MemoryRecordSource {
    fn fetch_all(&self, collection: &str, sort: SortKey) -> Result<Vec<ConnRecord>> {
        ensure_identifier(collection)?;
        let mut records = self
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default();
        sort.sort(&mut records);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conn::is_duration_descending;

    fn sample() -> Vec<ConnRecord> {
        vec![
            ConnRecord::new("10.0.0.3", 5555, "10.0.0.4", 443, 5.0, "udp"),
            ConnRecord::new("10.0.0.1", 1234, "10.0.0.2", 80, 120.5, "tcp"),
            ConnRecord::new("10.0.0.5", 6000, "10.0.0.6", 53, 5.0, "udp"),
            ConnRecord::new("10.0.0.7", 7000, "10.0.0.8", 22, 3600.25, "tcp"),
        ]
    }

    fn seeded(table: &str, records: &[ConnRecord]) -> SqliteRecordSource {
        let conn = Connection::open_in_memory().unwrap();
        create_conn_table(&conn, table).unwrap();
        for record in records {
            insert_conn(&conn, table, record).unwrap();
        }
        SqliteRecordSource::from_connection(conn)
    }

    // =========================================================================
    // Sort keys
    // =========================================================================

    #[test]
    fn sort_key_parses_direction() {
        let desc: SortKey = "-duration".parse().unwrap();
        assert_eq!(desc, SortKey::descending(ConnField::Dur));

        let asc: SortKey = "duration".parse().unwrap();
        assert_eq!(asc.order, SortOrder::Ascending);

        let plus: SortKey = "+spt".parse().unwrap();
        assert_eq!(plus.field, ConnField::Spt);
        assert_eq!(plus.order, SortOrder::Ascending);
    }

    #[test]
    fn sort_key_rejects_unknown_field() {
        let err = "-bytes".parse::<SortKey>().unwrap_err();
        assert!(matches!(err, StorageError::InvalidSortKey(ref key) if key == "-bytes"));
    }

    #[test]
    fn sort_key_display_roundtrips() {
        assert_eq!(SortKey::descending(ConnField::Dur).to_string(), "-duration");
        let key: SortKey = "-duration".parse().unwrap();
        assert_eq!(key.to_string().parse::<SortKey>().unwrap(), key);
    }

    #[test]
    fn identifiers() {
        assert!(is_valid_identifier("conn"));
        assert!(is_valid_identifier("_conn_2"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("2conn"));
        assert!(!is_valid_identifier("conn; DROP TABLE conn"));
        assert!(!is_valid_identifier("conn\""));
    }

    // =========================================================================
    // SQLite source
    // =========================================================================

    #[test]
    fn sqlite_fetch_orders_longest_first() {
        let source = seeded("conn", &sample());
        let records = source
            .fetch_all("conn", SortKey::descending(ConnField::Dur))
            .unwrap();

        assert_eq!(records.len(), 4);
        assert!(is_duration_descending(&records));
        assert_eq!(records[0].dur, 3600.25);
        assert_eq!(records[1].src, "10.0.0.1");
    }

    #[test]
    fn sqlite_ties_keep_insertion_order() {
        let source = seeded("conn", &sample());
        let records = source
            .fetch_all("conn", SortKey::descending(ConnField::Dur))
            .unwrap();

        // Both 5.0 records, in the order they were inserted
        assert_eq!(records[2].src, "10.0.0.3");
        assert_eq!(records[3].src, "10.0.0.5");
    }

    #[test]
    fn sqlite_missing_collection_is_empty() {
        let source = seeded("conn", &sample());
        let records = source
            .fetch_all("dns", SortKey::descending(ConnField::Dur))
            .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn sqlite_rejects_unsafe_collection() {
        let source = seeded("conn", &sample());
        let err = source
            .fetch_all("conn\" --", SortKey::descending(ConnField::Dur))
            .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Storage(StorageError::InvalidCollection(_))
        ));
    }

    #[test]
    fn sqlite_integer_durations_read_as_float() {
        let conn = Connection::open_in_memory().unwrap();
        create_conn_table(&conn, "conn").unwrap();
        conn.execute(
            "INSERT INTO conn (src, spt, dst, dpt, duration, proto) VALUES ('a', 1, 'b', 2, 7, 'tcp')",
            [],
        )
        .unwrap();
        let source = SqliteRecordSource::from_connection(conn);

        let records = source
            .fetch_all("conn", SortKey::descending(ConnField::Dur))
            .unwrap();
        assert_eq!(records[0].dur, 7.0);
    }

    #[test]
    fn sqlite_bad_schema_is_database_error() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE conn (src TEXT, spt INTEGER);")
            .unwrap();
        let source = SqliteRecordSource::from_connection(conn);

        let err = source
            .fetch_all("conn", SortKey::descending(ConnField::Dur))
            .unwrap_err();
        assert!(matches!(err, crate::Error::Storage(StorageError::Database(_))));
    }

    #[test]
    fn open_missing_dataset_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nope.sqlite");

        let err = SqliteRecordSource::open(&path).err().unwrap();
        assert!(matches!(
            err,
            crate::Error::Storage(StorageError::DatasetNotFound(_))
        ));
    }

    #[test]
    fn open_file_dataset_reads_records() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("office.sqlite");
        {
            let conn = Connection::open(&path).unwrap();
            create_conn_table(&conn, "conn").unwrap();
            for record in sample() {
                insert_conn(&conn, "conn", &record).unwrap();
            }
        }

        let source = SqliteRecordSource::open(&path).unwrap();
        assert_eq!(source.path(), Some(path.as_path()));
        let records = source
            .fetch_all("conn", SortKey::descending(ConnField::Dur))
            .unwrap();
        assert_eq!(records.len(), 4);
    }

    // =========================================================================
    // Memory source
    // =========================================================================

    #[test]
    fn memory_source_sorts_stably() {
        let source = MemoryRecordSource::new().with_collection("conn", sample());
        let records = source
            .fetch_all("conn", SortKey::descending(ConnField::Dur))
            .unwrap();

        let order: Vec<_> = records.iter().map(|r| r.src.as_str()).collect();
        assert_eq!(order, ["10.0.0.7", "10.0.0.1", "10.0.0.3", "10.0.0.5"]);
    }

    #[test]
    fn memory_source_matches_sqlite_order() {
        let memory = MemoryRecordSource::new().with_collection("conn", sample());
        let sqlite = seeded("conn", &sample());
        let key = SortKey::descending(ConnField::Dur);

        assert_eq!(
            memory.fetch_all("conn", key).unwrap(),
            sqlite.fetch_all("conn", key).unwrap()
        );
    }

    #[test]
    fn memory_source_ascending() {
        let source = MemoryRecordSource::new().with_collection("conn", sample());
        let records = source.fetch_all("conn", "dpt".parse().unwrap()).unwrap();
        let ports: Vec<_> = records.iter().map(|r| r.dpt).collect();
        assert_eq!(ports, [22, 53, 80, 443]);
    }
}
