use rusqlite::Connection;
use rusqlite::types::Value;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Error, Result};

/// Primitive column types - the durable on-disk contract. Column order and
/// types must stay stable for file-level compatibility with existing
/// session files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Text,
    Real,
    Blob,
}

impl ColumnType {
    fn sql(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Text => "TEXT",
            ColumnType::Real => "REAL",
            ColumnType::Blob => "BLOB",
        }
    }
}

pub type Column = (&'static str, ColumnType);

/// Connection handle shared between a session database and its tables.
/// `None` once the owning database has been closed.
pub type SharedConnection = Arc<Mutex<Option<Connection>>>;

/// Generic append abstraction under every record table: a fixed ordered
/// schema, a pending-row buffer, and prebuilt CREATE/INSERT statements.
///
/// A table never opens or closes the underlying file; it translates typed
/// events into rows over a handle it was given at construction. Appends are
/// pure buffer pushes - all file I/O happens when the owning database drains
/// the buffer inside its batch transaction.
pub struct BaseTable {
    name: &'static str,
    columns: &'static [Column],
    conn: SharedConnection,
    pending: Mutex<Vec<Vec<Value>>>,
    create_sql: String,
    insert_sql: String,
}

impl BaseTable {
    pub fn new(conn: SharedConnection, name: &'static str, columns: &'static [Column]) -> Self {
        let column_defs = columns
            .iter()
            .map(|(col, ty)| format!("{} {}", col, ty.sql()))
            .collect::<Vec<_>>()
            .join(", ");
        let create_sql = format!("CREATE TABLE IF NOT EXISTS {} ({})", name, column_defs);

        let column_names = columns
            .iter()
            .map(|(col, _)| *col)
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=columns.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let insert_sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            name, column_names, placeholders
        );

        Self {
            name,
            columns,
            conn,
            pending: Mutex::new(Vec::new()),
            create_sql,
            insert_sql,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn columns(&self) -> &'static [Column] {
        self.columns
    }

    /// Lock the shared connection, absorbing poisoning - a panicked appender
    /// must not wedge the store.
    pub(crate) fn lock_conn(&self) -> MutexGuard<'_, Option<Connection>> {
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lock_pending(&self) -> MutexGuard<'_, Vec<Vec<Value>>> {
        match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub(crate) fn create(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(&self.create_sql)
    }

    /// Push a row onto the pending buffer and return its buffer index - the
    /// caller's provisional identifier until the next flush commits it.
    /// Arity is the only validation; callers own type correctness.
    pub fn queue_insert(&self, row: Vec<Value>) -> usize {
        debug_assert_eq!(
            row.len(),
            self.columns.len(),
            "row arity mismatch for table {}",
            self.name
        );
        let mut pending = self.lock_pending();
        pending.push(row);
        pending.len() - 1
    }

    /// Immediate single-row insert, bypassing the batch cycle. Reserved for
    /// the rare row that must exist before the first flush (session
    /// metadata).
    pub fn insert_now(&self, row: Vec<Value>) -> Result<()> {
        debug_assert_eq!(
            row.len(),
            self.columns.len(),
            "row arity mismatch for table {}",
            self.name
        );
        let guard = self.lock_conn();
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let mut stmt = conn.prepare_cached(&self.insert_sql)?;
        stmt.execute(rusqlite::params_from_iter(row))?;
        Ok(())
    }

    /// Drain the pending buffer into the store in FIFO order. Only called
    /// inside the owning database's commit transaction, which already holds
    /// the connection lock - the transaction's connection is passed in.
    /// Safe to call with an empty buffer.
    ///
    /// Rows are drained before insertion; on failure the remainder of this
    /// table's batch is lost for the cycle, per the store's no-retry policy.
    pub(crate) fn run_pending_inserts(&self, conn: &Connection) -> rusqlite::Result<()> {
        let rows = {
            let mut pending = self.lock_pending();
            std::mem::take(&mut *pending)
        };
        if rows.is_empty() {
            return Ok(());
        }
        let mut stmt = conn.prepare_cached(&self.insert_sql)?;
        for row in rows {
            stmt.execute(rusqlite::params_from_iter(row))?;
        }
        Ok(())
    }

    pub fn pending_len(&self) -> usize {
        self.lock_pending().len()
    }
}

/// Object-safe view used by the session database's flush loop to drain every
/// table in registration order.
pub trait RecordTable: Send + Sync {
    fn base(&self) -> &BaseTable;
}

// Row value helpers shared by the typed table modules.

pub(crate) fn opt<T: Into<Value>>(value: Option<T>) -> Value {
    value.map(Into::into).unwrap_or(Value::Null)
}

pub(crate) fn flag(value: bool) -> Value {
    Value::Integer(value as i64)
}

pub(crate) fn millis(ts: &chrono::DateTime<chrono::Utc>) -> Value {
    Value::Integer(ts.timestamp_millis())
}

pub(crate) fn opt_millis(ts: &Option<chrono::DateTime<chrono::Utc>>) -> Value {
    match ts {
        Some(ts) => millis(ts),
        None => Value::Null,
    }
}

pub(crate) fn json(value: &Option<serde_json::Value>) -> Value {
    match value {
        Some(value) => Value::Text(value.to_string()),
        None => Value::Null,
    }
}

pub(crate) fn parse_json(text: Option<String>) -> Option<serde_json::Value> {
    text.and_then(|t| serde_json::from_str(&t).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: &[Column] = &[
        ("id", ColumnType::Integer),
        ("label", ColumnType::Text),
        ("weight", ColumnType::Real),
    ];

    fn shared_memory_conn() -> SharedConnection {
        let conn = Connection::open_in_memory().unwrap();
        Arc::new(Mutex::new(Some(conn)))
    }

    #[test]
    fn test_create_and_insert_sql_shapes() {
        let table = BaseTable::new(shared_memory_conn(), "samples", COLUMNS);
        assert_eq!(
            table.create_sql,
            "CREATE TABLE IF NOT EXISTS samples (id INTEGER, label TEXT, weight REAL)"
        );
        assert_eq!(
            table.insert_sql,
            "INSERT INTO samples (id, label, weight) VALUES (?1, ?2, ?3)"
        );
    }

    #[test]
    fn test_queue_insert_returns_fifo_buffer_index() {
        let table = BaseTable::new(shared_memory_conn(), "samples", COLUMNS);
        let first = table.queue_insert(vec![
            Value::Integer(1),
            Value::Text("a".into()),
            Value::Real(0.5),
        ]);
        let second = table.queue_insert(vec![
            Value::Integer(2),
            Value::Text("b".into()),
            Value::Real(1.5),
        ]);
        assert_eq!(first, 0);
        assert_eq!(second, 1);
        assert_eq!(table.pending_len(), 2);
    }

    #[test]
    fn test_run_pending_inserts_drains_in_order() {
        let shared = shared_memory_conn();
        let table = BaseTable::new(shared.clone(), "samples", COLUMNS);

        for i in 0..3 {
            table.queue_insert(vec![
                Value::Integer(i),
                Value::Text(format!("row-{}", i)),
                Value::Real(i as f64),
            ]);
        }

        let guard = table.lock_conn();
        let conn = guard.as_ref().unwrap();
        table.create(conn).unwrap();
        table.run_pending_inserts(conn).unwrap();

        let ids: Vec<i64> = conn
            .prepare("SELECT id FROM samples ORDER BY rowid ASC")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert_eq!(ids, vec![0, 1, 2]);
        drop(guard);

        assert_eq!(table.pending_len(), 0);
    }

    #[test]
    fn test_run_pending_inserts_empty_buffer_is_noop() {
        let shared = shared_memory_conn();
        let table = BaseTable::new(shared, "samples", COLUMNS);
        let guard = table.lock_conn();
        let conn = guard.as_ref().unwrap();
        // No create() on purpose: an empty drain must not touch the file.
        table.run_pending_inserts(conn).unwrap();
    }

    #[test]
    fn test_insert_now_on_closed_handle_errors() {
        let shared: SharedConnection = Arc::new(Mutex::new(None));
        let table = BaseTable::new(shared, "samples", COLUMNS);
        let result = table.insert_now(vec![
            Value::Integer(1),
            Value::Text("a".into()),
            Value::Real(0.0),
        ]);
        assert!(matches!(result, Err(Error::Closed)));
    }
}
