use std::sync::Arc;

use retrace_types::StorageChange;
use rusqlite::types::Value;

use crate::error::{Error, Result};
use crate::table::{BaseTable, Column, ColumnType, RecordTable, SharedConnection};
use crate::table::{json, millis, opt};

const COLUMNS: &[Column] = &[
    ("tab_id", ColumnType::Integer),
    ("security_origin", ColumnType::Text),
    ("type", ColumnType::Text),
    ("action", ColumnType::Text),
    ("key", ColumnType::Text),
    ("value", ColumnType::Text),
    ("meta", ColumnType::Text),
    ("ts", ColumnType::Integer),
];

/// Origin-storage mutations (localStorage, sessionStorage, cookies,
/// indexedDB), appended as they are observed.
pub struct StorageChangesTable {
    base: BaseTable,
}

impl StorageChangesTable {
    pub(crate) fn new(conn: SharedConnection) -> Arc<Self> {
        Arc::new(Self {
            base: BaseTable::new(conn, "storage_changes", COLUMNS),
        })
    }

    pub fn insert(&self, change: &StorageChange) -> usize {
        self.base.queue_insert(vec![
            Value::Integer(change.tab_id),
            Value::Text(change.security_origin.clone()),
            Value::Text(change.storage_type.as_str().to_string()),
            Value::Text(change.action.as_str().to_string()),
            Value::Text(change.key.clone()),
            opt(change.value.clone()),
            json(&change.meta),
            millis(&change.timestamp),
        ])
    }

    pub fn all_for_tab(&self, tab_id: i64) -> Result<Vec<StorageChangeRecord>> {
        let guard = self.base.lock_conn();
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let mut stmt = conn.prepare(
            "SELECT tab_id, security_origin, type, action, key, value, ts \
             FROM storage_changes WHERE tab_id = ?1 ORDER BY rowid ASC",
        )?;
        let records = stmt
            .query_map([tab_id], |row| {
                Ok(StorageChangeRecord {
                    tab_id: row.get(0)?,
                    security_origin: row.get(1)?,
                    storage_type: row.get(2)?,
                    action: row.get(3)?,
                    key: row.get(4)?,
                    value: row.get(5)?,
                    ts: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(records)
    }
}

impl RecordTable for StorageChangesTable {
    fn base(&self) -> &BaseTable {
        &self.base
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct StorageChangeRecord {
    pub tab_id: i64,
    pub security_origin: String,
    pub storage_type: String,
    pub action: String,
    pub key: String,
    pub value: Option<String>,
    pub ts: i64,
}
