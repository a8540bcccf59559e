use std::sync::Arc;

use retrace_types::LogEntry;
use rusqlite::types::Value;

use crate::error::{Error, Result};
use crate::table::flag;
use crate::table::{BaseTable, Column, ColumnType, RecordTable, SharedConnection};

const COLUMNS: &[Column] = &[
    ("id", ColumnType::Integer),
    ("timestamp", ColumnType::Text),
    ("action", ColumnType::Text),
    ("level", ColumnType::Text),
    ("is_global", ColumnType::Integer),
    ("parent_id", ColumnType::Integer),
    ("data", ColumnType::Text),
];

/// Internal diagnostics from the automation engine, one row per log entry.
/// Timestamps stay ISO text here (log tooling greps them); error payloads
/// arrive pre-flattened via `LogData`.
pub struct SessionLogsTable {
    base: BaseTable,
}

impl SessionLogsTable {
    pub(crate) fn new(conn: SharedConnection) -> Arc<Self> {
        Arc::new(Self {
            base: BaseTable::new(conn, "session_logs", COLUMNS),
        })
    }

    pub fn insert(&self, entry: &LogEntry) -> usize {
        let data = entry.data.as_ref().map(|data| data.to_json().to_string());
        self.base.queue_insert(vec![
            Value::Integer(entry.id),
            Value::Text(entry.timestamp.to_rfc3339()),
            Value::Text(entry.action.clone()),
            Value::Text(entry.level.as_str().to_string()),
            flag(entry.session_id.is_none()),
            crate::table::opt(entry.parent_id),
            crate::table::opt(data),
        ])
    }

    pub fn all(&self) -> Result<Vec<SessionLogRecord>> {
        self.select(
            "SELECT id, timestamp, action, level, is_global, parent_id, data \
             FROM session_logs ORDER BY rowid ASC",
            [],
        )
    }

    pub fn all_errors(&self) -> Result<Vec<SessionLogRecord>> {
        self.select(
            "SELECT id, timestamp, action, level, is_global, parent_id, data \
             FROM session_logs WHERE level = 'error' ORDER BY rowid ASC",
            [],
        )
    }

    fn select<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<SessionLogRecord>> {
        let guard = self.base.lock_conn();
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let mut stmt = conn.prepare(sql)?;
        let records = stmt
            .query_map(params, |row| {
                Ok(SessionLogRecord {
                    id: row.get(0)?,
                    timestamp: row.get(1)?,
                    action: row.get(2)?,
                    level: row.get(3)?,
                    is_global: row.get::<_, i64>(4)? != 0,
                    parent_id: row.get(5)?,
                    data: crate::table::parse_json(row.get(6)?),
                })
            })?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(records)
    }
}

impl RecordTable for SessionLogsTable {
    fn base(&self) -> &BaseTable {
        &self.base
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionLogRecord {
    pub id: i64,
    pub timestamp: String,
    pub action: String,
    pub level: String,
    pub is_global: bool,
    pub parent_id: Option<i64>,
    pub data: Option<serde_json::Value>,
}
