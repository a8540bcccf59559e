use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::types::Value;

use crate::error::{Error, Result};
use crate::table::{BaseTable, Column, ColumnType, RecordTable, SharedConnection};
use crate::table::{millis, opt};

const COLUMNS: &[Column] = &[
    ("tab_id", ColumnType::Integer),
    ("frame_id", ColumnType::Integer),
    ("level", ColumnType::Text),
    ("message", ColumnType::Text),
    ("location", ColumnType::Text),
    ("ts", ColumnType::Integer),
];

/// Console output captured from the page itself.
pub struct PageLogsTable {
    base: BaseTable,
}

impl PageLogsTable {
    pub(crate) fn new(conn: SharedConnection) -> Arc<Self> {
        Arc::new(Self {
            base: BaseTable::new(conn, "page_logs", COLUMNS),
        })
    }

    pub fn insert(
        &self,
        tab_id: i64,
        frame_id: Option<i64>,
        level: &str,
        message: &str,
        location: Option<&str>,
        at: &DateTime<Utc>,
    ) -> usize {
        self.base.queue_insert(vec![
            Value::Integer(tab_id),
            opt(frame_id),
            Value::Text(level.to_string()),
            Value::Text(message.to_string()),
            opt(location.map(str::to_string)),
            millis(at),
        ])
    }

    pub fn all(&self) -> Result<Vec<PageLogRecord>> {
        let guard = self.base.lock_conn();
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let mut stmt = conn.prepare(
            "SELECT tab_id, frame_id, level, message, location, ts FROM page_logs \
             ORDER BY rowid ASC",
        )?;
        let records = stmt
            .query_map([], |row| {
                Ok(PageLogRecord {
                    tab_id: row.get(0)?,
                    frame_id: row.get(1)?,
                    level: row.get(2)?,
                    message: row.get(3)?,
                    location: row.get(4)?,
                    ts: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(records)
    }
}

impl RecordTable for PageLogsTable {
    fn base(&self) -> &BaseTable {
        &self.base
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PageLogRecord {
    pub tab_id: i64,
    pub frame_id: Option<i64>,
    pub level: String,
    pub message: String,
    pub location: Option<String>,
    pub ts: i64,
}
