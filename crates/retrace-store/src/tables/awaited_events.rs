use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::types::Value;

use crate::error::{Error, Result};
use crate::table::{BaseTable, Column, ColumnType, RecordTable, SharedConnection};
use crate::table::{millis, opt};

const COLUMNS: &[Column] = &[
    ("tab_id", ColumnType::Integer),
    ("frame_id", ColumnType::Integer),
    ("command_id", ColumnType::Integer),
    ("listener_id", ColumnType::Text),
    ("event_class", ColumnType::Text),
    ("ts", ColumnType::Integer),
];

/// Events the script awaited on (waitForResource, waitForLocation, ...) and
/// when they fired.
pub struct AwaitedEventsTable {
    base: BaseTable,
}

impl AwaitedEventsTable {
    pub(crate) fn new(conn: SharedConnection) -> Arc<Self> {
        Arc::new(Self {
            base: BaseTable::new(conn, "awaited_events", COLUMNS),
        })
    }

    pub fn insert(
        &self,
        tab_id: i64,
        frame_id: Option<i64>,
        command_id: i64,
        listener_id: &str,
        event_class: &str,
        at: &DateTime<Utc>,
    ) -> usize {
        self.base.queue_insert(vec![
            Value::Integer(tab_id),
            opt(frame_id),
            Value::Integer(command_id),
            Value::Text(listener_id.to_string()),
            Value::Text(event_class.to_string()),
            millis(at),
        ])
    }

    pub fn all(&self) -> Result<Vec<AwaitedEventRecord>> {
        let guard = self.base.lock_conn();
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let mut stmt = conn.prepare(
            "SELECT tab_id, frame_id, command_id, listener_id, event_class, ts \
             FROM awaited_events ORDER BY rowid ASC",
        )?;
        let records = stmt
            .query_map([], |row| {
                Ok(AwaitedEventRecord {
                    tab_id: row.get(0)?,
                    frame_id: row.get(1)?,
                    command_id: row.get(2)?,
                    listener_id: row.get(3)?,
                    event_class: row.get(4)?,
                    ts: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(records)
    }
}

impl RecordTable for AwaitedEventsTable {
    fn base(&self) -> &BaseTable {
        &self.base
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct AwaitedEventRecord {
    pub tab_id: i64,
    pub frame_id: Option<i64>,
    pub command_id: i64,
    pub listener_id: String,
    pub event_class: String,
    pub ts: i64,
}
