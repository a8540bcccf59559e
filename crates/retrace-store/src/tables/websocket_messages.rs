use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::types::Value;

use crate::error::{Error, Result};
use crate::table::{BaseTable, Column, ColumnType, RecordTable, SharedConnection};
use crate::table::{flag, millis};

const COLUMNS: &[Column] = &[
    ("id", ColumnType::Integer),
    ("resource_id", ColumnType::Integer),
    ("is_from_server", ColumnType::Integer),
    ("is_binary", ColumnType::Integer),
    ("message", ColumnType::Blob),
    ("ts", ColumnType::Integer),
];

/// Frames exchanged over upgraded websocket resources, both directions.
pub struct WebsocketMessagesTable {
    base: BaseTable,
}

impl WebsocketMessagesTable {
    pub(crate) fn new(conn: SharedConnection) -> Arc<Self> {
        Arc::new(Self {
            base: BaseTable::new(conn, "websocket_messages", COLUMNS),
        })
    }

    pub fn insert(
        &self,
        id: i64,
        resource_id: i64,
        is_from_server: bool,
        is_binary: bool,
        message: Vec<u8>,
        at: &DateTime<Utc>,
    ) -> usize {
        self.base.queue_insert(vec![
            Value::Integer(id),
            Value::Integer(resource_id),
            flag(is_from_server),
            flag(is_binary),
            Value::Blob(message),
            millis(at),
        ])
    }

    pub fn all_for_resource(&self, resource_id: i64) -> Result<Vec<WebsocketMessageRecord>> {
        let guard = self.base.lock_conn();
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let mut stmt = conn.prepare(
            "SELECT id, resource_id, is_from_server, is_binary, message, ts \
             FROM websocket_messages WHERE resource_id = ?1 ORDER BY rowid ASC",
        )?;
        let records = stmt
            .query_map([resource_id], |row| {
                Ok(WebsocketMessageRecord {
                    id: row.get(0)?,
                    resource_id: row.get(1)?,
                    is_from_server: row.get::<_, i64>(2)? != 0,
                    is_binary: row.get::<_, i64>(3)? != 0,
                    message: row.get(4)?,
                    ts: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(records)
    }
}

impl RecordTable for WebsocketMessagesTable {
    fn base(&self) -> &BaseTable {
        &self.base
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct WebsocketMessageRecord {
    pub id: i64,
    pub resource_id: i64,
    pub is_from_server: bool,
    pub is_binary: bool,
    pub message: Vec<u8>,
    pub ts: i64,
}
