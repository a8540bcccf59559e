use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::types::Value;

use crate::error::{Error, Result};
use crate::table::{BaseTable, Column, ColumnType, RecordTable, SharedConnection};
use crate::table::{json, millis, opt};

const COLUMNS: &[Column] = &[
    ("direction", ColumnType::Text),
    ("page_target_id", ColumnType::Text),
    ("worker_target_id", ColumnType::Text),
    ("frame_id", ColumnType::Integer),
    ("request_id", ColumnType::Integer),
    ("method", ColumnType::Text),
    ("params", ColumnType::Text),
    ("result", ColumnType::Text),
    ("error", ColumnType::Text),
    ("ts", ColumnType::Integer),
];

/// Which way a devtools protocol message travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevtoolsDirection {
    Send,
    Receive,
}

impl DevtoolsDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            DevtoolsDirection::Send => "send",
            DevtoolsDirection::Receive => "receive",
        }
    }
}

/// Raw devtools protocol traffic, kept for low-level debugging of a session.
pub struct DevtoolsMessagesTable {
    base: BaseTable,
}

impl DevtoolsMessagesTable {
    pub(crate) fn new(conn: SharedConnection) -> Arc<Self> {
        Arc::new(Self {
            base: BaseTable::new(conn, "devtools_messages", COLUMNS),
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn insert(
        &self,
        direction: DevtoolsDirection,
        page_target_id: Option<&str>,
        worker_target_id: Option<&str>,
        frame_id: Option<i64>,
        request_id: Option<i64>,
        method: Option<&str>,
        params: Option<serde_json::Value>,
        result: Option<serde_json::Value>,
        error: Option<serde_json::Value>,
        at: &DateTime<Utc>,
    ) -> usize {
        self.base.queue_insert(vec![
            Value::Text(direction.as_str().to_string()),
            opt(page_target_id.map(str::to_string)),
            opt(worker_target_id.map(str::to_string)),
            opt(frame_id),
            opt(request_id),
            opt(method.map(str::to_string)),
            json(&params),
            json(&result),
            json(&error),
            millis(at),
        ])
    }

    pub fn all_for_method(&self, method: &str) -> Result<Vec<DevtoolsMessageRecord>> {
        let guard = self.base.lock_conn();
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let mut stmt = conn.prepare(
            "SELECT direction, page_target_id, frame_id, request_id, method, params, ts \
             FROM devtools_messages WHERE method = ?1 ORDER BY rowid ASC",
        )?;
        let records = stmt
            .query_map([method], |row| {
                Ok(DevtoolsMessageRecord {
                    direction: row.get(0)?,
                    page_target_id: row.get(1)?,
                    frame_id: row.get(2)?,
                    request_id: row.get(3)?,
                    method: row.get(4)?,
                    params: crate::table::parse_json(row.get(5)?),
                    ts: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(records)
    }
}

impl RecordTable for DevtoolsMessagesTable {
    fn base(&self) -> &BaseTable {
        &self.base
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DevtoolsMessageRecord {
    pub direction: String,
    pub page_target_id: Option<String>,
    pub frame_id: Option<i64>,
    pub request_id: Option<i64>,
    pub method: Option<String>,
    pub params: Option<serde_json::Value>,
    pub ts: i64,
}
