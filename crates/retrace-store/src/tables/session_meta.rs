use std::sync::Arc;

use chrono::{DateTime, Utc};
use retrace_types::SessionMeta;
use rusqlite::types::Value;

use crate::error::{Error, Result};
use crate::table::{BaseTable, Column, ColumnType, RecordTable, SharedConnection};
use crate::table::{json, millis, opt};

const COLUMNS: &[Column] = &[
    ("id", ColumnType::Text),
    ("start_ts", ColumnType::Integer),
    ("close_ts", ColumnType::Integer),
    ("user_agent_string", ColumnType::Text),
    ("viewport_width", ColumnType::Integer),
    ("viewport_height", ColumnType::Integer),
    ("timezone_id", ColumnType::Text),
    ("locale", ColumnType::Text),
    ("create_options", ColumnType::Text),
];

/// The single session-metadata row. Written immediately on session start
/// (readers opening mid-session must see it before the first flush);
/// `record_close` is the one sanctioned in-place write in the store.
pub struct SessionTable {
    base: BaseTable,
}

impl SessionTable {
    pub(crate) fn new(conn: SharedConnection) -> Arc<Self> {
        Arc::new(Self {
            base: BaseTable::new(conn, "session", COLUMNS),
        })
    }

    pub fn insert(&self, meta: &SessionMeta) -> Result<()> {
        self.base.insert_now(vec![
            Value::Text(meta.id.clone()),
            millis(&meta.start_at),
            Value::Null,
            opt(meta.user_agent_string.clone()),
            opt(meta.viewport_width),
            opt(meta.viewport_height),
            opt(meta.timezone_id.clone()),
            opt(meta.locale.clone()),
            json(&meta.create_options),
        ])
    }

    /// Stamp the session's close time onto the metadata row.
    pub fn record_close(&self, session_id: &str, at: &DateTime<Utc>) -> Result<()> {
        let guard = self.base.lock_conn();
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        conn.execute(
            "UPDATE session SET close_ts = ?1 WHERE id = ?2",
            rusqlite::params![at.timestamp_millis(), session_id],
        )?;
        Ok(())
    }

    pub fn get(&self) -> Result<Option<SessionRecord>> {
        let guard = self.base.lock_conn();
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let mut stmt = conn.prepare(
            "SELECT id, start_ts, close_ts, user_agent_string, viewport_width, viewport_height, \
             timezone_id, locale, create_options FROM session LIMIT 1",
        )?;
        let mut rows = stmt.query([])?;
        match rows.next()? {
            Some(row) => Ok(Some(SessionRecord {
                id: row.get(0)?,
                start_ts: row.get(1)?,
                close_ts: row.get(2)?,
                user_agent_string: row.get(3)?,
                viewport_width: row.get(4)?,
                viewport_height: row.get(5)?,
                timezone_id: row.get(6)?,
                locale: row.get(7)?,
                create_options: crate::table::parse_json(row.get(8)?),
            })),
            None => Ok(None),
        }
    }
}

impl RecordTable for SessionTable {
    fn base(&self) -> &BaseTable {
        &self.base
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionRecord {
    pub id: String,
    pub start_ts: i64,
    pub close_ts: Option<i64>,
    pub user_agent_string: Option<String>,
    pub viewport_width: Option<i64>,
    pub viewport_height: Option<i64>,
    pub timezone_id: Option<String>,
    pub locale: Option<String>,
    pub create_options: Option<serde_json::Value>,
}
