use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::types::Value;

use crate::error::{Error, Result};
use crate::table::{BaseTable, Column, ColumnType, RecordTable, SharedConnection};
use crate::table::{millis, opt};

const COLUMNS: &[Column] = &[
    ("id", ColumnType::Integer),
    ("parent_tab_id", ColumnType::Integer),
    ("opener_tab_id", ColumnType::Integer),
    ("page_target_id", ColumnType::Text),
    ("devtools_session_id", ColumnType::Text),
    ("viewport_width", ColumnType::Integer),
    ("viewport_height", ColumnType::Integer),
    ("browser_position_x", ColumnType::Integer),
    ("browser_position_y", ColumnType::Integer),
    ("created_ts", ColumnType::Integer),
];

/// One row per browser tab opened during the session.
pub struct TabsTable {
    base: BaseTable,
}

impl TabsTable {
    pub(crate) fn new(conn: SharedConnection) -> Arc<Self> {
        Arc::new(Self {
            base: BaseTable::new(conn, "tabs", COLUMNS),
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn insert(
        &self,
        id: i64,
        parent_tab_id: Option<i64>,
        opener_tab_id: Option<i64>,
        page_target_id: &str,
        devtools_session_id: &str,
        viewport_width: i64,
        viewport_height: i64,
        browser_position_x: i64,
        browser_position_y: i64,
        created_at: &DateTime<Utc>,
    ) -> usize {
        self.base.queue_insert(vec![
            Value::Integer(id),
            opt(parent_tab_id),
            opt(opener_tab_id),
            Value::Text(page_target_id.to_string()),
            Value::Text(devtools_session_id.to_string()),
            Value::Integer(viewport_width),
            Value::Integer(viewport_height),
            Value::Integer(browser_position_x),
            Value::Integer(browser_position_y),
            millis(created_at),
        ])
    }

    pub fn all(&self) -> Result<Vec<TabRecord>> {
        let guard = self.base.lock_conn();
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let mut stmt = conn.prepare(
            "SELECT id, parent_tab_id, opener_tab_id, page_target_id, viewport_width, \
             viewport_height, created_ts FROM tabs ORDER BY rowid ASC",
        )?;
        let records = stmt
            .query_map([], |row| {
                Ok(TabRecord {
                    id: row.get(0)?,
                    parent_tab_id: row.get(1)?,
                    opener_tab_id: row.get(2)?,
                    page_target_id: row.get(3)?,
                    viewport_width: row.get(4)?,
                    viewport_height: row.get(5)?,
                    created_ts: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(records)
    }
}

impl RecordTable for TabsTable {
    fn base(&self) -> &BaseTable {
        &self.base
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct TabRecord {
    pub id: i64,
    pub parent_tab_id: Option<i64>,
    pub opener_tab_id: Option<i64>,
    pub page_target_id: String,
    pub viewport_width: i64,
    pub viewport_height: i64,
    pub created_ts: i64,
}
