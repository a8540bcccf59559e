use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::types::Value;

use crate::error::{Error, Result};
use crate::table::{BaseTable, Column, ColumnType, RecordTable, SharedConnection};
use crate::table::{millis, opt, opt_millis};

const FRAME_COLUMNS: &[Column] = &[
    ("id", ColumnType::Integer),
    ("tab_id", ColumnType::Integer),
    ("dom_node_id", ColumnType::Integer),
    ("parent_id", ColumnType::Integer),
    ("name", ColumnType::Text),
    ("security_origin", ColumnType::Text),
    ("start_command_id", ColumnType::Integer),
    ("created_ts", ColumnType::Integer),
];

/// Frames attached to a tab's document tree. The main frame has no parent.
pub struct FramesTable {
    base: BaseTable,
}

impl FramesTable {
    pub(crate) fn new(conn: SharedConnection) -> Arc<Self> {
        Arc::new(Self {
            base: BaseTable::new(conn, "frames", FRAME_COLUMNS),
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn insert(
        &self,
        id: i64,
        tab_id: i64,
        dom_node_id: Option<i64>,
        parent_id: Option<i64>,
        name: Option<&str>,
        security_origin: Option<&str>,
        start_command_id: i64,
        created_at: &DateTime<Utc>,
    ) -> usize {
        self.base.queue_insert(vec![
            Value::Integer(id),
            Value::Integer(tab_id),
            opt(dom_node_id),
            opt(parent_id),
            opt(name.map(str::to_string)),
            opt(security_origin.map(str::to_string)),
            Value::Integer(start_command_id),
            millis(created_at),
        ])
    }

    pub fn all(&self) -> Result<Vec<FrameRecord>> {
        let guard = self.base.lock_conn();
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let mut stmt = conn.prepare(
            "SELECT id, tab_id, parent_id, name, security_origin, start_command_id, created_ts \
             FROM frames ORDER BY rowid ASC",
        )?;
        let records = stmt
            .query_map([], |row| {
                Ok(FrameRecord {
                    id: row.get(0)?,
                    tab_id: row.get(1)?,
                    parent_id: row.get(2)?,
                    name: row.get(3)?,
                    security_origin: row.get(4)?,
                    start_command_id: row.get(5)?,
                    created_ts: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(records)
    }
}

impl RecordTable for FramesTable {
    fn base(&self) -> &BaseTable {
        &self.base
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct FrameRecord {
    pub id: i64,
    pub tab_id: i64,
    pub parent_id: Option<i64>,
    pub name: Option<String>,
    pub security_origin: Option<String>,
    pub start_command_id: i64,
    pub created_ts: i64,
}

const NAVIGATION_COLUMNS: &[Column] = &[
    ("id", ColumnType::Integer),
    ("frame_id", ColumnType::Integer),
    ("document_navigation_id", ColumnType::Integer),
    ("url", ColumnType::Text),
    ("start_command_id", ColumnType::Integer),
    ("navigation_reason", ColumnType::Text),
    ("loader_id", ColumnType::Text),
    ("initiated_ts", ColumnType::Integer),
    ("http_requested_ts", ColumnType::Integer),
    ("http_responded_ts", ColumnType::Integer),
    ("http_redirected_ts", ColumnType::Integer),
    ("dom_loaded_ts", ColumnType::Integer),
    ("load_ts", ColumnType::Integer),
    ("content_painted_ts", ColumnType::Integer),
    ("final_url", ColumnType::Text),
];

/// Per-frame navigation lifecycle. Milestone timestamps are appended as they
/// are observed; a navigation that never completes simply leaves its later
/// columns NULL.
pub struct FrameNavigationsTable {
    base: BaseTable,
}

/// Milestone timestamps of one navigation, bundled so inserts stay readable.
#[derive(Debug, Clone, Default)]
pub struct NavigationTimings {
    pub initiated_at: Option<DateTime<Utc>>,
    pub http_requested_at: Option<DateTime<Utc>>,
    pub http_responded_at: Option<DateTime<Utc>>,
    pub http_redirected_at: Option<DateTime<Utc>>,
    pub dom_loaded_at: Option<DateTime<Utc>>,
    pub load_at: Option<DateTime<Utc>>,
    pub content_painted_at: Option<DateTime<Utc>>,
}

impl FrameNavigationsTable {
    pub(crate) fn new(conn: SharedConnection) -> Arc<Self> {
        Arc::new(Self {
            base: BaseTable::new(conn, "frame_navigations", NAVIGATION_COLUMNS),
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn insert(
        &self,
        id: i64,
        frame_id: i64,
        document_navigation_id: i64,
        url: &str,
        start_command_id: i64,
        navigation_reason: Option<&str>,
        loader_id: Option<&str>,
        timings: &NavigationTimings,
        final_url: Option<&str>,
    ) -> usize {
        self.base.queue_insert(vec![
            Value::Integer(id),
            Value::Integer(frame_id),
            Value::Integer(document_navigation_id),
            Value::Text(url.to_string()),
            Value::Integer(start_command_id),
            opt(navigation_reason.map(str::to_string)),
            opt(loader_id.map(str::to_string)),
            opt_millis(&timings.initiated_at),
            opt_millis(&timings.http_requested_at),
            opt_millis(&timings.http_responded_at),
            opt_millis(&timings.http_redirected_at),
            opt_millis(&timings.dom_loaded_at),
            opt_millis(&timings.load_at),
            opt_millis(&timings.content_painted_at),
            opt(final_url.map(str::to_string)),
        ])
    }

    pub fn all(&self) -> Result<Vec<FrameNavigationRecord>> {
        self.select("SELECT id, frame_id, document_navigation_id, url, navigation_reason, \
             initiated_ts, dom_loaded_ts, load_ts, final_url \
             FROM frame_navigations ORDER BY rowid ASC", [])
    }

    pub fn all_for_frame(&self, frame_id: i64) -> Result<Vec<FrameNavigationRecord>> {
        self.select(
            "SELECT id, frame_id, document_navigation_id, url, navigation_reason, \
             initiated_ts, dom_loaded_ts, load_ts, final_url \
             FROM frame_navigations WHERE frame_id = ?1 ORDER BY rowid ASC",
            [frame_id],
        )
    }

    fn select<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<FrameNavigationRecord>> {
        let guard = self.base.lock_conn();
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let mut stmt = conn.prepare(sql)?;
        let records = stmt
            .query_map(params, |row| {
                Ok(FrameNavigationRecord {
                    id: row.get(0)?,
                    frame_id: row.get(1)?,
                    document_navigation_id: row.get(2)?,
                    url: row.get(3)?,
                    navigation_reason: row.get(4)?,
                    initiated_ts: row.get(5)?,
                    dom_loaded_ts: row.get(6)?,
                    load_ts: row.get(7)?,
                    final_url: row.get(8)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(records)
    }
}

impl RecordTable for FrameNavigationsTable {
    fn base(&self) -> &BaseTable {
        &self.base
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct FrameNavigationRecord {
    pub id: i64,
    pub frame_id: i64,
    pub document_navigation_id: i64,
    pub url: String,
    pub navigation_reason: Option<String>,
    pub initiated_ts: Option<i64>,
    pub dom_loaded_ts: Option<i64>,
    pub load_ts: Option<i64>,
    pub final_url: Option<String>,
}
