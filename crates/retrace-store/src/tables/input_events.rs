use std::sync::Arc;

use retrace_types::{FocusEvent, MouseEvent, ScrollEvent};
use rusqlite::types::Value;

use crate::error::{Error, Result};
use crate::table::{BaseTable, Column, ColumnType, RecordTable, SharedConnection};
use crate::table::{millis, opt};

// Page input streams: mouse, focus, scroll. Recorded by the injected page
// observer, replayed to reconstruct user-visible interaction.

const MOUSE_COLUMNS: &[Column] = &[
    ("tab_id", ColumnType::Integer),
    ("frame_id", ColumnType::Integer),
    ("event_type", ColumnType::Integer),
    ("page_x", ColumnType::Integer),
    ("page_y", ColumnType::Integer),
    ("buttons", ColumnType::Integer),
    ("target_node_id", ColumnType::Integer),
    ("related_target_node_id", ColumnType::Integer),
    ("ts", ColumnType::Integer),
];

pub struct MouseEventsTable {
    base: BaseTable,
}

impl MouseEventsTable {
    pub(crate) fn new(conn: SharedConnection) -> Arc<Self> {
        Arc::new(Self {
            base: BaseTable::new(conn, "mouse_events", MOUSE_COLUMNS),
        })
    }

    pub fn insert(&self, event: &MouseEvent) -> usize {
        self.base.queue_insert(vec![
            Value::Integer(event.tab_id),
            Value::Integer(event.frame_id),
            Value::Integer(event.event_type.code()),
            Value::Integer(event.page_x),
            Value::Integer(event.page_y),
            Value::Integer(event.buttons),
            opt(event.target_node_id),
            opt(event.related_target_node_id),
            millis(&event.timestamp),
        ])
    }

    pub fn all(&self) -> Result<Vec<MouseEventRecord>> {
        let guard = self.base.lock_conn();
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let mut stmt = conn.prepare(
            "SELECT tab_id, frame_id, event_type, page_x, page_y, buttons, target_node_id, ts \
             FROM mouse_events ORDER BY rowid ASC",
        )?;
        let records = stmt
            .query_map([], |row| {
                Ok(MouseEventRecord {
                    tab_id: row.get(0)?,
                    frame_id: row.get(1)?,
                    event_type: row.get(2)?,
                    page_x: row.get(3)?,
                    page_y: row.get(4)?,
                    buttons: row.get(5)?,
                    target_node_id: row.get(6)?,
                    ts: row.get(7)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(records)
    }
}

impl RecordTable for MouseEventsTable {
    fn base(&self) -> &BaseTable {
        &self.base
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MouseEventRecord {
    pub tab_id: i64,
    pub frame_id: i64,
    pub event_type: i64,
    pub page_x: i64,
    pub page_y: i64,
    pub buttons: i64,
    pub target_node_id: Option<i64>,
    pub ts: i64,
}

const FOCUS_COLUMNS: &[Column] = &[
    ("tab_id", ColumnType::Integer),
    ("frame_id", ColumnType::Integer),
    ("event_type", ColumnType::Integer),
    ("target_node_id", ColumnType::Integer),
    ("related_target_node_id", ColumnType::Integer),
    ("ts", ColumnType::Integer),
];

pub struct FocusEventsTable {
    base: BaseTable,
}

impl FocusEventsTable {
    pub(crate) fn new(conn: SharedConnection) -> Arc<Self> {
        Arc::new(Self {
            base: BaseTable::new(conn, "focus_events", FOCUS_COLUMNS),
        })
    }

    pub fn insert(&self, event: &FocusEvent) -> usize {
        self.base.queue_insert(vec![
            Value::Integer(event.tab_id),
            Value::Integer(event.frame_id),
            Value::Integer(event.event_type.code()),
            opt(event.target_node_id),
            opt(event.related_target_node_id),
            millis(&event.timestamp),
        ])
    }

    pub fn all(&self) -> Result<Vec<FocusEventRecord>> {
        let guard = self.base.lock_conn();
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let mut stmt = conn.prepare(
            "SELECT tab_id, frame_id, event_type, target_node_id, ts FROM focus_events \
             ORDER BY rowid ASC",
        )?;
        let records = stmt
            .query_map([], |row| {
                Ok(FocusEventRecord {
                    tab_id: row.get(0)?,
                    frame_id: row.get(1)?,
                    event_type: row.get(2)?,
                    target_node_id: row.get(3)?,
                    ts: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(records)
    }
}

impl RecordTable for FocusEventsTable {
    fn base(&self) -> &BaseTable {
        &self.base
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct FocusEventRecord {
    pub tab_id: i64,
    pub frame_id: i64,
    pub event_type: i64,
    pub target_node_id: Option<i64>,
    pub ts: i64,
}

const SCROLL_COLUMNS: &[Column] = &[
    ("tab_id", ColumnType::Integer),
    ("frame_id", ColumnType::Integer),
    ("scroll_x", ColumnType::Integer),
    ("scroll_y", ColumnType::Integer),
    ("ts", ColumnType::Integer),
];

pub struct ScrollEventsTable {
    base: BaseTable,
}

impl ScrollEventsTable {
    pub(crate) fn new(conn: SharedConnection) -> Arc<Self> {
        Arc::new(Self {
            base: BaseTable::new(conn, "scroll_events", SCROLL_COLUMNS),
        })
    }

    pub fn insert(&self, event: &ScrollEvent) -> usize {
        self.base.queue_insert(vec![
            Value::Integer(event.tab_id),
            Value::Integer(event.frame_id),
            Value::Integer(event.scroll_x),
            Value::Integer(event.scroll_y),
            millis(&event.timestamp),
        ])
    }

    pub fn all(&self) -> Result<Vec<ScrollEventRecord>> {
        let guard = self.base.lock_conn();
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let mut stmt = conn.prepare(
            "SELECT tab_id, frame_id, scroll_x, scroll_y, ts FROM scroll_events ORDER BY rowid ASC",
        )?;
        let records = stmt
            .query_map([], |row| {
                Ok(ScrollEventRecord {
                    tab_id: row.get(0)?,
                    frame_id: row.get(1)?,
                    scroll_x: row.get(2)?,
                    scroll_y: row.get(3)?,
                    ts: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(records)
    }
}

impl RecordTable for ScrollEventsTable {
    fn base(&self) -> &BaseTable {
        &self.base
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ScrollEventRecord {
    pub tab_id: i64,
    pub frame_id: i64,
    pub scroll_x: i64,
    pub scroll_y: i64,
    pub ts: i64,
}
