use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::types::Value;

use crate::error::{Error, Result};
use crate::table::{BaseTable, Column, ColumnType, RecordTable, SharedConnection};
use crate::table::{millis, opt};

const ELEMENT_COLUMNS: &[Column] = &[
    ("id", ColumnType::Integer),
    ("name", ColumnType::Text),
    ("tab_id", ColumnType::Integer),
    ("command_id", ColumnType::Integer),
    ("frame_navigation_id", ColumnType::Integer),
    ("node_pointer_id", ColumnType::Integer),
    ("node_type", ColumnType::Text),
    ("node_preview", ColumnType::Text),
    ("document_url", ColumnType::Text),
    ("outer_html", ColumnType::Text),
    ("ts", ColumnType::Integer),
];

/// DOM elements detached (snapshotted) by name for post-session extraction.
/// The same name may be recorded many times; readers group by name.
pub struct DetachedElementsTable {
    base: BaseTable,
}

impl DetachedElementsTable {
    pub(crate) fn new(conn: SharedConnection) -> Arc<Self> {
        Arc::new(Self {
            base: BaseTable::new(conn, "detached_elements", ELEMENT_COLUMNS),
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn insert(
        &self,
        id: i64,
        name: &str,
        tab_id: i64,
        command_id: i64,
        frame_navigation_id: i64,
        node_pointer_id: i64,
        node_type: &str,
        node_preview: Option<&str>,
        document_url: &str,
        outer_html: Option<&str>,
        at: &DateTime<Utc>,
    ) -> usize {
        self.base.queue_insert(vec![
            Value::Integer(id),
            Value::Text(name.to_string()),
            Value::Integer(tab_id),
            Value::Integer(command_id),
            Value::Integer(frame_navigation_id),
            Value::Integer(node_pointer_id),
            Value::Text(node_type.to_string()),
            opt(node_preview.map(str::to_string)),
            Value::Text(document_url.to_string()),
            opt(outer_html.map(str::to_string)),
            millis(at),
        ])
    }

    pub fn all(&self) -> Result<Vec<DetachedElementRecord>> {
        self.select(
            "SELECT id, name, tab_id, command_id, node_type, node_preview, document_url, \
             outer_html, ts FROM detached_elements ORDER BY rowid ASC",
            [],
        )
    }

    pub fn all_with_name(&self, name: &str) -> Result<Vec<DetachedElementRecord>> {
        self.select(
            "SELECT id, name, tab_id, command_id, node_type, node_preview, document_url, \
             outer_html, ts FROM detached_elements WHERE name = ?1 ORDER BY rowid ASC",
            [name],
        )
    }

    /// Distinct names ever recorded, in first-recorded order.
    pub fn all_names(&self) -> Result<Vec<String>> {
        let guard = self.base.lock_conn();
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let mut stmt =
            conn.prepare("SELECT name FROM detached_elements GROUP BY name ORDER BY MIN(rowid)")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, rusqlite::Error>>()?;
        Ok(names)
    }

    fn select<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<DetachedElementRecord>> {
        let guard = self.base.lock_conn();
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let mut stmt = conn.prepare(sql)?;
        let records = stmt
            .query_map(params, |row| {
                Ok(DetachedElementRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    tab_id: row.get(2)?,
                    command_id: row.get(3)?,
                    node_type: row.get(4)?,
                    node_preview: row.get(5)?,
                    document_url: row.get(6)?,
                    outer_html: row.get(7)?,
                    ts: row.get(8)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(records)
    }
}

impl RecordTable for DetachedElementsTable {
    fn base(&self) -> &BaseTable {
        &self.base
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DetachedElementRecord {
    pub id: i64,
    pub name: String,
    pub tab_id: i64,
    pub command_id: i64,
    pub node_type: String,
    pub node_preview: Option<String>,
    pub document_url: String,
    pub outer_html: Option<String>,
    pub ts: i64,
}

const RESOURCE_COLUMNS: &[Column] = &[
    ("name", ColumnType::Text),
    ("resource_id", ColumnType::Integer),
    ("command_id", ColumnType::Integer),
    ("tab_id", ColumnType::Integer),
    ("ts", ColumnType::Integer),
];

/// Name -> resource bookmarks captured for extraction; the rows reference
/// the resources table for the payload itself.
pub struct DetachedResourcesTable {
    base: BaseTable,
}

impl DetachedResourcesTable {
    pub(crate) fn new(conn: SharedConnection) -> Arc<Self> {
        Arc::new(Self {
            base: BaseTable::new(conn, "detached_resources", RESOURCE_COLUMNS),
        })
    }

    pub fn insert(
        &self,
        name: &str,
        resource_id: i64,
        command_id: i64,
        tab_id: i64,
        at: &DateTime<Utc>,
    ) -> usize {
        self.base.queue_insert(vec![
            Value::Text(name.to_string()),
            Value::Integer(resource_id),
            Value::Integer(command_id),
            Value::Integer(tab_id),
            millis(at),
        ])
    }

    pub fn all(&self) -> Result<Vec<DetachedResourceRecord>> {
        self.select(
            "SELECT name, resource_id, command_id, tab_id, ts FROM detached_resources \
             ORDER BY rowid ASC",
            [],
        )
    }

    pub fn all_with_name(&self, name: &str) -> Result<Vec<DetachedResourceRecord>> {
        self.select(
            "SELECT name, resource_id, command_id, tab_id, ts FROM detached_resources \
             WHERE name = ?1 ORDER BY rowid ASC",
            [name],
        )
    }

    fn select<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<DetachedResourceRecord>> {
        let guard = self.base.lock_conn();
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let mut stmt = conn.prepare(sql)?;
        let records = stmt
            .query_map(params, |row| {
                Ok(DetachedResourceRecord {
                    name: row.get(0)?,
                    resource_id: row.get(1)?,
                    command_id: row.get(2)?,
                    tab_id: row.get(3)?,
                    ts: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(records)
    }
}

impl RecordTable for DetachedResourcesTable {
    fn base(&self) -> &BaseTable {
        &self.base
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DetachedResourceRecord {
    pub name: String,
    pub resource_id: i64,
    pub command_id: i64,
    pub tab_id: i64,
    pub ts: i64,
}
