use std::sync::Arc;

use retrace_types::{DomChangeAction, DomChangeEvent};
use rusqlite::types::Value;

use crate::error::{Error, Result};
use crate::table::{BaseTable, Column, ColumnType, RecordTable, SharedConnection};
use crate::table::{json, millis, opt};

const COLUMNS: &[Column] = &[
    ("frame_id", ColumnType::Integer),
    ("document_navigation_id", ColumnType::Integer),
    ("event_index", ColumnType::Integer),
    ("action", ColumnType::Integer),
    ("node_id", ColumnType::Integer),
    ("node_type", ColumnType::Integer),
    ("tag_name", ColumnType::Text),
    ("parent_node_id", ColumnType::Integer),
    ("previous_sibling_id", ColumnType::Integer),
    ("text_content", ColumnType::Text),
    ("attributes", ColumnType::Text),
    ("properties", ColumnType::Text),
    ("namespace_uri", ColumnType::Text),
    ("ts", ColumnType::Integer),
    ("command_id", ColumnType::Integer),
];

/// The DOM mutation stream - the highest-frequency table in the store.
/// Replay reconstructs every document from these rows alone, so ordering is
/// (document_navigation_id, event_index) per frame.
pub struct DomChangesTable {
    base: BaseTable,
}

impl DomChangesTable {
    pub(crate) fn new(conn: SharedConnection) -> Arc<Self> {
        Arc::new(Self {
            base: BaseTable::new(conn, "dom_changes", COLUMNS),
        })
    }

    pub fn insert(&self, change: &DomChangeEvent) -> usize {
        self.base.queue_insert(vec![
            Value::Integer(change.frame_id),
            Value::Integer(change.document_navigation_id),
            Value::Integer(change.event_index),
            Value::Integer(change.action.code()),
            Value::Integer(change.node_id),
            opt(change.node_type),
            opt(change.tag_name.clone()),
            opt(change.parent_node_id),
            opt(change.previous_sibling_id),
            opt(change.text_content.clone()),
            json(&change.attributes),
            json(&change.properties),
            opt(change.namespace_uri.clone()),
            millis(&change.timestamp),
            Value::Integer(change.command_id),
        ])
    }

    pub fn all(&self) -> Result<Vec<DomChangeRecord>> {
        self.select(
            "SELECT frame_id, document_navigation_id, event_index, action, node_id, tag_name, \
             text_content, attributes, ts, command_id \
             FROM dom_changes ORDER BY rowid ASC",
            [],
        )
    }

    pub fn all_for_navigation(&self, document_navigation_id: i64) -> Result<Vec<DomChangeRecord>> {
        self.select(
            "SELECT frame_id, document_navigation_id, event_index, action, node_id, tag_name, \
             text_content, attributes, ts, command_id \
             FROM dom_changes WHERE document_navigation_id = ?1 \
             ORDER BY frame_id ASC, event_index ASC",
            [document_navigation_id],
        )
    }

    fn select<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<DomChangeRecord>> {
        let guard = self.base.lock_conn();
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let mut stmt = conn.prepare(sql)?;
        let records = stmt
            .query_map(params, |row| {
                Ok(DomChangeRecord {
                    frame_id: row.get(0)?,
                    document_navigation_id: row.get(1)?,
                    event_index: row.get(2)?,
                    action: DomChangeAction::from_code(row.get(3)?),
                    node_id: row.get(4)?,
                    tag_name: row.get(5)?,
                    text_content: row.get(6)?,
                    attributes: crate::table::parse_json(row.get(7)?),
                    ts: row.get(8)?,
                    command_id: row.get(9)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(records)
    }
}

impl RecordTable for DomChangesTable {
    fn base(&self) -> &BaseTable {
        &self.base
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DomChangeRecord {
    pub frame_id: i64,
    pub document_navigation_id: i64,
    pub event_index: i64,
    /// None if the file carries an action code this build doesn't know.
    pub action: Option<DomChangeAction>,
    pub node_id: i64,
    pub tag_name: Option<String>,
    pub text_content: Option<String>,
    pub attributes: Option<serde_json::Value>,
    pub ts: i64,
    pub command_id: i64,
}
