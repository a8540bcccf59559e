use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::types::Value;

use crate::error::{Error, Result};
use crate::table::{BaseTable, Column, ColumnType, RecordTable, SharedConnection};
use crate::table::{millis, opt};

const HANDLER_COLUMNS: &[Column] = &[
    ("id", ColumnType::Integer),
    ("name", ColumnType::Text),
    ("callsite", ColumnType::Text),
    ("created_ts", ColumnType::Integer),
];

/// Flow handlers registered by the script to recover from unexpected page
/// states.
pub struct FlowHandlersTable {
    base: BaseTable,
}

impl FlowHandlersTable {
    pub(crate) fn new(conn: SharedConnection) -> Arc<Self> {
        Arc::new(Self {
            base: BaseTable::new(conn, "flow_handlers", HANDLER_COLUMNS),
        })
    }

    pub fn insert(
        &self,
        id: i64,
        name: Option<&str>,
        callsite: Option<&str>,
        created_at: &DateTime<Utc>,
    ) -> usize {
        self.base.queue_insert(vec![
            Value::Integer(id),
            opt(name.map(str::to_string)),
            opt(callsite.map(str::to_string)),
            millis(created_at),
        ])
    }

    pub fn all(&self) -> Result<Vec<FlowHandlerRecord>> {
        let guard = self.base.lock_conn();
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let mut stmt = conn
            .prepare("SELECT id, name, callsite, created_ts FROM flow_handlers ORDER BY rowid ASC")?;
        let records = stmt
            .query_map([], |row| {
                Ok(FlowHandlerRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    callsite: row.get(2)?,
                    created_ts: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(records)
    }
}

impl RecordTable for FlowHandlersTable {
    fn base(&self) -> &BaseTable {
        &self.base
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct FlowHandlerRecord {
    pub id: i64,
    pub name: Option<String>,
    pub callsite: Option<String>,
    pub created_ts: i64,
}

const COMMAND_COLUMNS: &[Column] = &[
    ("id", ColumnType::Integer),
    ("parent_id", ColumnType::Integer),
    ("callsite", ColumnType::Text),
    ("created_ts", ColumnType::Integer),
];

/// Flow command blocks; commands re-issued inside one reference it through
/// commands.flow_command_id.
pub struct FlowCommandsTable {
    base: BaseTable,
}

impl FlowCommandsTable {
    pub(crate) fn new(conn: SharedConnection) -> Arc<Self> {
        Arc::new(Self {
            base: BaseTable::new(conn, "flow_commands", COMMAND_COLUMNS),
        })
    }

    pub fn insert(
        &self,
        id: i64,
        parent_id: Option<i64>,
        callsite: Option<&str>,
        created_at: &DateTime<Utc>,
    ) -> usize {
        self.base.queue_insert(vec![
            Value::Integer(id),
            opt(parent_id),
            opt(callsite.map(str::to_string)),
            millis(created_at),
        ])
    }

    pub fn all(&self) -> Result<Vec<FlowCommandRecord>> {
        let guard = self.base.lock_conn();
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let mut stmt = conn
            .prepare("SELECT id, parent_id, callsite, created_ts FROM flow_commands ORDER BY rowid ASC")?;
        let records = stmt
            .query_map([], |row| {
                Ok(FlowCommandRecord {
                    id: row.get(0)?,
                    parent_id: row.get(1)?,
                    callsite: row.get(2)?,
                    created_ts: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(records)
    }
}

impl RecordTable for FlowCommandsTable {
    fn base(&self) -> &BaseTable {
        &self.base
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct FlowCommandRecord {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub callsite: Option<String>,
    pub created_ts: i64,
}
