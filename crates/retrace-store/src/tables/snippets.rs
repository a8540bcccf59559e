use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::types::Value;

use crate::error::{Error, Result};
use crate::table::millis;
use crate::table::{BaseTable, Column, ColumnType, RecordTable, SharedConnection};

const COLUMNS: &[Column] = &[
    ("name", ColumnType::Text),
    ("value", ColumnType::Text),
    ("ts", ColumnType::Integer),
    ("command_id", ColumnType::Integer),
];

/// Named JSON values stashed by the automation script (`setData`-style) for
/// later extraction.
pub struct SnippetsTable {
    base: BaseTable,
}

impl SnippetsTable {
    pub(crate) fn new(conn: SharedConnection) -> Arc<Self> {
        Arc::new(Self {
            base: BaseTable::new(conn, "snippets", COLUMNS),
        })
    }

    pub fn insert(
        &self,
        name: &str,
        value: &serde_json::Value,
        at: &DateTime<Utc>,
        command_id: i64,
    ) -> usize {
        self.base.queue_insert(vec![
            Value::Text(name.to_string()),
            Value::Text(value.to_string()),
            millis(at),
            Value::Integer(command_id),
        ])
    }

    pub fn all(&self) -> Result<Vec<SnippetRecord>> {
        self.select("SELECT name, value, ts, command_id FROM snippets ORDER BY rowid ASC", [])
    }

    pub fn all_with_name(&self, name: &str) -> Result<Vec<SnippetRecord>> {
        self.select(
            "SELECT name, value, ts, command_id FROM snippets WHERE name = ?1 ORDER BY rowid ASC",
            [name],
        )
    }

    fn select<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<SnippetRecord>> {
        let guard = self.base.lock_conn();
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let mut stmt = conn.prepare(sql)?;
        let records = stmt
            .query_map(params, |row| {
                Ok(SnippetRecord {
                    name: row.get(0)?,
                    value: crate::table::parse_json(row.get(1)?),
                    ts: row.get(2)?,
                    command_id: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(records)
    }
}

impl RecordTable for SnippetsTable {
    fn base(&self) -> &BaseTable {
        &self.base
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SnippetRecord {
    pub name: String,
    pub value: Option<serde_json::Value>,
    pub ts: i64,
    pub command_id: i64,
}
