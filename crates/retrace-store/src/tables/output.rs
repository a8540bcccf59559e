use std::sync::Arc;

use chrono::{DateTime, Utc};
use retrace_types::OutputChangeType;
use rusqlite::types::Value;

use crate::error::{Error, Result};
use crate::table::millis;
use crate::table::{BaseTable, Column, ColumnType, RecordTable, SharedConnection};

const COLUMNS: &[Column] = &[
    ("type", ColumnType::Text),
    ("path", ColumnType::Text),
    ("value", ColumnType::Text),
    ("ts", ColumnType::Integer),
    ("last_command_id", ColumnType::Integer),
];

/// Change journal of the session's extraction output document. Replaying the
/// rows in order rebuilds the final output object.
pub struct OutputTable {
    base: BaseTable,
}

impl OutputTable {
    pub(crate) fn new(conn: SharedConnection) -> Arc<Self> {
        Arc::new(Self {
            base: BaseTable::new(conn, "output", COLUMNS),
        })
    }

    pub fn insert(
        &self,
        change_type: OutputChangeType,
        path: &str,
        value: &serde_json::Value,
        at: &DateTime<Utc>,
        last_command_id: i64,
    ) -> usize {
        self.base.queue_insert(vec![
            Value::Text(change_type.as_str().to_string()),
            Value::Text(path.to_string()),
            Value::Text(value.to_string()),
            millis(at),
            Value::Integer(last_command_id),
        ])
    }

    pub fn all(&self) -> Result<Vec<OutputRecord>> {
        let guard = self.base.lock_conn();
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let mut stmt = conn.prepare(
            "SELECT type, path, value, ts, last_command_id FROM output ORDER BY rowid ASC",
        )?;
        let records = stmt
            .query_map([], |row| {
                Ok(OutputRecord {
                    change_type: row.get(0)?,
                    path: row.get(1)?,
                    value: crate::table::parse_json(row.get(2)?),
                    ts: row.get(3)?,
                    last_command_id: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(records)
    }
}

impl RecordTable for OutputTable {
    fn base(&self) -> &BaseTable {
        &self.base
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct OutputRecord {
    pub change_type: String,
    pub path: String,
    pub value: Option<serde_json::Value>,
    pub ts: i64,
    pub last_command_id: i64,
}
