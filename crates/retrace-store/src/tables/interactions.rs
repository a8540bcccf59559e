use std::sync::Arc;

use retrace_types::InteractionStep;
use rusqlite::types::Value;

use crate::error::{Error, Result};
use crate::table::{BaseTable, Column, ColumnType, RecordTable, SharedConnection};
use crate::table::{millis, opt};

const COLUMNS: &[Column] = &[
    ("command_id", ColumnType::Integer),
    ("step_index", ColumnType::Integer),
    ("type", ColumnType::Text),
    ("x", ColumnType::Integer),
    ("y", ColumnType::Integer),
    ("mouse_button", ColumnType::Text),
    ("key_codes", ColumnType::Text),
    ("duration_ms", ColumnType::Integer),
    ("ts", ColumnType::Integer),
];

/// Interaction steps as the human emulator actually performed them, one row
/// per resolved step.
pub struct InteractionStepsTable {
    base: BaseTable,
}

impl InteractionStepsTable {
    pub(crate) fn new(conn: SharedConnection) -> Arc<Self> {
        Arc::new(Self {
            base: BaseTable::new(conn, "interactions", COLUMNS),
        })
    }

    pub fn insert(&self, step: &InteractionStep) -> usize {
        let key_codes = step
            .key_codes
            .as_ref()
            .map(|codes| serde_json::Value::from(codes.clone()));
        self.base.queue_insert(vec![
            Value::Integer(step.command_id),
            Value::Integer(step.step_index),
            Value::Text(step.interaction_type.as_str().to_string()),
            opt(step.x),
            opt(step.y),
            opt(step.mouse_button.clone()),
            crate::table::json(&key_codes),
            opt(step.duration_ms),
            millis(&step.timestamp),
        ])
    }

    pub fn all_for_command(&self, command_id: i64) -> Result<Vec<InteractionStepRecord>> {
        let guard = self.base.lock_conn();
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let mut stmt = conn.prepare(
            "SELECT command_id, step_index, type, x, y, mouse_button, duration_ms, ts \
             FROM interactions WHERE command_id = ?1 ORDER BY step_index ASC",
        )?;
        let records = stmt
            .query_map([command_id], |row| {
                Ok(InteractionStepRecord {
                    command_id: row.get(0)?,
                    step_index: row.get(1)?,
                    interaction_type: row.get(2)?,
                    x: row.get(3)?,
                    y: row.get(4)?,
                    mouse_button: row.get(5)?,
                    duration_ms: row.get(6)?,
                    ts: row.get(7)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(records)
    }
}

impl RecordTable for InteractionStepsTable {
    fn base(&self) -> &BaseTable {
        &self.base
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct InteractionStepRecord {
    pub command_id: i64,
    pub step_index: i64,
    pub interaction_type: String,
    pub x: Option<i64>,
    pub y: Option<i64>,
    pub mouse_button: Option<String>,
    pub duration_ms: Option<i64>,
    pub ts: i64,
}
