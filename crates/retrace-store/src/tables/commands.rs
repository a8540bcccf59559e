use std::sync::Arc;

use retrace_types::CommandMeta;
use rusqlite::types::Value;

use crate::error::{Error, Result};
use crate::table::{BaseTable, Column, ColumnType, RecordTable, SharedConnection};
use crate::table::{flag, json, opt, opt_millis};

const COLUMNS: &[Column] = &[
    ("id", ColumnType::Integer),
    ("retry_number", ColumnType::Integer),
    ("tab_id", ColumnType::Integer),
    ("frame_id", ColumnType::Integer),
    ("flow_command_id", ColumnType::Integer),
    ("active_flow_handler_id", ColumnType::Integer),
    ("name", ColumnType::Text),
    ("was_prevented", ColumnType::Integer),
    ("args", ColumnType::Text),
    ("client_start_ts", ColumnType::Integer),
    ("client_send_ts", ColumnType::Integer),
    ("run_start_ts", ColumnType::Integer),
    ("end_ts", ColumnType::Integer),
    ("result", ColumnType::Text),
    ("result_type", ColumnType::Text),
    ("callsite", ColumnType::Text),
];

/// Every automation command issued against the session, with its lifecycle
/// timestamps and (serialized) result. The replay timeline is rebuilt from
/// this table.
pub struct CommandsTable {
    base: BaseTable,
}

impl CommandsTable {
    pub(crate) fn new(conn: SharedConnection) -> Arc<Self> {
        Arc::new(Self {
            base: BaseTable::new(conn, "commands", COLUMNS),
        })
    }

    pub fn insert(&self, command: &CommandMeta) -> usize {
        self.base.queue_insert(vec![
            Value::Integer(command.id),
            Value::Integer(command.retry_number),
            opt(command.tab_id),
            opt(command.frame_id),
            opt(command.flow_command_id),
            opt(command.active_flow_handler_id),
            Value::Text(command.name.clone()),
            flag(command.was_prevented),
            json(&command.args),
            opt_millis(&command.client_start_at),
            opt_millis(&command.client_send_at),
            opt_millis(&command.run_start_at),
            opt_millis(&command.end_at),
            json(&command.result),
            opt(command.result_type.clone()),
            opt(command.callsite.clone()),
        ])
    }

    pub fn all(&self) -> Result<Vec<CommandRecord>> {
        let guard = self.base.lock_conn();
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let mut stmt = conn.prepare(
            "SELECT id, retry_number, tab_id, frame_id, name, was_prevented, args, \
             run_start_ts, end_ts, result, result_type \
             FROM commands ORDER BY rowid ASC",
        )?;
        let records = stmt
            .query_map([], |row| {
                Ok(CommandRecord {
                    id: row.get(0)?,
                    retry_number: row.get(1)?,
                    tab_id: row.get(2)?,
                    frame_id: row.get(3)?,
                    name: row.get(4)?,
                    was_prevented: row.get::<_, i64>(5)? != 0,
                    args: crate::table::parse_json(row.get(6)?),
                    run_start_ts: row.get(7)?,
                    end_ts: row.get(8)?,
                    result: crate::table::parse_json(row.get(9)?),
                    result_type: row.get(10)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(records)
    }

    /// Last committed command, by issue order.
    pub fn last(&self) -> Result<Option<CommandRecord>> {
        Ok(self.all()?.pop())
    }
}

impl RecordTable for CommandsTable {
    fn base(&self) -> &BaseTable {
        &self.base
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CommandRecord {
    pub id: i64,
    pub retry_number: i64,
    pub tab_id: Option<i64>,
    pub frame_id: Option<i64>,
    pub name: String,
    pub was_prevented: bool,
    pub args: Option<serde_json::Value>,
    pub run_start_ts: Option<i64>,
    pub end_ts: Option<i64>,
    pub result: Option<serde_json::Value>,
    pub result_type: Option<String>,
}
