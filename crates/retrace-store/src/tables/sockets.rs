use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::types::Value;

use crate::error::{Error, Result};
use crate::table::{BaseTable, Column, ColumnType, RecordTable, SharedConnection};
use crate::table::{millis, opt, opt_millis};

const COLUMNS: &[Column] = &[
    ("id", ColumnType::Integer),
    ("alpn", ColumnType::Text),
    ("server_name", ColumnType::Text),
    ("local_address", ColumnType::Text),
    ("remote_address", ColumnType::Text),
    ("dns_resolved_ip", ColumnType::Text),
    ("created_ts", ColumnType::Integer),
    ("connect_ts", ColumnType::Integer),
    ("close_ts", ColumnType::Integer),
    ("connect_error", ColumnType::Text),
];

/// TCP/TLS sockets opened by the interception layer on behalf of the
/// session.
pub struct SocketsTable {
    base: BaseTable,
}

impl SocketsTable {
    pub(crate) fn new(conn: SharedConnection) -> Arc<Self> {
        Arc::new(Self {
            base: BaseTable::new(conn, "sockets", COLUMNS),
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn insert(
        &self,
        id: i64,
        alpn: Option<&str>,
        server_name: Option<&str>,
        local_address: &str,
        remote_address: &str,
        dns_resolved_ip: Option<&str>,
        created_at: &DateTime<Utc>,
        connect_at: Option<DateTime<Utc>>,
        close_at: Option<DateTime<Utc>>,
        connect_error: Option<&str>,
    ) -> usize {
        self.base.queue_insert(vec![
            Value::Integer(id),
            opt(alpn.map(str::to_string)),
            opt(server_name.map(str::to_string)),
            Value::Text(local_address.to_string()),
            Value::Text(remote_address.to_string()),
            opt(dns_resolved_ip.map(str::to_string)),
            millis(created_at),
            opt_millis(&connect_at),
            opt_millis(&close_at),
            opt(connect_error.map(str::to_string)),
        ])
    }

    pub fn all(&self) -> Result<Vec<SocketRecord>> {
        let guard = self.base.lock_conn();
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let mut stmt = conn.prepare(
            "SELECT id, alpn, server_name, remote_address, connect_ts, close_ts, connect_error \
             FROM sockets ORDER BY rowid ASC",
        )?;
        let records = stmt
            .query_map([], |row| {
                Ok(SocketRecord {
                    id: row.get(0)?,
                    alpn: row.get(1)?,
                    server_name: row.get(2)?,
                    remote_address: row.get(3)?,
                    connect_ts: row.get(4)?,
                    close_ts: row.get(5)?,
                    connect_error: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(records)
    }
}

impl RecordTable for SocketsTable {
    fn base(&self) -> &BaseTable {
        &self.base
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SocketRecord {
    pub id: i64,
    pub alpn: Option<String>,
    pub server_name: Option<String>,
    pub remote_address: String,
    pub connect_ts: Option<i64>,
    pub close_ts: Option<i64>,
    pub connect_error: Option<String>,
}
