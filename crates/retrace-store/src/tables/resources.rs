use std::sync::Arc;

use chrono::{DateTime, Utc};
use retrace_types::{ResourceEvent, ResourceState};
use rusqlite::types::Value;

use crate::error::{Error, Result};
use crate::table::{BaseTable, Column, ColumnType, RecordTable, SharedConnection};
use crate::table::{flag, json, millis, opt, opt_millis};

const RESOURCE_COLUMNS: &[Column] = &[
    ("id", ColumnType::Integer),
    ("devtools_request_id", ColumnType::Text),
    ("tab_id", ColumnType::Integer),
    ("frame_id", ColumnType::Integer),
    ("socket_id", ColumnType::Integer),
    ("type", ColumnType::Text),
    ("received_ts", ColumnType::Integer),
    ("url", ColumnType::Text),
    ("status_code", ColumnType::Integer),
    ("request_method", ColumnType::Text),
    ("request_headers", ColumnType::Text),
    ("response_headers", ColumnType::Text),
    ("response_data", ColumnType::Blob),
    ("is_http2", ColumnType::Integer),
    ("browser_loaded_ts", ColumnType::Integer),
    ("document_url", ColumnType::Text),
];

/// Network resources captured for the session, response bodies included.
/// The heaviest table by volume; response bodies go in as raw blobs and are
/// only materialized by the targeted queries below.
pub struct ResourcesTable {
    base: BaseTable,
}

impl ResourcesTable {
    pub(crate) fn new(conn: SharedConnection) -> Arc<Self> {
        Arc::new(Self {
            base: BaseTable::new(conn, "resources", RESOURCE_COLUMNS),
        })
    }

    pub fn insert(&self, resource: &ResourceEvent) -> usize {
        self.base.queue_insert(vec![
            Value::Integer(resource.id),
            opt(resource.devtools_request_id.clone()),
            opt(resource.tab_id),
            opt(resource.frame_id),
            opt(resource.socket_id),
            Value::Text(resource.resource_type.as_str().to_string()),
            millis(&resource.received_at),
            Value::Text(resource.url.clone()),
            opt(resource.status_code),
            Value::Text(resource.request_method.clone()),
            json(&resource.request_headers),
            json(&resource.response_headers),
            opt(resource.response_data.clone()),
            flag(resource.is_http2),
            opt_millis(&resource.browser_loaded_at),
            opt(resource.document_url.clone()),
        ])
    }

    /// Metadata of every committed resource, bodies excluded.
    pub fn all_meta(&self) -> Result<Vec<ResourceMetaRecord>> {
        let guard = self.base.lock_conn();
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let mut stmt = conn.prepare(
            "SELECT id, tab_id, frame_id, type, received_ts, url, status_code, request_method \
             FROM resources ORDER BY rowid ASC",
        )?;
        let records = stmt
            .query_map([], |row| {
                Ok(ResourceMetaRecord {
                    id: row.get(0)?,
                    tab_id: row.get(1)?,
                    frame_id: row.get(2)?,
                    resource_type: row.get(3)?,
                    received_ts: row.get(4)?,
                    url: row.get(5)?,
                    status_code: row.get(6)?,
                    request_method: row.get(7)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(records)
    }

    /// Latest committed response body for a url, if one was captured.
    pub fn response_by_url(&self, url: &str) -> Result<Option<Vec<u8>>> {
        let guard = self.base.lock_conn();
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let mut stmt = conn.prepare(
            "SELECT response_data FROM resources WHERE url = ?1 \
             ORDER BY received_ts DESC LIMIT 1",
        )?;
        let mut rows = stmt.query([url])?;
        match rows.next()? {
            Some(row) => Ok(row.get(0)?),
            None => Ok(None),
        }
    }
}

impl RecordTable for ResourcesTable {
    fn base(&self) -> &BaseTable {
        &self.base
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ResourceMetaRecord {
    pub id: i64,
    pub tab_id: Option<i64>,
    pub frame_id: Option<i64>,
    pub resource_type: String,
    pub received_ts: i64,
    pub url: String,
    pub status_code: Option<i64>,
    pub request_method: String,
}

const STATE_COLUMNS: &[Column] = &[
    ("resource_id", ColumnType::Integer),
    ("state", ColumnType::Text),
    ("ts", ColumnType::Integer),
];

/// Lifecycle checkpoints per resource. Corrections are new facts here, not
/// updates to the resources row.
pub struct ResourceStatesTable {
    base: BaseTable,
}

impl ResourceStatesTable {
    pub(crate) fn new(conn: SharedConnection) -> Arc<Self> {
        Arc::new(Self {
            base: BaseTable::new(conn, "resource_states", STATE_COLUMNS),
        })
    }

    pub fn insert(&self, resource_id: i64, state: ResourceState, at: &DateTime<Utc>) -> usize {
        self.base.queue_insert(vec![
            Value::Integer(resource_id),
            Value::Text(state.as_str().to_string()),
            millis(at),
        ])
    }

    pub fn all_for_resource(&self, resource_id: i64) -> Result<Vec<ResourceStateRecord>> {
        let guard = self.base.lock_conn();
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let mut stmt = conn.prepare(
            "SELECT resource_id, state, ts FROM resource_states \
             WHERE resource_id = ?1 ORDER BY rowid ASC",
        )?;
        let records = stmt
            .query_map([resource_id], |row| {
                Ok(ResourceStateRecord {
                    resource_id: row.get(0)?,
                    state: row.get(1)?,
                    ts: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(records)
    }
}

impl RecordTable for ResourceStatesTable {
    fn base(&self) -> &BaseTable {
        &self.base
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ResourceStateRecord {
    pub resource_id: i64,
    pub state: String,
    pub ts: i64,
}
