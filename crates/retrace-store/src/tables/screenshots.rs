use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::types::Value;

use crate::error::{Error, Result};
use crate::table::millis;
use crate::table::{BaseTable, Column, ColumnType, RecordTable, SharedConnection};

const COLUMNS: &[Column] = &[
    ("tab_id", ColumnType::Integer),
    ("ts", ColumnType::Integer),
    ("image", ColumnType::Blob),
];

/// Timestamped page captures. `landmarks` lets a replay UI scrub without
/// pulling every blob.
pub struct ScreenshotsTable {
    base: BaseTable,
}

impl ScreenshotsTable {
    pub(crate) fn new(conn: SharedConnection) -> Arc<Self> {
        Arc::new(Self {
            base: BaseTable::new(conn, "screenshots", COLUMNS),
        })
    }

    pub fn insert(&self, tab_id: i64, at: &DateTime<Utc>, image: Vec<u8>) -> usize {
        self.base.queue_insert(vec![
            Value::Integer(tab_id),
            millis(at),
            Value::Blob(image),
        ])
    }

    /// Capture timestamps for one tab, image data excluded.
    pub fn landmarks(&self, tab_id: i64) -> Result<Vec<i64>> {
        let guard = self.base.lock_conn();
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let mut stmt =
            conn.prepare("SELECT ts FROM screenshots WHERE tab_id = ?1 ORDER BY ts ASC")?;
        let timestamps = stmt
            .query_map([tab_id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<i64>, rusqlite::Error>>()?;
        Ok(timestamps)
    }

    pub fn image_at(&self, tab_id: i64, ts: i64) -> Result<Option<Vec<u8>>> {
        let guard = self.base.lock_conn();
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let mut stmt =
            conn.prepare("SELECT image FROM screenshots WHERE tab_id = ?1 AND ts = ?2 LIMIT 1")?;
        let mut rows = stmt.query(rusqlite::params![tab_id, ts])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }
}

impl RecordTable for ScreenshotsTable {
    fn base(&self) -> &BaseTable {
        &self.base
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ScreenshotRecord {
    pub tab_id: i64,
    pub ts: i64,
    #[serde(skip_serializing)]
    pub image: Vec<u8>,
}
