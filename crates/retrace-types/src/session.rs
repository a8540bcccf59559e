use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata describing one automation session, written once when the session
/// starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMeta {
    /// Stable external session id; also the database file's base name.
    pub id: String,
    pub start_at: DateTime<Utc>,
    pub user_agent_string: Option<String>,
    pub viewport_width: Option<i64>,
    pub viewport_height: Option<i64>,
    pub timezone_id: Option<String>,
    pub locale: Option<String>,
    /// The full creation options blob, for faithful replay setup.
    pub create_options: Option<Value>,
}
