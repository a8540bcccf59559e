use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata of one issued automation command, recorded when the command
/// completes (or fails).
///
/// The client/run/end timestamp split mirrors the command lifecycle: queued
/// in the caller process, sent over the wire, executed, finished.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandMeta {
    pub id: i64,
    /// Zero for the first attempt; incremented per retry of the same command.
    pub retry_number: i64,
    pub tab_id: Option<i64>,
    pub frame_id: Option<i64>,
    /// Flow command this command was re-issued under, if any.
    pub flow_command_id: Option<i64>,
    pub active_flow_handler_id: Option<i64>,
    pub name: String,
    /// True when a flow handler intercepted and suppressed the command.
    pub was_prevented: bool,
    pub args: Option<Value>,
    pub client_start_at: Option<DateTime<Utc>>,
    pub client_send_at: Option<DateTime<Utc>>,
    pub run_start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub result: Option<Value>,
    /// Runtime type name of the result, for replay-side decoding.
    pub result_type: Option<String>,
    pub callsite: Option<String>,
}

/// Kind of mutation applied to the session's extraction output document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputChangeType {
    Insert,
    Delete,
    Reorder,
}

impl OutputChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputChangeType::Insert => "insert",
            OutputChangeType::Delete => "delete",
            OutputChangeType::Reorder => "reorder",
        }
    }
}
