use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What happened to a DOM node.
///
/// Stored on disk as the integer discriminant, so variants must keep their
/// positions for file-level compatibility with existing session files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i64)]
pub enum DomChangeAction {
    NewDocument = 0,
    Location = 1,
    Added = 2,
    Removed = 3,
    Text = 4,
    Attribute = 5,
    Property = 6,
}

impl DomChangeAction {
    pub fn code(&self) -> i64 {
        *self as i64
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(DomChangeAction::NewDocument),
            1 => Some(DomChangeAction::Location),
            2 => Some(DomChangeAction::Added),
            3 => Some(DomChangeAction::Removed),
            4 => Some(DomChangeAction::Text),
            5 => Some(DomChangeAction::Attribute),
            6 => Some(DomChangeAction::Property),
            _ => None,
        }
    }
}

/// One observed DOM mutation, as handed over by the page observer.
///
/// `event_index` orders mutations that share a timestamp within one
/// document; replay depends on (document_navigation_id, event_index) being
/// monotonic per frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomChangeEvent {
    pub frame_id: i64,
    pub document_navigation_id: i64,
    pub event_index: i64,
    pub action: DomChangeAction,
    pub node_id: i64,
    pub node_type: Option<i64>,
    pub tag_name: Option<String>,
    pub parent_node_id: Option<i64>,
    pub previous_sibling_id: Option<i64>,
    pub text_content: Option<String>,
    /// Changed attributes as a name -> value object.
    pub attributes: Option<Value>,
    /// Changed JS properties as a name -> value object.
    pub properties: Option<Value>,
    pub namespace_uri: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Command during which this mutation was observed.
    pub command_id: i64,
}
