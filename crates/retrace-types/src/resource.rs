use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Classification of a loaded network resource, stored as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Document,
    Redirect,
    Websocket,
    Script,
    Stylesheet,
    Xhr,
    Fetch,
    Image,
    Media,
    Font,
    Manifest,
    Other,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Document => "document",
            ResourceType::Redirect => "redirect",
            ResourceType::Websocket => "websocket",
            ResourceType::Script => "script",
            ResourceType::Stylesheet => "stylesheet",
            ResourceType::Xhr => "xhr",
            ResourceType::Fetch => "fetch",
            ResourceType::Image => "image",
            ResourceType::Media => "media",
            ResourceType::Font => "font",
            ResourceType::Manifest => "manifest",
            ResourceType::Other => "other",
        }
    }
}

/// Lifecycle checkpoints of a resource load.
///
/// Corrections are modeled as new facts: each checkpoint is appended to the
/// resource_states table with its own timestamp, never written back onto the
/// resource row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceState {
    BrowserRequested,
    DnsResolved,
    SocketConnected,
    RequestSent,
    ResponseHeaders,
    ResponseComplete,
    Errored,
}

impl ResourceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceState::BrowserRequested => "browser_requested",
            ResourceState::DnsResolved => "dns_resolved",
            ResourceState::SocketConnected => "socket_connected",
            ResourceState::RequestSent => "request_sent",
            ResourceState::ResponseHeaders => "response_headers",
            ResourceState::ResponseComplete => "response_complete",
            ResourceState::Errored => "errored",
        }
    }
}

/// A network resource as handed over by the interception layer once its
/// response has been captured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceEvent {
    pub id: i64,
    /// Request id assigned by the browser's devtools protocol, when known.
    pub devtools_request_id: Option<String>,
    pub tab_id: Option<i64>,
    pub frame_id: Option<i64>,
    pub socket_id: Option<i64>,
    pub resource_type: ResourceType,
    pub received_at: DateTime<Utc>,
    pub url: String,
    pub status_code: Option<i64>,
    pub request_method: String,
    pub request_headers: Option<Value>,
    pub response_headers: Option<Value>,
    pub response_data: Option<Vec<u8>>,
    pub is_http2: bool,
    /// When the browser itself finished loading the resource, if it did.
    pub browser_loaded_at: Option<DateTime<Utc>>,
    pub document_url: Option<String>,
}

/// Origin-storage kinds tracked by the storage observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    LocalStorage,
    SessionStorage,
    Cookie,
    IndexedDb,
}

impl StorageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageType::LocalStorage => "local_storage",
            StorageType::SessionStorage => "session_storage",
            StorageType::Cookie => "cookie",
            StorageType::IndexedDb => "indexed_db",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageChangeAction {
    Add,
    Update,
    Remove,
}

impl StorageChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageChangeAction::Add => "add",
            StorageChangeAction::Update => "update",
            StorageChangeAction::Remove => "remove",
        }
    }
}

/// One observed change to origin storage (localStorage, cookies, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageChange {
    pub tab_id: i64,
    pub security_origin: String,
    pub storage_type: StorageType,
    pub action: StorageChangeAction,
    pub key: String,
    pub value: Option<String>,
    /// Kind-specific details (cookie flags, indexed-db object store, ...).
    pub meta: Option<Value>,
    pub timestamp: DateTime<Utc>,
}
