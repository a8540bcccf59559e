use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Severity of a session log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Stats,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Stats => "stats",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Structured payload attached to a log entry.
///
/// Error values don't survive JSON serialization as-is (they collapse to an
/// opaque placeholder), so they are captured as a flattened message/stack
/// record at the boundary instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogData {
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        stack: Option<String>,
    },
    Value(Value),
}

impl LogData {
    /// Capture an error as a flat structured value: its display message plus
    /// the source chain as a pseudo-stack, one cause per line.
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let message = err.to_string();
        let mut frames = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            frames.push(format!("caused by: {}", cause));
            source = cause.source();
        }
        let stack = if frames.is_empty() {
            None
        } else {
            Some(frames.join("\n"))
        };
        LogData::Error { message, stack }
    }

    /// The JSON form that gets persisted.
    pub fn to_json(&self) -> Value {
        match self {
            LogData::Value(value) => value.clone(),
            LogData::Error { message, stack } => json!({
                "message": message,
                "stack": stack,
            }),
        }
    }
}

impl From<Value> for LogData {
    fn from(value: Value) -> Self {
        LogData::Value(value)
    }
}

/// One diagnostic entry emitted by the automation engine or the store itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Monotonic entry id assigned by the log subsystem.
    pub id: i64,
    /// When the entry was recorded.
    pub timestamp: DateTime<Utc>,
    /// Short machine-readable action name (e.g. "Tab.navigate").
    pub action: String,
    pub level: LogLevel,
    /// Session this entry belongs to; None marks a process-global entry.
    pub session_id: Option<String>,
    /// Parent entry id for nested operations.
    pub parent_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<LogData>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Inner;

    impl std::fmt::Display for Inner {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "connection reset")
        }
    }

    impl std::error::Error for Inner {}

    #[derive(Debug)]
    struct Outer(Inner);

    impl std::fmt::Display for Outer {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "navigation failed")
        }
    }

    impl std::error::Error for Outer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_error_flattens_to_message_and_stack() {
        let data = LogData::from_error(&Outer(Inner));
        let json = data.to_json();

        assert_eq!(json["message"], "navigation failed");
        assert_eq!(json["stack"], "caused by: connection reset");
    }

    #[test]
    fn test_error_without_source_has_no_stack() {
        let data = LogData::from_error(&Inner);
        match data {
            LogData::Error { stack, .. } => assert!(stack.is_none()),
            LogData::Value(_) => panic!("expected error variant"),
        }
    }
}
