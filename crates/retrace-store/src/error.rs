use std::fmt;
use std::path::PathBuf;

/// Result type for retrace-store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the storage layer
#[derive(Debug)]
pub enum Error {
    /// Database operation failed
    Sqlite(rusqlite::Error),

    /// IO operation failed
    Io(std::io::Error),

    /// Read-only open requested with file_must_exist against a missing file
    NotFound { path: PathBuf },

    /// The store refused a write: the handle has become read-only or the
    /// database is locked by a concurrent writer. Fatal to the writer role.
    WriteRejected {
        session_id: String,
        source: Option<rusqlite::Error>,
    },

    /// Operation on a handle whose connection has been released
    Closed,

    /// Removing the backing file on close failed
    Deletion {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Sqlite(err) => write!(f, "Database error: {}", err),
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::NotFound { path } => {
                write!(f, "Session database not found: {}", path.display())
            }
            Error::WriteRejected { session_id, source } => match source {
                Some(err) => write!(
                    f,
                    "Write rejected for session {}: {}",
                    session_id, err
                ),
                None => write!(
                    f,
                    "Write rejected for session {}: writer disabled after an earlier rejection",
                    session_id
                ),
            },
            Error::Closed => write!(f, "Session database handle is closed"),
            Error::Deletion { path, source } => {
                write!(f, "Failed to delete {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Sqlite(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::WriteRejected { source, .. } => {
                source.as_ref().map(|err| err as &(dyn std::error::Error + 'static))
            }
            Error::Deletion { source, .. } => Some(source),
            Error::NotFound { .. } | Error::Closed => None,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Sqlite(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

/// Structured classification of the two conditions that end a handle's
/// writer role. Replaces matching on error message substrings: the SQLite
/// result codes are the stable contract.
pub(crate) fn is_write_rejected(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, _) => matches!(
            code.code,
            rusqlite::ErrorCode::ReadOnly
                | rusqlite::ErrorCode::DatabaseBusy
                | rusqlite::ErrorCode::DatabaseLocked
        ),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQLITE_BUSY: i32 = 5;
    const SQLITE_LOCKED: i32 = 6;
    const SQLITE_READONLY: i32 = 8;
    const SQLITE_CONSTRAINT: i32 = 19;

    #[test]
    fn test_readonly_and_locked_classify_as_write_rejected() {
        for code in [SQLITE_READONLY, SQLITE_BUSY, SQLITE_LOCKED] {
            let err = rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(code), None);
            assert!(is_write_rejected(&err), "code {} should be fatal", code);
        }
    }

    #[test]
    fn test_constraint_violation_is_not_write_rejected() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(SQLITE_CONSTRAINT),
            Some("NOT NULL constraint failed".to_string()),
        );
        assert!(!is_write_rejected(&err));
    }

    #[test]
    fn test_write_rejected_display_without_source() {
        let err = Error::WriteRejected {
            session_id: "abc".to_string(),
            source: None,
        };
        let msg = err.to_string();
        assert!(msg.contains("abc"));
        assert!(msg.contains("writer disabled"));
    }
}
