use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

use crate::env;
use crate::error::Result;

/// Resolve the base data directory based on priority:
/// 1. Explicit path
/// 2. RETRACE_DATA_DIR environment variable
/// 3. Platform data directory
/// 4. Platform temp directory (last resort)
pub fn resolve_data_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    if let Some(dir) = &env::env().data_dir {
        return dir.clone();
    }

    if let Some(dir) = dirs::data_dir() {
        return dir.join("retrace");
    }

    std::env::temp_dir().join("retrace")
}

/// Default location of `<session_id>.db` files. Resolution only - nothing is
/// created on disk.
pub fn default_sessions_dir() -> PathBuf {
    resolve_data_dir(None).join("sessions")
}

static SESSIONS_DIR: OnceCell<PathBuf> = OnceCell::new();

/// Create the default sessions directory, at most once per process.
/// Subsequent calls return the cached path without touching the filesystem.
pub fn ensure_sessions_dir() -> Result<&'static Path> {
    let dir = SESSIONS_DIR.get_or_try_init(|| -> Result<PathBuf> {
        let dir = default_sessions_dir();
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    })?;
    Ok(dir.as_path())
}

pub fn session_db_path(dir: &Path, session_id: &str) -> PathBuf {
    dir.join(format!("{}.db", session_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_wins() {
        let dir = resolve_data_dir(Some(Path::new("/custom/location")));
        assert_eq!(dir, PathBuf::from("/custom/location"));
    }

    #[test]
    fn test_default_resolution_is_not_empty() {
        let dir = resolve_data_dir(None);
        assert!(dir.components().count() > 0);
    }

    #[test]
    fn test_session_db_path_appends_db_extension() {
        let path = session_db_path(Path::new("/tmp/sessions"), "abc123");
        assert_eq!(path, PathBuf::from("/tmp/sessions/abc123.db"));
    }
}
