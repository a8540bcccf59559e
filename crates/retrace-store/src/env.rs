use once_cell::sync::Lazy;
use std::path::PathBuf;

/// Process configuration consumed, not owned, by the store. Read once at
/// first use; no hot reload.
#[derive(Debug)]
pub(crate) struct Env {
    /// Base data directory override (`RETRACE_DATA_DIR`).
    pub data_dir: Option<PathBuf>,
    /// Write-ahead journal mode for writable session files
    /// (`RETRACE_SQLITE_WAL`). Trades some write latency for safer crash
    /// recovery and concurrent reader access.
    pub enable_sqlite_wal: bool,
}

static ENV: Lazy<Env> = Lazy::new(|| Env {
    data_dir: std::env::var_os("RETRACE_DATA_DIR").map(PathBuf::from),
    enable_sqlite_wal: parse_bool(std::env::var("RETRACE_SQLITE_WAL").ok()),
});

pub(crate) fn env() -> &'static Env {
    &ENV
}

fn parse_bool(value: Option<String>) -> bool {
    match value.as_deref() {
        Some(v) => matches!(v, "1" | "true" | "TRUE" | "True" | "yes"),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_accepts_common_truthy_forms() {
        for v in ["1", "true", "TRUE", "True", "yes"] {
            assert!(parse_bool(Some(v.to_string())), "{} should be truthy", v);
        }
    }

    #[test]
    fn test_parse_bool_rejects_everything_else() {
        assert!(!parse_bool(None));
        for v in ["0", "false", "no", ""] {
            assert!(!parse_bool(Some(v.to_string())), "{} should be falsy", v);
        }
    }
}
