use anyhow::Result;
use chrono::Utc;
use retrace_store::{Error, SessionDb, SessionDbOptions, SessionRegistry};
use retrace_types::CommandMeta;
use std::sync::Arc;
use tempfile::TempDir;

fn seeded_session(dir: &TempDir, session_id: &str) -> Result<std::path::PathBuf> {
    let path = dir.path().join(format!("{}.db", session_id));
    let db = SessionDb::open(session_id, SessionDbOptions::default(), Some(path.clone()))?;
    db.commands.insert(&CommandMeta {
        id: 1,
        retry_number: 0,
        tab_id: None,
        frame_id: None,
        flow_command_id: None,
        active_flow_handler_id: None,
        name: "goto".to_string(),
        was_prevented: false,
        args: None,
        client_start_at: Some(Utc::now()),
        client_send_at: None,
        run_start_at: None,
        end_at: None,
        result: None,
        result_type: None,
        callsite: None,
    });
    db.flush()?;
    db.close(false)?;
    Ok(path)
}

#[test]
fn test_get_cached_returns_identical_handle_while_open() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = seeded_session(&temp_dir, "abc")?;

    let registry = SessionRegistry::new();
    let first = registry.get_cached("abc", true, Some(path.clone()))?;
    let second = registry.get_cached("abc", true, Some(path))?;

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(registry.len(), 1);
    Ok(())
}

#[test]
fn test_closed_handle_is_replaced_on_next_lookup() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = seeded_session(&temp_dir, "abc")?;

    let registry = SessionRegistry::new();
    let first = registry.get_cached("abc", true, Some(path.clone()))?;
    first.close(false)?;

    let second = registry.get_cached("abc", true, Some(path))?;
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(second.is_open());
    assert_eq!(second.commands.all()?.len(), 1);
    Ok(())
}

#[test]
fn test_lookup_accepts_db_file_suffix() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = seeded_session(&temp_dir, "abc")?;

    let registry = SessionRegistry::new();
    let by_id = registry.get_cached("abc", true, Some(path.clone()))?;
    let by_file = registry.get_cached("abc.db", true, Some(path))?;

    assert!(Arc::ptr_eq(&by_id, &by_file));
    assert_eq!(registry.len(), 1);
    Ok(())
}

#[test]
fn test_missing_file_surfaces_not_found() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let registry = SessionRegistry::new();

    let result = registry.get_cached(
        "ghost",
        true,
        Some(temp_dir.path().join("ghost.db")),
    );
    assert!(matches!(result, Err(Error::NotFound { .. })));
    assert!(registry.is_empty());
    Ok(())
}

#[test]
fn test_registry_handles_are_readonly() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = seeded_session(&temp_dir, "abc")?;

    let registry = SessionRegistry::new();
    let handle = registry.get_cached("abc", true, Some(path))?;
    assert!(handle.is_readonly());
    // A read-only handle has no writer role: flushing is a no-op.
    handle.flush()?;
    Ok(())
}

#[test]
fn test_remove_and_clear() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = seeded_session(&temp_dir, "abc")?;

    let registry = SessionRegistry::new();
    registry.get_cached("abc", true, Some(path.clone()))?;

    let removed = registry.remove("abc").expect("was cached");
    removed.close(false)?;
    assert!(registry.is_empty());

    registry.get_cached("abc", true, Some(path))?;
    registry.clear();
    assert!(registry.is_empty());
    Ok(())
}
