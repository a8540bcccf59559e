use anyhow::Result;
use chrono::Utc;
use retrace_store::{Error, SessionDb, SessionDbOptions};
use retrace_types::CommandMeta;
use tempfile::TempDir;

fn command(id: i64, name: &str) -> CommandMeta {
    CommandMeta {
        id,
        retry_number: 0,
        tab_id: None,
        frame_id: None,
        flow_command_id: None,
        active_flow_handler_id: None,
        name: name.to_string(),
        was_prevented: false,
        args: None,
        client_start_at: None,
        client_send_at: None,
        run_start_at: None,
        end_at: None,
        result: None,
        result_type: None,
        callsite: None,
    }
}

#[test]
fn test_one_failing_table_does_not_abort_the_rest() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("partial.db");
    let db = SessionDb::open("partial", SessionDbOptions::default(), Some(path.clone()))?;

    // Sabotage a single table from outside the handle.
    {
        let side = rusqlite::Connection::open(&path)?;
        side.execute_batch("DROP TABLE page_logs")?;
    }

    db.commands.insert(&command(1, "goto"));
    db.page_logs
        .insert(1, None, "error", "boom", None, &Utc::now());
    db.snippets
        .insert("price", &serde_json::json!(9.99), &Utc::now(), 1);

    // Best-effort per table: the missing table is logged and skipped, the
    // remaining tables commit in the same batch.
    db.flush()?;

    assert_eq!(db.commands.all()?.len(), 1);
    assert_eq!(db.snippets.all()?.len(), 1);

    // The failed table's drained rows are lost for the cycle, not retried.
    assert_eq!(db.pending_row_count(), 0);

    db.close(false)?;
    Ok(())
}

#[test]
fn test_locked_database_is_fatal_to_the_writer_role() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("locked.db");
    let db = SessionDb::open("locked", SessionDbOptions::default(), Some(path.clone()))?;

    db.commands.insert(&command(1, "goto"));

    let blocker = rusqlite::Connection::open(&path)?;
    blocker.execute_batch("BEGIN EXCLUSIVE")?;

    let rejected = db.flush();
    assert!(matches!(rejected, Err(Error::WriteRejected { .. })));

    blocker.execute_batch("COMMIT")?;

    // The handle stays write-dead even after the lock is gone; no automatic
    // retry happens on behalf of the caller.
    let still_rejected = db.flush();
    assert!(matches!(still_rejected, Err(Error::WriteRejected { .. })));

    // The batch never started draining, so the buffered row is still there.
    assert_eq!(db.pending_row_count(), 1);

    db.close(false)?;
    Ok(())
}

#[test]
fn test_reads_continue_after_writer_failure() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("readafter.db");
    let db = SessionDb::open("readafter", SessionDbOptions::default(), Some(path.clone()))?;

    db.commands.insert(&command(1, "goto"));
    db.flush()?;

    let blocker = rusqlite::Connection::open(&path)?;
    blocker.execute_batch("BEGIN EXCLUSIVE")?;
    db.commands.insert(&command(2, "click"));
    assert!(matches!(db.flush(), Err(Error::WriteRejected { .. })));
    blocker.execute_batch("COMMIT")?;

    // Reads still work against the last committed state.
    let committed = db.commands.all()?;
    assert_eq!(committed.len(), 1);
    assert_eq!(committed[0].name, "goto");

    db.close(false)?;
    Ok(())
}
