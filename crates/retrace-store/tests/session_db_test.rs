use anyhow::Result;
use chrono::Utc;
use retrace_store::{Error, SessionDb, SessionDbOptions};
use retrace_types::{
    CommandMeta, LogData, LogEntry, LogLevel, ResourceEvent, ResourceType, SessionMeta,
};
use tempfile::TempDir;

fn log_entry(id: i64, level: LogLevel, action: &str) -> LogEntry {
    LogEntry {
        id,
        timestamp: Utc::now(),
        action: action.to_string(),
        level,
        session_id: Some("test".to_string()),
        parent_id: None,
        data: None,
    }
}

fn command(id: i64, name: &str) -> CommandMeta {
    CommandMeta {
        id,
        retry_number: 0,
        tab_id: Some(1),
        frame_id: Some(1),
        flow_command_id: None,
        active_flow_handler_id: None,
        name: name.to_string(),
        was_prevented: false,
        args: Some(serde_json::json!({ "url": "https://example.org" })),
        client_start_at: Some(Utc::now()),
        client_send_at: None,
        run_start_at: Some(Utc::now()),
        end_at: Some(Utc::now()),
        result: None,
        result_type: None,
        callsite: None,
    }
}

fn resource(id: i64, url: &str) -> ResourceEvent {
    ResourceEvent {
        id,
        devtools_request_id: Some(format!("req-{}", id)),
        tab_id: Some(1),
        frame_id: Some(1),
        socket_id: None,
        resource_type: ResourceType::Document,
        received_at: Utc::now(),
        url: url.to_string(),
        status_code: Some(200),
        request_method: "GET".to_string(),
        request_headers: None,
        response_headers: None,
        response_data: Some(b"<html></html>".to_vec()),
        is_http2: false,
        browser_loaded_at: None,
        document_url: None,
    }
}

#[test]
fn test_appends_survive_flush_in_fifo_order() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db = SessionDb::open(
        "fifo",
        SessionDbOptions::default(),
        Some(temp_dir.path().join("fifo.db")),
    )?;

    for i in 0..5 {
        db.commands.insert(&command(i, &format!("step-{}", i)));
    }
    assert_eq!(db.pending_row_count(), 5);

    db.flush()?;
    assert_eq!(db.pending_row_count(), 0);

    let committed = db.commands.all()?;
    assert_eq!(committed.len(), 5);
    for (i, record) in committed.iter().enumerate() {
        assert_eq!(record.id, i as i64);
        assert_eq!(record.name, format!("step-{}", i));
    }

    db.close(false)?;
    Ok(())
}

#[test]
fn test_queries_only_see_committed_rows() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db = SessionDb::open(
        "uncommitted",
        SessionDbOptions::default(),
        Some(temp_dir.path().join("uncommitted.db")),
    )?;

    db.commands.insert(&command(1, "goto"));

    // Buffered but not flushed: the committed view stays empty.
    assert_eq!(db.commands.all()?.len(), 0);

    db.flush()?;
    assert_eq!(db.commands.all()?.len(), 1);

    db.close(false)?;
    Ok(())
}

#[test]
fn test_log_error_filter_returns_original_fields() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db = SessionDb::open(
        "logs",
        SessionDbOptions::default(),
        Some(temp_dir.path().join("logs.db")),
    )?;

    db.session_logs.insert(&log_entry(1, LogLevel::Info, "Tab.navigate"));
    let mut failed = log_entry(2, LogLevel::Error, "Tab.navigate.error");
    failed.data = Some(LogData::Value(serde_json::json!({ "url": "https://x.org" })));
    db.session_logs.insert(&failed);
    db.session_logs.insert(&log_entry(3, LogLevel::Info, "Tab.close"));

    db.flush()?;

    let all = db.session_logs.all()?;
    assert_eq!(all.len(), 3);

    let errors = db.session_logs.all_errors()?;
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].id, 2);
    assert_eq!(errors[0].action, "Tab.navigate.error");
    assert_eq!(errors[0].level, "error");
    assert_eq!(
        errors[0].data,
        Some(serde_json::json!({ "url": "https://x.org" }))
    );

    db.close(false)?;
    Ok(())
}

#[test]
fn test_collected_asset_names_spans_three_tables() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db = SessionDb::open(
        "assets",
        SessionDbOptions::default(),
        Some(temp_dir.path().join("assets.db")),
    )?;

    let now = Utc::now();
    db.resources.insert(&resource(1, "https://example.org/invoice.json"));
    db.snippets
        .insert("price", &serde_json::json!(12.99), &now, 4);
    db.snippets
        .insert("price", &serde_json::json!(13.49), &now, 9);
    db.detached_resources.insert("invoice", 1, 4, 1, &now);

    db.flush()?;

    let assets = db.collected_asset_names()?;
    assert_eq!(assets.snippets, vec!["price".to_string()]);
    assert_eq!(assets.resources, vec!["invoice".to_string()]);
    assert!(assets.elements.is_empty());

    db.close(false)?;
    Ok(())
}

#[test]
fn test_readonly_handle_never_sees_unflushed_rows() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("isolation.db");

    let writer = SessionDb::open("isolation", SessionDbOptions::default(), Some(path.clone()))?;
    writer.commands.insert(&command(1, "goto"));

    let reader = SessionDb::open(
        "isolation",
        SessionDbOptions {
            readonly: true,
            file_must_exist: true,
        },
        Some(path.clone()),
    )?;
    assert!(reader.is_readonly());
    assert_eq!(reader.commands.all()?.len(), 0);

    writer.flush()?;
    assert_eq!(reader.commands.all()?.len(), 1);

    writer.close(false)?;
    reader.close(false)?;
    Ok(())
}

#[test]
fn test_session_metadata_visible_before_first_flush() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("meta.db");
    let db = SessionDb::open("meta", SessionDbOptions::default(), Some(path.clone()))?;

    db.session.insert(&SessionMeta {
        id: "meta".to_string(),
        start_at: Utc::now(),
        user_agent_string: Some("agent/1.0".to_string()),
        viewport_width: Some(1440),
        viewport_height: Some(900),
        timezone_id: None,
        locale: Some("en-GB".to_string()),
        create_options: None,
    })?;

    // insert_now bypasses the batch: a concurrent reader sees it already.
    let reader = SessionDb::open(
        "meta",
        SessionDbOptions {
            readonly: true,
            file_must_exist: true,
        },
        Some(path),
    )?;
    let record = reader.session.get()?.expect("metadata row should exist");
    assert_eq!(record.id, "meta");
    assert_eq!(record.viewport_width, Some(1440));
    assert!(record.close_ts.is_none());

    db.session.record_close("meta", &Utc::now())?;
    assert!(reader.session.get()?.expect("still there").close_ts.is_some());

    db.close(false)?;
    reader.close(false)?;
    Ok(())
}

#[test]
fn test_keep_alive_close_demotes_to_readonly() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db = SessionDb::open(
        "keepalive",
        SessionDbOptions::default(),
        Some(temp_dir.path().join("keepalive.db")),
    )?;

    db.commands.insert(&command(1, "goto"));
    db.set_keep_alive(true);
    db.close(false)?;

    // Still open, but reads only from here on.
    assert!(db.is_open());
    assert!(db.is_readonly());
    assert_eq!(db.commands.all()?.len(), 1);

    db.commands.insert(&command(2, "click"));
    let refused = db.flush();
    assert!(matches!(refused, Err(Error::WriteRejected { .. })));

    db.set_keep_alive(false);
    db.close(false)?;
    assert!(!db.is_open());
    Ok(())
}

#[test]
fn test_close_with_delete_removes_backing_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("deleted.db");

    let db = SessionDb::open("deleted", SessionDbOptions::default(), Some(path.clone()))?;
    db.commands.insert(&command(1, "goto"));
    db.close(true)?;

    assert!(!path.exists());

    let reopened = SessionDb::open(
        "deleted",
        SessionDbOptions {
            readonly: true,
            file_must_exist: true,
        },
        Some(path),
    );
    assert!(matches!(reopened, Err(Error::NotFound { .. })));
    Ok(())
}

#[test]
fn test_double_close_is_noop() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db = SessionDb::open(
        "twice",
        SessionDbOptions::default(),
        Some(temp_dir.path().join("twice.db")),
    )?;
    db.close(false)?;
    db.close(false)?;
    assert!(!db.is_open());
    Ok(())
}

#[test]
fn test_writable_reopen_appends_to_existing_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("reopen.db");

    let first = SessionDb::open("reopen", SessionDbOptions::default(), Some(path.clone()))?;
    first.commands.insert(&command(1, "goto"));
    first.close(false)?;

    let second = SessionDb::open("reopen", SessionDbOptions::default(), Some(path))?;
    second.commands.insert(&command(2, "click"));
    second.flush()?;

    let committed = second.commands.all()?;
    assert_eq!(committed.len(), 2);
    assert_eq!(committed[0].name, "goto");
    assert_eq!(committed[1].name, "click");

    second.close(false)?;
    Ok(())
}

#[test]
fn test_response_lookup_by_url() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db = SessionDb::open(
        "bodies",
        SessionDbOptions::default(),
        Some(temp_dir.path().join("bodies.db")),
    )?;

    db.resources.insert(&resource(1, "https://example.org/"));
    db.flush()?;

    let body = db.resources.response_by_url("https://example.org/")?;
    assert_eq!(body, Some(b"<html></html>".to_vec()));
    assert_eq!(db.resources.response_by_url("https://example.org/missing")?, None);

    db.close(false)?;
    Ok(())
}
