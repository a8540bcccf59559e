use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use rusqlite::{Connection, OpenFlags, TransactionBehavior};

use crate::env;
use crate::error::{Error, Result, is_write_rejected};
use crate::storage;
use crate::table::{RecordTable, SharedConnection};
use crate::tables::{
    AwaitedEventsTable, CommandsTable, DetachedElementsTable, DetachedResourcesTable,
    DevtoolsMessagesTable, DomChangesTable, FlowCommandsTable, FlowHandlersTable,
    FrameNavigationsTable, FramesTable, FocusEventsTable, InteractionStepsTable, MouseEventsTable,
    OutputTable, PageLogsTable, ResourceStatesTable, ResourcesTable, ScreenshotsTable,
    ScrollEventsTable, SessionLogsTable, SessionTable, SnippetsTable, SocketsTable,
    StorageChangesTable, TabsTable, WebsocketMessagesTable,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionDbOptions {
    pub readonly: bool,
    pub file_must_exist: bool,
}

/// Distinct asset names ever recorded for a session, for extraction tooling
/// to enumerate what was captured without re-parsing every row.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct CollectedAssetNames {
    pub resources: Vec<String>,
    pub elements: Vec<String>,
    pub snippets: Vec<String>,
}

/// Single authority over one session's physical database file.
///
/// Appends from the automation engine land in per-table buffers and are
/// committed as one batch by the periodic flusher (or an explicit `flush`).
/// Each event kind is a named, typed field so callers get compile-checked
/// access; the `tables` list drives the flush in registration order.
///
/// At most one writable instance per session id may exist in a process.
/// Read-only instances are cheap and deduplicated by `SessionRegistry`.
pub struct SessionDb {
    session_id: String,
    path: PathBuf,
    conn: SharedConnection,
    /// Originally opened with the writer role (never true for registry
    /// handles, stays true after a keep_alive demotion).
    writer: bool,
    readonly: AtomicBool,
    keep_alive: AtomicBool,
    writer_failed: AtomicBool,
    flush_stop: Mutex<Option<mpsc::Sender<()>>>,

    pub commands: Arc<CommandsTable>,
    pub tabs: Arc<TabsTable>,
    pub frames: Arc<FramesTable>,
    pub frame_navigations: Arc<FrameNavigationsTable>,
    pub sockets: Arc<SocketsTable>,
    pub resources: Arc<ResourcesTable>,
    pub resource_states: Arc<ResourceStatesTable>,
    pub websocket_messages: Arc<WebsocketMessagesTable>,
    pub dom_changes: Arc<DomChangesTable>,
    pub detached_elements: Arc<DetachedElementsTable>,
    pub detached_resources: Arc<DetachedResourcesTable>,
    pub snippets: Arc<SnippetsTable>,
    pub flow_handlers: Arc<FlowHandlersTable>,
    pub flow_commands: Arc<FlowCommandsTable>,
    pub page_logs: Arc<PageLogsTable>,
    pub session: Arc<SessionTable>,
    pub interactions: Arc<InteractionStepsTable>,
    pub mouse_events: Arc<MouseEventsTable>,
    pub focus_events: Arc<FocusEventsTable>,
    pub scroll_events: Arc<ScrollEventsTable>,
    pub session_logs: Arc<SessionLogsTable>,
    pub devtools_messages: Arc<DevtoolsMessagesTable>,
    pub screenshots: Arc<ScreenshotsTable>,
    pub storage_changes: Arc<StorageChangesTable>,
    pub awaited_events: Arc<AwaitedEventsTable>,
    pub output: Arc<OutputTable>,

    tables: Vec<Arc<dyn RecordTable>>,
}

impl SessionDb {
    pub const FLUSH_INTERVAL: Duration = Duration::from_secs(5);

    /// Open (creating if needed) the writable store for a session in the
    /// default location.
    pub fn create(session_id: &str) -> Result<Arc<Self>> {
        Self::open(session_id, SessionDbOptions::default(), None)
    }

    pub fn open(
        session_id: &str,
        options: SessionDbOptions,
        custom_path: Option<PathBuf>,
    ) -> Result<Arc<Self>> {
        let path = match custom_path {
            Some(path) => path,
            None if options.readonly => {
                storage::session_db_path(&storage::default_sessions_dir(), session_id)
            }
            None => storage::session_db_path(storage::ensure_sessions_dir()?, session_id),
        };

        let conn = if options.readonly {
            if options.file_must_exist && !path.exists() {
                return Err(Error::NotFound { path });
            }
            Connection::open_with_flags(
                &path,
                OpenFlags::SQLITE_OPEN_READ_ONLY
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX
                    | OpenFlags::SQLITE_OPEN_URI,
            )?
        } else {
            let conn = Connection::open(&path)?;
            if env::env().enable_sqlite_wal {
                conn.pragma_update(None, "journal_mode", "WAL")?;
            }
            conn
        };

        let shared: SharedConnection = Arc::new(Mutex::new(Some(conn)));

        let commands = CommandsTable::new(shared.clone());
        let tabs = TabsTable::new(shared.clone());
        let frames = FramesTable::new(shared.clone());
        let frame_navigations = FrameNavigationsTable::new(shared.clone());
        let sockets = SocketsTable::new(shared.clone());
        let resources = ResourcesTable::new(shared.clone());
        let resource_states = ResourceStatesTable::new(shared.clone());
        let websocket_messages = WebsocketMessagesTable::new(shared.clone());
        let dom_changes = DomChangesTable::new(shared.clone());
        let detached_elements = DetachedElementsTable::new(shared.clone());
        let detached_resources = DetachedResourcesTable::new(shared.clone());
        let snippets = SnippetsTable::new(shared.clone());
        let flow_handlers = FlowHandlersTable::new(shared.clone());
        let flow_commands = FlowCommandsTable::new(shared.clone());
        let page_logs = PageLogsTable::new(shared.clone());
        let session = SessionTable::new(shared.clone());
        let interactions = InteractionStepsTable::new(shared.clone());
        let mouse_events = MouseEventsTable::new(shared.clone());
        let focus_events = FocusEventsTable::new(shared.clone());
        let scroll_events = ScrollEventsTable::new(shared.clone());
        let session_logs = SessionLogsTable::new(shared.clone());
        let devtools_messages = DevtoolsMessagesTable::new(shared.clone());
        let screenshots = ScreenshotsTable::new(shared.clone());
        let storage_changes = StorageChangesTable::new(shared.clone());
        let awaited_events = AwaitedEventsTable::new(shared.clone());
        let output = OutputTable::new(shared.clone());

        // Flush order. Referential sanity only (a tab row before rows that
        // point at it) - the batch commits or fails as one unit regardless.
        let tables: Vec<Arc<dyn RecordTable>> = vec![
            commands.clone(),
            tabs.clone(),
            frames.clone(),
            frame_navigations.clone(),
            sockets.clone(),
            resources.clone(),
            resource_states.clone(),
            websocket_messages.clone(),
            dom_changes.clone(),
            detached_elements.clone(),
            detached_resources.clone(),
            snippets.clone(),
            flow_handlers.clone(),
            flow_commands.clone(),
            page_logs.clone(),
            session.clone(),
            interactions.clone(),
            mouse_events.clone(),
            focus_events.clone(),
            scroll_events.clone(),
            session_logs.clone(),
            devtools_messages.clone(),
            screenshots.clone(),
            storage_changes.clone(),
            awaited_events.clone(),
            output.clone(),
        ];

        if !options.readonly {
            let guard = match shared.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(conn) = guard.as_ref() {
                for table in &tables {
                    table.base().create(conn)?;
                }
            }
        }

        let db = Arc::new(Self {
            session_id: session_id.to_string(),
            path,
            conn: shared,
            writer: !options.readonly,
            readonly: AtomicBool::new(options.readonly),
            keep_alive: AtomicBool::new(false),
            writer_failed: AtomicBool::new(false),
            flush_stop: Mutex::new(None),
            commands,
            tabs,
            frames,
            frame_navigations,
            sockets,
            resources,
            resource_states,
            websocket_messages,
            dom_changes,
            detached_elements,
            detached_resources,
            snippets,
            flow_handlers,
            flow_commands,
            page_logs,
            session,
            interactions,
            mouse_events,
            focus_events,
            scroll_events,
            session_logs,
            devtools_messages,
            screenshots,
            storage_changes,
            awaited_events,
            output,
            tables,
        });

        if !options.readonly {
            Self::arm_flusher(&db)?;
        }

        Ok(db)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly.load(Ordering::SeqCst)
    }

    pub fn is_open(&self) -> bool {
        self.lock_conn().is_some()
    }

    pub fn keep_alive(&self) -> bool {
        self.keep_alive.load(Ordering::SeqCst)
    }

    /// When set, `close()` demotes the handle to read-only instead of
    /// releasing the file, so readers holding this instance keep working.
    pub fn set_keep_alive(&self, keep_alive: bool) {
        self.keep_alive.store(keep_alive, Ordering::SeqCst);
    }

    /// Buffered rows not yet committed, across all tables. Diagnostic only.
    pub fn pending_row_count(&self) -> usize {
        self.tables
            .iter()
            .map(|table| table.base().pending_len())
            .sum()
    }

    /// Commit every table's pending rows in one immediate transaction.
    ///
    /// Per-table failures are logged and the remaining tables still run;
    /// the rejected table's drained rows are lost for this cycle and not
    /// retried. A readonly/locked classification is fatal to the writer
    /// role: the flusher is disarmed, the handle marked write-dead, and the
    /// whole batch rolled back.
    pub fn flush(&self) -> Result<()> {
        if !self.writer {
            return Ok(());
        }
        if self.writer_failed.load(Ordering::SeqCst) {
            return Err(Error::WriteRejected {
                session_id: self.session_id.clone(),
                source: None,
            });
        }

        let mut guard = self.lock_conn();
        let Some(conn) = guard.as_mut() else {
            return Err(Error::Closed);
        };

        let tx = match conn.transaction_with_behavior(TransactionBehavior::Immediate) {
            Ok(tx) => tx,
            Err(err) => return Err(self.classify_write_error(err)),
        };

        let mut fatal = None;
        for table in &self.tables {
            if let Err(err) = table.base().run_pending_inserts(&tx) {
                if is_write_rejected(&err) {
                    fatal = Some(err);
                    break;
                }
                log::error!(
                    "flush insert failed (session {}, table {}): {}",
                    self.session_id,
                    table.base().name(),
                    err
                );
            }
        }

        if let Some(source) = fatal {
            drop(tx);
            return Err(self.fail_writer(source));
        }

        if let Err(err) = tx.commit() {
            return Err(self.classify_write_error(err));
        }
        Ok(())
    }

    /// Disarm the flusher, flush pending writes, then release (or demote)
    /// the handle. Closing an already-closed database is a no-op apart from
    /// the requested deletion.
    pub fn close(&self, delete_file: bool) -> Result<()> {
        self.disarm_flusher();

        let was_open = self.is_open();
        if was_open
            && self.writer
            && !self.readonly.load(Ordering::SeqCst)
            && !self.writer_failed.load(Ordering::SeqCst)
        {
            if let Err(err) = self.flush() {
                log::warn!("final flush failed (session {}): {}", self.session_id, err);
            }
        }

        if self.keep_alive.load(Ordering::SeqCst) && was_open {
            {
                let guard = self.lock_conn();
                if let Some(conn) = guard.as_ref() {
                    conn.pragma_update(None, "query_only", true)?;
                }
            }
            self.readonly.store(true, Ordering::SeqCst);
            return Ok(());
        }

        {
            let mut guard = self.lock_conn();
            // Dropping the connection closes the file.
            *guard = None;
        }

        if delete_file
            && let Err(source) = std::fs::remove_file(&self.path)
        {
            return Err(Error::Deletion {
                path: self.path.clone(),
                source,
            });
        }
        Ok(())
    }

    /// Distinct names of snippets, detached resources and detached elements
    /// recorded so far, in first-recorded order.
    pub fn collected_asset_names(&self) -> Result<CollectedAssetNames> {
        let mut snippets: Vec<String> = Vec::new();
        for snippet in self.snippets.all()? {
            if !snippets.contains(&snippet.name) {
                snippets.push(snippet.name);
            }
        }

        let mut resources: Vec<String> = Vec::new();
        for resource in self.detached_resources.all()? {
            if !resources.contains(&resource.name) {
                resources.push(resource.name);
            }
        }

        let elements = self.detached_elements.all_names()?;

        Ok(CollectedAssetNames {
            resources,
            elements,
            snippets,
        })
    }

    fn lock_conn(&self) -> MutexGuard<'_, Option<Connection>> {
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn classify_write_error(&self, err: rusqlite::Error) -> Error {
        if is_write_rejected(&err) {
            self.fail_writer(err)
        } else {
            Error::Sqlite(err)
        }
    }

    fn fail_writer(&self, source: rusqlite::Error) -> Error {
        self.writer_failed.store(true, Ordering::SeqCst);
        self.disarm_flusher();
        Error::WriteRejected {
            session_id: self.session_id.clone(),
            source: Some(source),
        }
    }

    fn disarm_flusher(&self) {
        let sender = {
            let mut slot = match self.flush_stop.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            slot.take()
        };
        // A dead receiver means the flusher already exited on its own.
        if let Some(sender) = sender {
            let _ = sender.send(());
        }
    }

    /// Start the periodic flusher. The thread holds only a Weak reference,
    /// so it never keeps the database alive, and the process exits without
    /// waiting for it.
    fn arm_flusher(db: &Arc<Self>) -> Result<()> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let weak: Weak<SessionDb> = Arc::downgrade(db);

        std::thread::Builder::new()
            .name(format!("retrace-flush-{}", db.session_id))
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(SessionDb::FLUSH_INTERVAL) {
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                        Err(RecvTimeoutError::Timeout) => {}
                    }
                    let Some(db) = weak.upgrade() else { break };
                    if let Err(err) = db.flush() {
                        let fatal = matches!(err, Error::WriteRejected { .. });
                        log::error!(
                            "periodic flush failed (session {}): {}",
                            db.session_id(),
                            err
                        );
                        if fatal {
                            break;
                        }
                    }
                }
            })?;

        let mut slot = match db.flush_stop.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = Some(stop_tx);
        Ok(())
    }
}

impl Drop for SessionDb {
    fn drop(&mut self) {
        self.disarm_flusher();
    }
}
