// One module per recorded event kind. Registration (= flush) order is fixed
// by SessionDb so rows referencing other tables land after their referents.

mod awaited_events;
mod commands;
mod detached;
mod devtools_messages;
mod dom_changes;
mod flow;
mod frames;
mod input_events;
mod interactions;
mod output;
mod page_logs;
mod resources;
mod screenshots;
mod session_logs;
mod session_meta;
mod snippets;
mod sockets;
mod storage_changes;
mod tabs;
mod websocket_messages;

pub use awaited_events::{AwaitedEventRecord, AwaitedEventsTable};
pub use commands::{CommandRecord, CommandsTable};
pub use detached::{
    DetachedElementRecord, DetachedElementsTable, DetachedResourceRecord, DetachedResourcesTable,
};
pub use devtools_messages::{DevtoolsDirection, DevtoolsMessageRecord, DevtoolsMessagesTable};
pub use dom_changes::{DomChangeRecord, DomChangesTable};
pub use flow::{FlowCommandRecord, FlowCommandsTable, FlowHandlerRecord, FlowHandlersTable};
pub use frames::{
    FrameNavigationRecord, FrameNavigationsTable, FrameRecord, FramesTable, NavigationTimings,
};
pub use input_events::{
    FocusEventRecord, FocusEventsTable, MouseEventRecord, MouseEventsTable, ScrollEventRecord,
    ScrollEventsTable,
};
pub use interactions::{InteractionStepRecord, InteractionStepsTable};
pub use output::{OutputRecord, OutputTable};
pub use page_logs::{PageLogRecord, PageLogsTable};
pub use resources::{ResourceMetaRecord, ResourceStateRecord, ResourceStatesTable, ResourcesTable};
pub use screenshots::{ScreenshotRecord, ScreenshotsTable};
pub use session_logs::{SessionLogRecord, SessionLogsTable};
pub use session_meta::{SessionRecord, SessionTable};
pub use snippets::{SnippetRecord, SnippetsTable};
pub use sockets::{SocketRecord, SocketsTable};
pub use storage_changes::{StorageChangeRecord, StorageChangesTable};
pub use tabs::{TabRecord, TabsTable};
pub use websocket_messages::{WebsocketMessageRecord, WebsocketMessagesTable};
