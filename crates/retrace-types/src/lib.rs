// Shared domain vocabulary for the session recording store.
// Schemas only - no I/O, no storage logic.

pub mod command;
pub mod dom;
pub mod input;
pub mod log;
pub mod resource;
pub mod session;

pub use command::*;
pub use dom::*;
pub use input::*;
pub use log::*;
pub use resource::*;
pub use session::*;
