//! Page save engine
//!
//! Turns a stream of editor change notifications into infrequent writes.
//!
//! ## Policy
//!
//! 1. Every notification (re)arms a trailing-edge timer for the page that
//!    was current when the edit happened
//! 2. When the quiet period elapses, the document as of the last
//!    notification is written to that page
//! 3. The write result updates the directory cache and the save status,
//!    never the editor document. A write that finishes after a newer write
//!    for the same page was issued leaves the cache alone
//!
//! The target page is captured when the timer is armed, so a fast page
//! switch cannot persist one page's keystrokes as another page's content.
//!
//! ## Usage
//!
//! ```ignore
//! let handle = spawn_save_task(Duration::from_secs(1), api, adapter, directory);
//! let commands = handle.command_sender();
//! commands.send(SaveCommand::Changed { page_id, snapshot: adapter.get_document() })?;
//! let status = handle.status();
//! ```

mod debounce;
mod engine;

pub use debounce::{Debouncer, PendingSave};
pub use engine::{spawn_save_task, SaveCommand, SaveEvent, SaveHandle};
