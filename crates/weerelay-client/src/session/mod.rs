//! Session state: buffers, lines, nicklists, and the store that owns them.
//!
//! The store is the sole owner of all session state; every write goes
//! through [`SessionStore::apply`], and readers only ever see cloned
//! snapshots or change descriptors.

mod buffer;
mod nicklist;
mod store;
mod types;

pub use buffer::{Buffer, Line};
pub use nicklist::{Nick, NickGroup, Nicklist, NicklistItem};
pub use store::{Session, SessionStore};
pub use types::{NickDiffItem, NickDiffOp, NickEntry, SessionChange, SessionMutation};
