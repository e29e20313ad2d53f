//! Mutation and change-descriptor types crossing the interpreter/store
//! boundary.

use std::collections::HashMap;

use weerelay_proto::wire::Pointer;

use crate::session::buffer::Line;

/// A parsed nicklist record, shared by full listings and diffs.
#[derive(Debug, Clone, PartialEq)]
pub struct NickEntry {
    pub pointer: Pointer,
    /// True for a group node, false for a nick.
    pub group: bool,
    pub visible: bool,
    /// Tree depth for group nodes (root = 0). Zero for nicks.
    pub level: i32,
    pub name: String,
    pub prefix: Option<String>,
}

/// Diff operation markers as sent by the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NickDiffOp {
    /// `^` — the entry names the parent group for subsequent items.
    SelectParent,
    /// `+` — add under the selected parent.
    Add,
    /// `-` — remove by pointer.
    Remove,
    /// `*` — update fields in place.
    Update,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NickDiffItem {
    pub op: NickDiffOp,
    pub entry: NickEntry,
}

/// A single, atomic, typed change to apply to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionMutation {
    BufferOpened {
        pointer: Pointer,
        number: i32,
        full_name: String,
        short_name: Option<String>,
        title: Option<String>,
        local_variables: HashMap<String, String>,
        hidden: bool,
    },
    BufferClosing {
        pointer: Pointer,
    },
    BufferRenamed {
        pointer: Pointer,
        full_name: String,
        short_name: Option<String>,
    },
    TitleChanged {
        pointer: Pointer,
        title: Option<String>,
    },
    /// The relay sends the full variable table after any add/change/remove.
    LocalVarsChanged {
        pointer: Pointer,
        variables: HashMap<String, String>,
    },
    LineAdded {
        line: Line,
    },
    LinesCleared {
        pointer: Pointer,
    },
    LastReadLine {
        pointer: Pointer,
        line: Pointer,
    },
    NicklistReplaced {
        buffer: Pointer,
        entries: Vec<NickEntry>,
    },
    NicklistDiff {
        buffer: Pointer,
        items: Vec<NickDiffItem>,
    },
}

impl SessionMutation {
    /// The buffer this mutation targets.
    pub fn buffer_pointer(&self) -> &Pointer {
        match self {
            SessionMutation::BufferOpened { pointer, .. }
            | SessionMutation::BufferClosing { pointer }
            | SessionMutation::BufferRenamed { pointer, .. }
            | SessionMutation::TitleChanged { pointer, .. }
            | SessionMutation::LocalVarsChanged { pointer, .. }
            | SessionMutation::LinesCleared { pointer }
            | SessionMutation::LastReadLine { pointer, .. } => pointer,
            SessionMutation::LineAdded { line } => &line.buffer,
            SessionMutation::NicklistReplaced { buffer, .. }
            | SessionMutation::NicklistDiff { buffer, .. } => buffer,
        }
    }
}

/// Ordered change descriptor published after each apply.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionChange {
    BufferOpened(Pointer),
    /// An already-known buffer had scalar fields refreshed.
    BufferUpdated(Pointer),
    BufferClosed(Pointer),
    LineAppended {
        buffer: Pointer,
        /// True when the ring was full and the oldest line was dropped.
        evicted: bool,
    },
    LinesCleared(Pointer),
    NicklistChanged(Pointer),
    /// The mutation targeted state this session does not hold; nothing
    /// happened.
    Ignored {
        buffer: Pointer,
        reason: &'static str,
    },
}
