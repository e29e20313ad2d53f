//! Buffer and line state.

use std::collections::{BTreeSet, HashMap, VecDeque};

use weerelay_proto::wire::Pointer;

use crate::session::nicklist::Nicklist;

/// One rendered message line. Immutable once created; ordering is arrival
/// order, which the relay guarantees matches chronological order.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// The buffer this line belongs to.
    pub buffer: Pointer,
    /// The line's own relay-side identity.
    pub pointer: Pointer,
    /// Seconds since epoch.
    pub timestamp: u64,
    pub prefix: Option<String>,
    pub message: String,
    pub tags: BTreeSet<String>,
    pub highlighted: bool,
    pub displayed: bool,
}

/// A named conversation/context tracked by the session. Identity is the
/// relay-side pointer, stable for the buffer's lifetime and the join key for
/// all subsequent events.
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer {
    pub pointer: Pointer,
    /// Relay-side ordinal, drives display ordering.
    pub number: i32,
    pub full_name: String,
    pub short_name: Option<String>,
    pub title: Option<String>,
    pub local_variables: HashMap<String, String>,
    pub last_read_line: Option<Pointer>,
    pub hidden: bool,
    pub(crate) lines: VecDeque<Line>,
    pub(crate) nicklist: Nicklist,
}

impl Buffer {
    pub(crate) fn new(pointer: Pointer, number: i32, full_name: String) -> Buffer {
        Buffer {
            pointer,
            number,
            full_name,
            short_name: None,
            title: None,
            local_variables: HashMap::new(),
            last_read_line: None,
            hidden: false,
            lines: VecDeque::new(),
            nicklist: Nicklist::new(),
        }
    }

    /// Lines in arrival order, oldest first.
    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.lines.iter()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn nicklist(&self) -> &Nicklist {
        &self.nicklist
    }

    /// Short name when set, full name otherwise.
    pub fn display_name(&self) -> &str {
        self.short_name.as_deref().unwrap_or(&self.full_name)
    }
}
