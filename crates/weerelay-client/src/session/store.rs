//! The session store: single owner of all buffers, lines, and nicks.

use std::collections::HashMap;

use weerelay_proto::wire::Pointer;

use crate::session::buffer::Buffer;
use crate::session::nicklist::Nicklist;
use crate::session::types::{SessionChange, SessionMutation};

/// The authoritative in-memory state for one connection.
///
/// Cloned wholesale to produce read-only snapshots; external code never
/// mutates it.
#[derive(Debug, Clone, Default)]
pub struct Session {
    buffers: HashMap<Pointer, Buffer>,
    /// Display order: by relay buffer number, arrival order within a number.
    order: Vec<Pointer>,
}

impl Session {
    pub fn buffer(&self, pointer: &Pointer) -> Option<&Buffer> {
        self.buffers.get(pointer)
    }

    pub fn buffer_by_full_name(&self, full_name: &str) -> Option<&Buffer> {
        self.buffers.values().find(|b| b.full_name == full_name)
    }

    /// Buffers in display order.
    pub fn buffers(&self) -> impl Iterator<Item = &Buffer> {
        self.order.iter().filter_map(|p| self.buffers.get(p))
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

/// Applies mutations in arrival order and hands out snapshots.
///
/// `apply` never fails: a mutation targeting unknown state is logged and
/// reported as `SessionChange::Ignored`, leaving the session untouched.
#[derive(Debug)]
pub struct SessionStore {
    session: Session,
    max_lines_per_buffer: usize,
}

impl SessionStore {
    pub fn new(max_lines_per_buffer: usize) -> SessionStore {
        SessionStore {
            session: Session::default(),
            max_lines_per_buffer,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// An immutable snapshot of the current state.
    pub fn snapshot(&self) -> Session {
        self.session.clone()
    }

    /// Tear down all state, e.g. before a reconnect handshake.
    pub fn reset(&mut self) {
        self.session = Session::default();
    }

    pub fn apply(&mut self, mutation: SessionMutation) -> SessionChange {
        match mutation {
            SessionMutation::BufferOpened {
                pointer,
                number,
                full_name,
                short_name,
                title,
                local_variables,
                hidden,
            } => {
                let known = self.session.buffers.contains_key(&pointer);
                let buf = self
                    .session
                    .buffers
                    .entry(pointer.clone())
                    .or_insert_with(|| Buffer::new(pointer.clone(), number, full_name.clone()));
                // Re-open refreshes scalar fields only; lines and nicklist
                // survive.
                buf.number = number;
                buf.full_name = full_name;
                buf.short_name = short_name;
                buf.title = title;
                buf.local_variables = local_variables;
                buf.hidden = hidden;
                if !known {
                    self.session.order.push(pointer.clone());
                }
                self.sort_order();
                if known {
                    SessionChange::BufferUpdated(pointer)
                } else {
                    SessionChange::BufferOpened(pointer)
                }
            }

            SessionMutation::BufferClosing { pointer } => {
                if self.session.buffers.remove(&pointer).is_none() {
                    return self.ignored(pointer, "close for unknown buffer");
                }
                self.session.order.retain(|p| p != &pointer);
                SessionChange::BufferClosed(pointer)
            }

            SessionMutation::BufferRenamed {
                pointer,
                full_name,
                short_name,
            } => match self.session.buffers.get_mut(&pointer) {
                Some(buf) => {
                    buf.full_name = full_name;
                    buf.short_name = short_name;
                    SessionChange::BufferUpdated(pointer)
                }
                None => self.ignored(pointer, "rename for unknown buffer"),
            },

            SessionMutation::TitleChanged { pointer, title } => {
                match self.session.buffers.get_mut(&pointer) {
                    Some(buf) => {
                        buf.title = title;
                        SessionChange::BufferUpdated(pointer)
                    }
                    None => self.ignored(pointer, "title for unknown buffer"),
                }
            }

            SessionMutation::LocalVarsChanged { pointer, variables } => {
                match self.session.buffers.get_mut(&pointer) {
                    Some(buf) => {
                        buf.local_variables = variables;
                        SessionChange::BufferUpdated(pointer)
                    }
                    None => self.ignored(pointer, "local variables for unknown buffer"),
                }
            }

            SessionMutation::LineAdded { line } => {
                let pointer = line.buffer.clone();
                match self.session.buffers.get_mut(&pointer) {
                    Some(buf) => {
                        buf.lines.push_back(line);
                        let mut evicted = false;
                        while buf.lines.len() > self.max_lines_per_buffer {
                            buf.lines.pop_front();
                            evicted = true;
                        }
                        SessionChange::LineAppended {
                            buffer: pointer,
                            evicted,
                        }
                    }
                    None => self.ignored(pointer, "line for unknown buffer"),
                }
            }

            SessionMutation::LinesCleared { pointer } => {
                match self.session.buffers.get_mut(&pointer) {
                    Some(buf) => {
                        buf.lines.clear();
                        SessionChange::LinesCleared(pointer)
                    }
                    None => self.ignored(pointer, "clear for unknown buffer"),
                }
            }

            SessionMutation::LastReadLine { pointer, line } => {
                match self.session.buffers.get_mut(&pointer) {
                    Some(buf) => {
                        buf.last_read_line = Some(line);
                        SessionChange::BufferUpdated(pointer)
                    }
                    None => self.ignored(pointer, "read marker for unknown buffer"),
                }
            }

            SessionMutation::NicklistReplaced { buffer, entries } => {
                match self.session.buffers.get_mut(&buffer) {
                    Some(buf) => {
                        buf.nicklist = Nicklist::rebuild(&entries);
                        SessionChange::NicklistChanged(buffer)
                    }
                    None => self.ignored(buffer, "nicklist for unknown buffer"),
                }
            }

            SessionMutation::NicklistDiff { buffer, items } => {
                match self.session.buffers.get_mut(&buffer) {
                    Some(buf) => {
                        buf.nicklist.apply_diff(&items);
                        SessionChange::NicklistChanged(buffer)
                    }
                    None => self.ignored(buffer, "nicklist diff for unknown buffer"),
                }
            }
        }
    }

    fn ignored(&self, buffer: Pointer, reason: &'static str) -> SessionChange {
        tracing::warn!(%buffer, reason, "mutation ignored");
        SessionChange::Ignored { buffer, reason }
    }

    fn sort_order(&mut self) {
        let buffers = &self.session.buffers;
        self.session
            .order
            .sort_by_key(|p| buffers.get(p).map(|b| b.number).unwrap_or(i32::MAX));
    }
}
