//! Built-in event handlers and their hdata extraction helpers.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use weerelay_proto::wire::{Hdata, HdataEntry, Message, Object, Pointer};
use weerelay_proto::{RelayError, Result};

use crate::dispatch::{EventHandler, EventRegistry};
use crate::session::{Line, NickDiffItem, NickDiffOp, NickEntry, SessionMutation};

/// Install every handler this client understands.
pub(crate) fn register_builtin(reg: &mut EventRegistry) {
    reg.register(Arc::new(BufferListHandler { event: "listbuffers" }));
    reg.register(Arc::new(BufferListHandler {
        event: "_buffer_opened",
    }));
    reg.register(Arc::new(BufferClosingHandler));
    reg.register(Arc::new(BufferRenamedHandler));
    reg.register(Arc::new(BufferTitleHandler));
    reg.register(Arc::new(LocalVarHandler {
        event: "_buffer_localvar_added",
    }));
    reg.register(Arc::new(LocalVarHandler {
        event: "_buffer_localvar_changed",
    }));
    reg.register(Arc::new(LocalVarHandler {
        event: "_buffer_localvar_removed",
    }));
    reg.register(Arc::new(LineHandler {
        event: "_buffer_line_added",
        newest_first: false,
    }));
    reg.register(Arc::new(LineHandler {
        event: "listlines",
        newest_first: true,
    }));
    reg.register(Arc::new(BufferClearedHandler));
    reg.register(Arc::new(NicklistHandler { event: "nicklist" }));
    reg.register(Arc::new(NicklistHandler { event: "_nicklist" }));
    reg.register(Arc::new(NicklistDiffHandler));
    reg.register(Arc::new(LastReadLinesHandler));
    reg.register(Arc::new(PongHandler));
    reg.register(Arc::new(InertEventHandler { event: "_upgrade" }));
    reg.register(Arc::new(InertEventHandler {
        event: "_upgrade_ended",
    }));
    reg.register(Arc::new(VersionHandler));
}

// --------------------
// hdata field helpers
// --------------------

fn hdata_of(msg: &Message) -> Result<&Hdata> {
    msg.first()
        .and_then(Object::as_hdata)
        .ok_or_else(|| RelayError::Decode(format!("{:?}: expected an hdata object", msg.id)))
}

fn str_field(hda: &Hdata, entry: &HdataEntry, name: &str) -> Option<String> {
    hda.field(entry, name)
        .and_then(Object::as_str)
        .map(str::to_string)
}

fn int_field(hda: &Hdata, entry: &HdataEntry, name: &str) -> Option<i32> {
    hda.field(entry, name).and_then(Object::as_int)
}

fn flag_field(hda: &Hdata, entry: &HdataEntry, name: &str, default: bool) -> bool {
    match hda.field(entry, name) {
        Some(obj) => match (obj.as_char(), obj.as_int()) {
            (Some(c), _) => c != 0,
            (_, Some(i)) => i != 0,
            _ => default,
        },
        None => default,
    }
}

/// A `str -> str` hashtable field, e.g. local_variables.
fn vars_field(hda: &Hdata, entry: &HdataEntry, name: &str) -> HashMap<String, String> {
    let mut out = HashMap::new();
    if let Some(pairs) = hda.field(entry, name).and_then(Object::as_hashtable) {
        for (k, v) in pairs {
            if let (Some(k), Some(v)) = (k.as_str(), v.as_str()) {
                out.insert(k.to_string(), v.to_string());
            }
        }
    }
    out
}

fn tags_field(hda: &Hdata, entry: &HdataEntry) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    if let Some(items) = hda.field(entry, "tags_array").and_then(Object::as_array) {
        for item in items {
            if let Some(tag) = item.as_str() {
                out.insert(tag.to_string());
            }
        }
    }
    out
}

fn first_pointer(entry: &HdataEntry, what: &str) -> Result<Pointer> {
    entry
        .pointers
        .first()
        .cloned()
        .ok_or_else(|| RelayError::Decode(format!("{what} entry without a pointer path")))
}

/// The buffer a line-shaped entry belongs to: an explicit `buffer` field
/// when present, otherwise the head of the pointer path (which only names a
/// buffer when the path has more than one segment).
fn line_buffer(hda: &Hdata, entry: &HdataEntry) -> Result<Pointer> {
    hda.field(entry, "buffer")
        .and_then(Object::as_pointer)
        .cloned()
        .or_else(|| {
            if hda.schema.path.len() > 1 {
                entry.pointers.first().cloned()
            } else {
                None
            }
        })
        .ok_or_else(|| RelayError::Decode("line entry without a buffer pointer".into()))
}

/// The line's own identity within a line-shaped entry's pointer path.
fn line_pointer(hda: &Hdata, entry: &HdataEntry) -> Result<Pointer> {
    let ptr = if hda.schema.path.len() >= 3 {
        entry.pointers.get(2)
    } else {
        entry.pointers.last()
    };
    ptr.cloned()
        .ok_or_else(|| RelayError::Decode("line entry without a line pointer".into()))
}

fn line_from_entry(hda: &Hdata, entry: &HdataEntry) -> Result<Line> {
    Ok(Line {
        buffer: line_buffer(hda, entry)?,
        pointer: line_pointer(hda, entry)?,
        timestamp: hda
            .field(entry, "date")
            .and_then(Object::as_time)
            .unwrap_or(0),
        prefix: str_field(hda, entry, "prefix").filter(|s| !s.is_empty()),
        message: str_field(hda, entry, "message").unwrap_or_default(),
        tags: tags_field(hda, entry),
        highlighted: flag_field(hda, entry, "highlight", false),
        displayed: flag_field(hda, entry, "displayed", true),
    })
}

fn nick_entry(hda: &Hdata, entry: &HdataEntry) -> Result<(Pointer, NickEntry)> {
    let buffer = first_pointer(entry, "nicklist")?;
    let pointer = entry
        .pointers
        .last()
        .cloned()
        .ok_or_else(|| RelayError::Decode("nicklist entry without an item pointer".into()))?;
    Ok((
        buffer,
        NickEntry {
            pointer,
            group: flag_field(hda, entry, "group", false),
            visible: flag_field(hda, entry, "visible", true),
            level: int_field(hda, entry, "level").unwrap_or(0),
            name: str_field(hda, entry, "name").unwrap_or_default(),
            prefix: str_field(hda, entry, "prefix").filter(|s| !s.is_empty() && s != " "),
        },
    ))
}

// --------------------
// buffer lifecycle
// --------------------

/// `listbuffers` replies and `_buffer_opened` events share one shape.
struct BufferListHandler {
    event: &'static str,
}

impl EventHandler for BufferListHandler {
    fn event(&self) -> &'static str {
        self.event
    }

    fn interpret(&self, msg: &Message) -> Result<Vec<SessionMutation>> {
        let hda = hdata_of(msg)?;
        let mut out = Vec::with_capacity(hda.entries.len());
        for entry in &hda.entries {
            out.push(SessionMutation::BufferOpened {
                pointer: first_pointer(entry, "buffer")?,
                number: int_field(hda, entry, "number").unwrap_or(0),
                full_name: str_field(hda, entry, "full_name").unwrap_or_default(),
                short_name: str_field(hda, entry, "short_name"),
                title: str_field(hda, entry, "title"),
                local_variables: vars_field(hda, entry, "local_variables"),
                hidden: flag_field(hda, entry, "hidden", false),
            });
        }
        Ok(out)
    }
}

struct BufferClosingHandler;

impl EventHandler for BufferClosingHandler {
    fn event(&self) -> &'static str {
        "_buffer_closing"
    }

    fn interpret(&self, msg: &Message) -> Result<Vec<SessionMutation>> {
        let hda = hdata_of(msg)?;
        let mut out = Vec::with_capacity(hda.entries.len());
        for entry in &hda.entries {
            out.push(SessionMutation::BufferClosing {
                pointer: first_pointer(entry, "buffer")?,
            });
        }
        Ok(out)
    }
}

struct BufferRenamedHandler;

impl EventHandler for BufferRenamedHandler {
    fn event(&self) -> &'static str {
        "_buffer_renamed"
    }

    fn interpret(&self, msg: &Message) -> Result<Vec<SessionMutation>> {
        let hda = hdata_of(msg)?;
        let mut out = Vec::with_capacity(hda.entries.len());
        for entry in &hda.entries {
            out.push(SessionMutation::BufferRenamed {
                pointer: first_pointer(entry, "buffer")?,
                full_name: str_field(hda, entry, "full_name").unwrap_or_default(),
                short_name: str_field(hda, entry, "short_name"),
            });
        }
        Ok(out)
    }
}

struct BufferTitleHandler;

impl EventHandler for BufferTitleHandler {
    fn event(&self) -> &'static str {
        "_buffer_title_changed"
    }

    fn interpret(&self, msg: &Message) -> Result<Vec<SessionMutation>> {
        let hda = hdata_of(msg)?;
        let mut out = Vec::with_capacity(hda.entries.len());
        for entry in &hda.entries {
            out.push(SessionMutation::TitleChanged {
                pointer: first_pointer(entry, "buffer")?,
                title: str_field(hda, entry, "title"),
            });
        }
        Ok(out)
    }
}

/// All three localvar events carry the full table after the change.
struct LocalVarHandler {
    event: &'static str,
}

impl EventHandler for LocalVarHandler {
    fn event(&self) -> &'static str {
        self.event
    }

    fn interpret(&self, msg: &Message) -> Result<Vec<SessionMutation>> {
        let hda = hdata_of(msg)?;
        let mut out = Vec::with_capacity(hda.entries.len());
        for entry in &hda.entries {
            out.push(SessionMutation::LocalVarsChanged {
                pointer: first_pointer(entry, "buffer")?,
                variables: vars_field(hda, entry, "local_variables"),
            });
        }
        Ok(out)
    }
}

// --------------------
// lines
// --------------------

/// `_buffer_line_added` events and `listlines` replies share one entry
/// shape; backlog replies arrive newest-first and are re-ordered here so the
/// store only ever appends.
struct LineHandler {
    event: &'static str,
    newest_first: bool,
}

impl EventHandler for LineHandler {
    fn event(&self) -> &'static str {
        self.event
    }

    fn interpret(&self, msg: &Message) -> Result<Vec<SessionMutation>> {
        let hda = hdata_of(msg)?;
        let mut lines = Vec::with_capacity(hda.entries.len());
        for entry in &hda.entries {
            lines.push(line_from_entry(hda, entry)?);
        }
        if self.newest_first {
            lines.reverse();
        }
        Ok(lines
            .into_iter()
            .map(|line| SessionMutation::LineAdded { line })
            .collect())
    }
}

struct BufferClearedHandler;

impl EventHandler for BufferClearedHandler {
    fn event(&self) -> &'static str {
        "_buffer_cleared"
    }

    fn interpret(&self, msg: &Message) -> Result<Vec<SessionMutation>> {
        let hda = hdata_of(msg)?;
        let mut out = Vec::with_capacity(hda.entries.len());
        for entry in &hda.entries {
            out.push(SessionMutation::LinesCleared {
                pointer: first_pointer(entry, "buffer")?,
            });
        }
        Ok(out)
    }
}

struct LastReadLinesHandler;

impl EventHandler for LastReadLinesHandler {
    fn event(&self) -> &'static str {
        "last_read_lines"
    }

    fn interpret(&self, msg: &Message) -> Result<Vec<SessionMutation>> {
        let hda = hdata_of(msg)?;
        let mut out = Vec::with_capacity(hda.entries.len());
        for entry in &hda.entries {
            out.push(SessionMutation::LastReadLine {
                pointer: line_buffer(hda, entry)?,
                line: line_pointer(hda, entry)?,
            });
        }
        Ok(out)
    }
}

// --------------------
// nicklist
// --------------------

/// Full replaces: `nicklist` replies and `_nicklist` events. Entries are
/// grouped into one mutation per consecutive buffer run, preserving order.
struct NicklistHandler {
    event: &'static str,
}

impl EventHandler for NicklistHandler {
    fn event(&self) -> &'static str {
        self.event
    }

    fn interpret(&self, msg: &Message) -> Result<Vec<SessionMutation>> {
        let hda = hdata_of(msg)?;
        let mut out: Vec<SessionMutation> = Vec::new();
        for entry in &hda.entries {
            let (buffer, ne) = nick_entry(hda, entry)?;
            match out.last_mut() {
                Some(SessionMutation::NicklistReplaced {
                    buffer: b,
                    entries,
                }) if *b == buffer => entries.push(ne),
                _ => out.push(SessionMutation::NicklistReplaced {
                    buffer,
                    entries: vec![ne],
                }),
            }
        }
        Ok(out)
    }
}

struct NicklistDiffHandler;

impl EventHandler for NicklistDiffHandler {
    fn event(&self) -> &'static str {
        "_nicklist_diff"
    }

    fn interpret(&self, msg: &Message) -> Result<Vec<SessionMutation>> {
        let hda = hdata_of(msg)?;
        let mut out: Vec<SessionMutation> = Vec::new();
        for entry in &hda.entries {
            let op = match hda.field(entry, "_diff").and_then(Object::as_char) {
                Some(c) if c as u8 == b'^' => NickDiffOp::SelectParent,
                Some(c) if c as u8 == b'+' => NickDiffOp::Add,
                Some(c) if c as u8 == b'-' => NickDiffOp::Remove,
                Some(c) if c as u8 == b'*' => NickDiffOp::Update,
                other => {
                    tracing::warn!(?other, "unrecognized nicklist diff marker, item skipped");
                    continue;
                }
            };
            let (buffer, ne) = nick_entry(hda, entry)?;
            let item = NickDiffItem { op, entry: ne };
            match out.last_mut() {
                Some(SessionMutation::NicklistDiff { buffer: b, items }) if *b == buffer => {
                    items.push(item)
                }
                _ => out.push(SessionMutation::NicklistDiff {
                    buffer,
                    items: vec![item],
                }),
            }
        }
        Ok(out)
    }
}

// --------------------
// inert events
// --------------------

struct PongHandler;

impl EventHandler for PongHandler {
    fn event(&self) -> &'static str {
        "_pong"
    }

    fn interpret(&self, msg: &Message) -> Result<Vec<SessionMutation>> {
        let token = msg.first().and_then(Object::as_str).unwrap_or_default();
        tracing::debug!(token, "pong");
        Ok(Vec::new())
    }
}

/// Recognized events that carry no session mutation.
struct InertEventHandler {
    event: &'static str,
}

impl EventHandler for InertEventHandler {
    fn event(&self) -> &'static str {
        self.event
    }

    fn interpret(&self, _msg: &Message) -> Result<Vec<SessionMutation>> {
        tracing::info!(event = self.event, "relay lifecycle event");
        Ok(Vec::new())
    }
}

struct VersionHandler;

impl EventHandler for VersionHandler {
    fn event(&self) -> &'static str {
        "version"
    }

    fn interpret(&self, msg: &Message) -> Result<Vec<SessionMutation>> {
        if let Some(Object::Info { name, value }) = msg.first() {
            tracing::info!(
                name = name.as_deref().unwrap_or(""),
                value = value.as_deref().unwrap_or(""),
                "relay info"
            );
        }
        Ok(Vec::new())
    }
}
