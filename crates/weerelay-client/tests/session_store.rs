//! Session store property tests.

use std::collections::{BTreeSet, HashMap};

use weerelay_client::session::{
    Line, NickDiffItem, NickDiffOp, NickEntry, SessionChange, SessionMutation, SessionStore,
};
use weerelay_proto::wire::Pointer;

fn open(ptr: &str, number: i32, full_name: &str) -> SessionMutation {
    SessionMutation::BufferOpened {
        pointer: Pointer::from(ptr),
        number,
        full_name: full_name.to_string(),
        short_name: None,
        title: None,
        local_variables: HashMap::new(),
        hidden: false,
    }
}

fn line(buffer: &str, ptr: &str, n: u64, text: &str) -> SessionMutation {
    SessionMutation::LineAdded {
        line: Line {
            buffer: Pointer::from(buffer),
            pointer: Pointer::from(ptr),
            timestamp: n,
            prefix: Some("nick".to_string()),
            message: text.to_string(),
            tags: BTreeSet::new(),
            highlighted: false,
            displayed: true,
        },
    }
}

fn nick(ptr: &str, name: &str) -> NickEntry {
    NickEntry {
        pointer: Pointer::from(ptr),
        group: false,
        visible: true,
        level: 0,
        name: name.to_string(),
        prefix: None,
    }
}

#[test]
fn lines_keep_arrival_order() {
    let mut store = SessionStore::new(1000);
    store.apply(open("b1", 1, "irc.server"));
    for i in 0..50u64 {
        store.apply(line("b1", &format!("l{i:02x}"), i, &format!("msg {i}")));
    }

    let session = store.session();
    let buf = session.buffer(&Pointer::from("b1")).unwrap();
    let messages: Vec<&str> = buf.lines().map(|l| l.message.as_str()).collect();
    let expected: Vec<String> = (0..50).map(|i| format!("msg {i}")).collect();
    assert_eq!(messages, expected.iter().map(String::as_str).collect::<Vec<_>>());
}

#[test]
fn line_ring_evicts_oldest_first() {
    let mut store = SessionStore::new(10);
    store.apply(open("b1", 1, "irc.server"));
    for i in 0..25u64 {
        let change = store.apply(line("b1", &format!("l{i:02x}"), i, &format!("msg {i}")));
        let expect_evicted = i >= 10;
        assert_eq!(
            change,
            SessionChange::LineAppended {
                buffer: Pointer::from("b1"),
                evicted: expect_evicted,
            },
            "line {i}"
        );
    }

    let buf = store.session().buffer(&Pointer::from("b1")).unwrap();
    assert_eq!(buf.line_count(), 10);
    // Oldest-first eviction: lines 15..25 remain.
    assert_eq!(buf.lines().next().unwrap().message, "msg 15");
    assert_eq!(buf.lines().last().unwrap().message, "msg 24");
}

#[test]
fn reopening_a_buffer_keeps_lines_and_nicklist() {
    let mut store = SessionStore::new(100);
    store.apply(open("b1", 1, "irc.server.#chan"));
    store.apply(line("b1", "l1", 1, "hello"));
    store.apply(SessionMutation::NicklistReplaced {
        buffer: Pointer::from("b1"),
        entries: vec![nick("n1", "alice")],
    });

    let change = store.apply(SessionMutation::BufferOpened {
        pointer: Pointer::from("b1"),
        number: 2,
        full_name: "irc.server.#chan".to_string(),
        short_name: Some("#chan".to_string()),
        title: Some("topic".to_string()),
        local_variables: HashMap::from([("type".to_string(), "channel".to_string())]),
        hidden: false,
    });
    assert_eq!(change, SessionChange::BufferUpdated(Pointer::from("b1")));

    let session = store.session();
    assert_eq!(session.len(), 1);
    let buf = session.buffer(&Pointer::from("b1")).unwrap();
    assert_eq!(buf.number, 2);
    assert_eq!(buf.short_name.as_deref(), Some("#chan"));
    assert_eq!(buf.title.as_deref(), Some("topic"));
    assert_eq!(buf.line_count(), 1);
    assert_eq!(buf.nicklist().nick_count(), 1);
}

#[test]
fn orphan_line_is_a_no_op() {
    let mut store = SessionStore::new(100);
    store.apply(open("b1", 1, "irc.server"));
    let before = store.snapshot();

    let change = store.apply(line("nope", "l1", 1, "lost"));
    assert!(matches!(change, SessionChange::Ignored { .. }));

    let after = store.session();
    assert_eq!(after.len(), before.len());
    assert_eq!(
        after.buffer(&Pointer::from("b1")).unwrap().line_count(),
        before.buffer(&Pointer::from("b1")).unwrap().line_count()
    );
}

#[test]
fn closing_removes_buffer_and_contents() {
    let mut store = SessionStore::new(100);
    store.apply(open("b1", 1, "irc.server"));
    store.apply(open("b2", 2, "irc.server.#chan"));
    store.apply(line("b2", "l1", 1, "bye"));

    let change = store.apply(SessionMutation::BufferClosing {
        pointer: Pointer::from("b2"),
    });
    assert_eq!(change, SessionChange::BufferClosed(Pointer::from("b2")));

    let session = store.session();
    assert_eq!(session.len(), 1);
    assert!(session.buffer(&Pointer::from("b2")).is_none());

    // Closing again is an orphan no-op.
    let change = store.apply(SessionMutation::BufferClosing {
        pointer: Pointer::from("b2"),
    });
    assert!(matches!(change, SessionChange::Ignored { .. }));
}

#[test]
fn buffers_iterate_in_number_order() {
    let mut store = SessionStore::new(100);
    store.apply(open("b3", 3, "three"));
    store.apply(open("b1", 1, "one"));
    store.apply(open("b2", 2, "two"));

    let names: Vec<&str> = store.session().buffers().map(|b| b.full_name.as_str()).collect();
    assert_eq!(names, vec!["one", "two", "three"]);
}

#[test]
fn scalar_mutations_overwrite_in_place() {
    let mut store = SessionStore::new(100);
    store.apply(open("b1", 1, "irc.server.#chan"));

    store.apply(SessionMutation::TitleChanged {
        pointer: Pointer::from("b1"),
        title: Some("new topic".to_string()),
    });
    store.apply(SessionMutation::LocalVarsChanged {
        pointer: Pointer::from("b1"),
        variables: HashMap::from([("nick".to_string(), "me".to_string())]),
    });
    store.apply(SessionMutation::BufferRenamed {
        pointer: Pointer::from("b1"),
        full_name: "irc.server.#renamed".to_string(),
        short_name: Some("#renamed".to_string()),
    });
    store.apply(SessionMutation::LastReadLine {
        pointer: Pointer::from("b1"),
        line: Pointer::from("l9"),
    });

    let buf = store.session().buffer(&Pointer::from("b1")).unwrap();
    assert_eq!(buf.title.as_deref(), Some("new topic"));
    assert_eq!(buf.local_variables.get("nick").map(String::as_str), Some("me"));
    assert_eq!(buf.full_name, "irc.server.#renamed");
    assert_eq!(buf.last_read_line, Some(Pointer::from("l9")));
}

#[test]
fn nicklist_diffs_apply_in_order() {
    let mut store = SessionStore::new(100);
    store.apply(open("b1", 1, "irc.server.#chan"));
    store.apply(SessionMutation::NicklistReplaced {
        buffer: Pointer::from("b1"),
        entries: vec![
            NickEntry {
                pointer: Pointer::from("g0"),
                group: true,
                visible: false,
                level: 0,
                name: "root".to_string(),
                prefix: None,
            },
            nick("n1", "alice"),
            nick("n2", "bob"),
        ],
    });

    store.apply(SessionMutation::NicklistDiff {
        buffer: Pointer::from("b1"),
        items: vec![
            NickDiffItem {
                op: NickDiffOp::Remove,
                entry: nick("n2", "bob"),
            },
            NickDiffItem {
                op: NickDiffOp::SelectParent,
                entry: NickEntry {
                    pointer: Pointer::from("g0"),
                    group: true,
                    visible: false,
                    level: 0,
                    name: "root".to_string(),
                    prefix: None,
                },
            },
            NickDiffItem {
                op: NickDiffOp::Add,
                entry: nick("n3", "carol"),
            },
        ],
    });

    let buf = store.session().buffer(&Pointer::from("b1")).unwrap();
    let names: Vec<&str> = buf.nicklist().nicks().iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["alice", "carol"]);
}

#[test]
fn lines_cleared_empties_the_ring() {
    let mut store = SessionStore::new(100);
    store.apply(open("b1", 1, "irc.server"));
    store.apply(line("b1", "l1", 1, "a"));
    store.apply(line("b1", "l2", 2, "b"));

    let change = store.apply(SessionMutation::LinesCleared {
        pointer: Pointer::from("b1"),
    });
    assert_eq!(change, SessionChange::LinesCleared(Pointer::from("b1")));
    assert_eq!(store.session().buffer(&Pointer::from("b1")).unwrap().line_count(), 0);
}

#[test]
fn snapshots_are_detached_from_later_writes() {
    let mut store = SessionStore::new(100);
    store.apply(open("b1", 1, "irc.server"));
    let snap = store.snapshot();

    store.apply(line("b1", "l1", 1, "after the snapshot"));
    assert_eq!(snap.buffer(&Pointer::from("b1")).unwrap().line_count(), 0);
    assert_eq!(store.session().buffer(&Pointer::from("b1")).unwrap().line_count(), 1);
}
