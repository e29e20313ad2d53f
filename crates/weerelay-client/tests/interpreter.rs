//! Event interpreter tests: decoded messages -> mutations.

use weerelay_client::dispatch::EventRegistry;
use weerelay_client::session::{NickDiffOp, SessionMutation};
use weerelay_proto::wire::{Hdata, HdataEntry, HdataSchema, Message, Object, Pointer};
use weerelay_proto::ErrorKind;

fn schema(path: &str, keys: &str) -> HdataSchema {
    HdataSchema::parse(path, keys).unwrap()
}

fn msg(id: &str, objects: Vec<Object>) -> Message {
    Message {
        id: id.to_string(),
        objects,
    }
}

#[test]
fn one_line_entry_yields_exactly_one_line_added() {
    let hda = Hdata {
        schema: schema(
            "buffer/lines/line/line_data",
            "date:tim,prefix:str,message:str",
        ),
        entries: vec![HdataEntry {
            pointers: vec![
                Pointer::from("b1"),
                Pointer::from("c1"),
                Pointer::from("d1"),
                Pointer::from("e1"),
            ],
            values: vec![
                Object::Time(1000),
                Object::Str(Some("nick".to_string())),
                Object::Str(Some("hi".to_string())),
            ],
        }],
    };

    let registry = EventRegistry::with_builtin();
    let muts = registry
        .interpret(&msg("_buffer_line_added", vec![Object::Hdata(hda)]))
        .unwrap();

    assert_eq!(muts.len(), 1);
    match &muts[0] {
        SessionMutation::LineAdded { line } => {
            assert_eq!(line.buffer, Pointer::from("b1"));
            assert_eq!(line.timestamp, 1000);
            assert_eq!(line.prefix.as_deref(), Some("nick"));
            assert_eq!(line.message, "hi");
            assert!(!line.highlighted);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn listlines_backlog_is_reversed_to_chronological_order() {
    let entry = |buf: &str, line: &str, ts: u64, text: &str| HdataEntry {
        pointers: vec![
            Pointer::from(buf),
            Pointer::from("c0"),
            Pointer::from(line),
            Pointer::from("e0"),
        ],
        values: vec![
            Object::Time(ts),
            Object::Str(None),
            Object::Str(Some(text.to_string())),
        ],
    };
    // Newest first, as the relay delivers backlog.
    let hda = Hdata {
        schema: schema(
            "buffer/lines/line/line_data",
            "date:tim,prefix:str,message:str",
        ),
        entries: vec![
            entry("b1", "l3", 30, "third"),
            entry("b1", "l2", 20, "second"),
            entry("b1", "l1", 10, "first"),
        ],
    };

    let registry = EventRegistry::with_builtin();
    let muts = registry
        .interpret(&msg("listlines", vec![Object::Hdata(hda)]))
        .unwrap();

    let messages: Vec<&str> = muts
        .iter()
        .map(|m| match m {
            SessionMutation::LineAdded { line } => line.message.as_str(),
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(messages, vec!["first", "second", "third"]);
}

#[test]
fn listbuffers_maps_each_entry_to_buffer_opened() {
    let entry = |ptr: &str, number: i32, name: &str| HdataEntry {
        pointers: vec![Pointer::from(ptr)],
        values: vec![
            Object::Int(number),
            Object::Str(Some(name.to_string())),
            Object::Str(None),
            Object::Str(None),
            Object::Hashtable(vec![(
                Object::Str(Some("type".to_string())),
                Object::Str(Some("channel".to_string())),
            )]),
        ],
    };
    let hda = Hdata {
        schema: schema(
            "buffer",
            "number:int,full_name:str,short_name:str,title:str,local_variables:htb",
        ),
        entries: vec![entry("b1", 1, "core.weechat"), entry("b2", 2, "irc.lib.#rust")],
    };

    let registry = EventRegistry::with_builtin();
    let muts = registry
        .interpret(&msg("listbuffers", vec![Object::Hdata(hda)]))
        .unwrap();

    assert_eq!(muts.len(), 2);
    match &muts[1] {
        SessionMutation::BufferOpened {
            pointer,
            number,
            full_name,
            local_variables,
            ..
        } => {
            assert_eq!(pointer, &Pointer::from("b2"));
            assert_eq!(*number, 2);
            assert_eq!(full_name, "irc.lib.#rust");
            assert_eq!(
                local_variables.get("type").map(String::as_str),
                Some("channel")
            );
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn nicklist_diff_markers_map_to_ops() {
    let entry = |ptr: &str, diff: u8, group: i8, name: &str| HdataEntry {
        pointers: vec![Pointer::from("b1"), Pointer::from(ptr)],
        values: vec![
            Object::Char(diff as i8),
            Object::Char(group),
            Object::Char(1),
            Object::Int(if group != 0 { 1 } else { 0 }),
            Object::Str(Some(name.to_string())),
            Object::Str(None),
        ],
    };
    let hda = Hdata {
        schema: schema(
            "buffer/nicklist_item",
            "_diff:chr,group:chr,visible:chr,level:int,name:str,prefix:str",
        ),
        entries: vec![
            entry("g1", b'^', 1, "000|o"),
            entry("n1", b'+', 0, "dave"),
            entry("n2", b'-', 0, "bob"),
            entry("n3", b'*', 0, "alice|away"),
        ],
    };

    let registry = EventRegistry::with_builtin();
    let muts = registry
        .interpret(&msg("_nicklist_diff", vec![Object::Hdata(hda)]))
        .unwrap();

    assert_eq!(muts.len(), 1);
    match &muts[0] {
        SessionMutation::NicklistDiff { buffer, items } => {
            assert_eq!(buffer, &Pointer::from("b1"));
            let ops: Vec<NickDiffOp> = items.iter().map(|i| i.op).collect();
            assert_eq!(
                ops,
                vec![
                    NickDiffOp::SelectParent,
                    NickDiffOp::Add,
                    NickDiffOp::Remove,
                    NickDiffOp::Update,
                ]
            );
            assert!(items[0].entry.group);
            assert_eq!(items[1].entry.name, "dave");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn unknown_event_id_is_nonfatal_and_typed() {
    let registry = EventRegistry::with_builtin();
    let err = registry
        .interpret(&msg("_totally_new_event", Vec::new()))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownEvent);
}

#[test]
fn recognized_inert_events_produce_no_mutations() {
    let registry = EventRegistry::with_builtin();
    for id in ["_pong", "_upgrade", "_upgrade_ended"] {
        let muts = registry
            .interpret(&msg(id, vec![Object::Str(Some("1".to_string()))]))
            .unwrap();
        assert!(muts.is_empty(), "{id} should carry no mutation");
    }
}

#[test]
fn malformed_payload_is_a_decode_error() {
    let registry = EventRegistry::with_builtin();
    // A line event whose payload is not an hdata.
    let err = registry
        .interpret(&msg("_buffer_line_added", vec![Object::Int(7)]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}
