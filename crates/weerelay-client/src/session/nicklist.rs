//! Nicklist tree: explicit parent→children ownership plus a pointer-indexed
//! lookup table so diff application stays O(1) per item.
//!
//! Nodes never hold a back-reference to their buffer; the buffer owns the
//! whole tree.

use std::collections::HashMap;

use weerelay_proto::wire::Pointer;

use crate::session::types::{NickDiffItem, NickDiffOp, NickEntry};

#[derive(Debug, Clone, PartialEq)]
pub struct NickGroup {
    pub pointer: Pointer,
    pub name: String,
    pub visible: bool,
    pub level: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Nick {
    pub pointer: Pointer,
    pub name: String,
    pub prefix: Option<String>,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NicklistItem {
    Group(NickGroup),
    Nick(Nick),
}

#[derive(Debug, Clone, PartialEq)]
struct Node {
    parent: Option<Pointer>,
    children: Vec<Pointer>,
    item: NicklistItem,
}

/// The hierarchical participant list of one buffer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Nicklist {
    nodes: HashMap<Pointer, Node>,
    roots: Vec<Pointer>,
}

fn item_from(e: &NickEntry) -> NicklistItem {
    if e.group {
        NicklistItem::Group(NickGroup {
            pointer: e.pointer.clone(),
            name: e.name.clone(),
            visible: e.visible,
            level: e.level,
        })
    } else {
        NicklistItem::Nick(Nick {
            pointer: e.pointer.clone(),
            name: e.name.clone(),
            prefix: e.prefix.clone(),
            visible: e.visible,
        })
    }
}

impl Nicklist {
    pub fn new() -> Nicklist {
        Nicklist::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, pointer: &Pointer) -> bool {
        self.nodes.contains_key(pointer)
    }

    pub fn item(&self, pointer: &Pointer) -> Option<&NicklistItem> {
        self.nodes.get(pointer).map(|n| &n.item)
    }

    /// Number of nick (non-group) nodes.
    pub fn nick_count(&self) -> usize {
        self.nodes
            .values()
            .filter(|n| matches!(n.item, NicklistItem::Nick(_)))
            .count()
    }

    /// Group names from the root down to the node's parent.
    pub fn group_path(&self, pointer: &Pointer) -> Vec<String> {
        let mut names = Vec::new();
        let mut cur = self.nodes.get(pointer).and_then(|n| n.parent.as_ref());
        while let Some(p) = cur {
            let Some(node) = self.nodes.get(p) else { break };
            if let NicklistItem::Group(g) = &node.item {
                names.push(g.name.clone());
            }
            cur = node.parent.as_ref();
        }
        names.reverse();
        names
    }

    /// All nicks in tree (depth-first) order.
    pub fn nicks(&self) -> Vec<&Nick> {
        let mut out = Vec::new();
        let mut stack: Vec<&Pointer> = self.roots.iter().rev().collect();
        while let Some(p) = stack.pop() {
            if let Some(node) = self.nodes.get(p) {
                if let NicklistItem::Nick(n) = &node.item {
                    out.push(n);
                }
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    /// Build a fresh tree from a full listing. Entries arrive in tree order;
    /// a group at level L attaches under the most recent group at a lower
    /// level, a nick under the most recent group.
    pub(crate) fn rebuild(entries: &[NickEntry]) -> Nicklist {
        let mut list = Nicklist::new();
        let mut stack: Vec<(i32, Pointer)> = Vec::new();
        for e in entries {
            if e.group {
                while stack.last().is_some_and(|(lvl, _)| *lvl >= e.level) {
                    stack.pop();
                }
                let parent = stack.last().map(|(_, p)| p.clone());
                list.insert_under(parent.as_ref(), e);
                stack.push((e.level, e.pointer.clone()));
            } else {
                let parent = stack.last().map(|(_, p)| p.clone());
                list.insert_under(parent.as_ref(), e);
            }
        }
        list
    }

    /// Apply diff items in order. `^` selects the parent group for the items
    /// that follow it.
    pub(crate) fn apply_diff(&mut self, items: &[NickDiffItem]) {
        let mut parent: Option<Pointer> = None;
        for it in items {
            match it.op {
                NickDiffOp::SelectParent => {
                    if !self.contains(&it.entry.pointer) {
                        self.insert_under(None, &it.entry);
                    }
                    parent = Some(it.entry.pointer.clone());
                }
                NickDiffOp::Add => {
                    if self.contains(&it.entry.pointer) {
                        self.update(&it.entry);
                    } else {
                        self.insert_under(parent.as_ref(), &it.entry);
                    }
                }
                NickDiffOp::Remove => self.remove_subtree(&it.entry.pointer),
                NickDiffOp::Update => self.update(&it.entry),
            }
        }
    }

    fn insert_under(&mut self, parent: Option<&Pointer>, e: &NickEntry) {
        let parent = parent.filter(|p| self.nodes.contains_key(p)).cloned();
        match &parent {
            Some(p) => {
                if let Some(pn) = self.nodes.get_mut(p) {
                    pn.children.push(e.pointer.clone());
                }
            }
            None => self.roots.push(e.pointer.clone()),
        }
        self.nodes.insert(
            e.pointer.clone(),
            Node {
                parent,
                children: Vec::new(),
                item: item_from(e),
            },
        );
    }

    /// Replace a node's fields in place, keeping its position in the tree.
    /// An update for an unknown pointer falls back to a root insert so a
    /// missed add does not lose the nick entirely.
    fn update(&mut self, e: &NickEntry) {
        match self.nodes.get_mut(&e.pointer) {
            Some(node) => node.item = item_from(e),
            None => self.insert_under(None, e),
        }
    }

    fn remove_subtree(&mut self, pointer: &Pointer) {
        let Some(node) = self.nodes.remove(pointer) else {
            return;
        };
        match &node.parent {
            Some(parent) => {
                if let Some(pn) = self.nodes.get_mut(parent) {
                    pn.children.retain(|c| c != pointer);
                }
            }
            None => self.roots.retain(|c| c != pointer),
        }
        let mut pending = node.children;
        while let Some(p) = pending.pop() {
            if let Some(n) = self.nodes.remove(&p) {
                pending.extend(n.children);
            }
        }
    }
}
