//! Binder (C11): a trie of key chords to `(module, id)` bindings, organised
//! into disjoint named groups (the default group plus sub-mode groups like
//! a pager's `--More--` prompt).
//!
//! Grounded on `core-keymap::MappingTrie` — an arena of nodes addressed by
//! small integer index rather than owning pointers — generalized from a
//! single flat vim-motion trie to Clink's multi-group binder with numeric
//! parameter capture and duplicate-leaf (multi-owner) bindings.

use crate::chord::{ChordError, translate};
use std::collections::HashMap;
use tracing::trace;

/// Arena capacity. Spec §4.3: "a static-size arena of ~512 nodes".
pub const MAX_NODES: usize = 512;
/// Spec §4.3 invariant: "module indices fit in 5 bits (≤32 modules per editor)".
pub const MAX_MODULES: u8 = 32;

pub type NodeIndex = u16;
pub type GroupId = u16;

/// Reserved id marking "catchall for printable characters only" (spec
/// §4.3: "Special id 0xff with key=0").
pub const CATCHALL_ID: u8 = 0xff;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BinderError {
    #[error("binder arena exhausted ({MAX_NODES} nodes)")]
    ArenaFull,
    #[error("module index {0} exceeds 5-bit limit ({MAX_MODULES})")]
    ModuleOutOfRange(u8),
    #[error("unknown group {0}")]
    UnknownGroup(GroupId),
    #[error("invalid chord: {0}")]
    Chord(#[from] ChordError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub module: u8,
    pub id: u8,
}

#[derive(Debug, Clone)]
struct Node {
    key: u8,
    has_params: bool,
    sibling: Option<NodeIndex>,
    child: Option<NodeIndex>,
    depth: u8,
    /// Bindings registered at this exact node, most-recent last. Dispatch
    /// order is reverse (last registration wins first, per spec §4.3).
    bindings: Vec<Binding>,
}

impl Node {
    fn leaf(key: u8, depth: u8) -> Self {
        Self {
            key,
            has_params: false,
            sibling: None,
            child: None,
            depth,
            bindings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
struct Group {
    #[allow(dead_code)]
    hash: u32,
    root: NodeIndex,
}

fn fnv1a(s: &str) -> u32 {
    let mut h: u32 = 0x811c9dc5;
    for b in s.bytes() {
        h ^= b as u32;
        h = h.wrapping_mul(0x01000193);
    }
    h
}

pub struct Binder {
    nodes: Vec<Node>,
    groups: Vec<Group>,
    group_names: HashMap<String, GroupId>,
}

impl Binder {
    pub fn new() -> Self {
        // index 0 is a sentinel ("no node"); index 1 is the default group's
        // root, matching spec §3: "Root index 1".
        let mut nodes = Vec::with_capacity(MAX_NODES);
        nodes.push(Node::leaf(0, 0)); // sentinel
        nodes.push(Node::leaf(0, 0)); // default root
        let mut group_names = HashMap::new();
        group_names.insert("default".to_string(), 0);
        Self {
            nodes,
            groups: vec![Group { hash: fnv1a("default"), root: 1 }],
            group_names,
        }
    }

    pub fn default_group(&self) -> GroupId {
        0
    }

    pub fn get_group(&self, name: &str) -> Option<GroupId> {
        self.group_names.get(name).copied()
    }

    pub fn create_group(&mut self, name: &str) -> Result<GroupId, BinderError> {
        if let Some(id) = self.group_names.get(name) {
            return Ok(*id);
        }
        let root = self.alloc_node(0, 0)?;
        let id = self.groups.len() as GroupId;
        self.groups.push(Group { hash: fnv1a(name), root });
        self.group_names.insert(name.to_string(), id);
        Ok(id)
    }

    fn alloc_node(&mut self, key: u8, depth: u8) -> Result<NodeIndex, BinderError> {
        if self.nodes.len() >= MAX_NODES {
            return Err(BinderError::ArenaFull);
        }
        let idx = self.nodes.len() as NodeIndex;
        self.nodes.push(Node::leaf(key, depth));
        Ok(idx)
    }

    fn group_root(&self, group: GroupId) -> Result<NodeIndex, BinderError> {
        self.groups
            .get(group as usize)
            .map(|g| g.root)
            .ok_or(BinderError::UnknownGroup(group))
    }

    fn find_or_insert_child(&mut self, parent: NodeIndex, key: u8) -> Result<NodeIndex, BinderError> {
        let mut cur = self.nodes[parent as usize].child;
        let mut last: Option<NodeIndex> = None;
        while let Some(idx) = cur {
            if self.nodes[idx as usize].key == key {
                return Ok(idx);
            }
            last = Some(idx);
            cur = self.nodes[idx as usize].sibling;
        }
        let depth = self.nodes[parent as usize].depth + 1;
        let new_idx = self.alloc_node(key, depth)?;
        match last {
            Some(tail) => self.nodes[tail as usize].sibling = Some(new_idx),
            None => self.nodes[parent as usize].child = Some(new_idx),
        }
        Ok(new_idx)
    }

    /// Registers `chord` (in the symbolic grammar of [`crate::chord::translate`])
    /// in `group`, bound to `(module, id)`. `has_params` marks the leaf as
    /// accepting a trailing decimal-digit parameter run (spec §4.4).
    pub fn bind(
        &mut self,
        group: GroupId,
        chord: &str,
        module: u8,
        id: u8,
        has_params: bool,
    ) -> Result<(), BinderError> {
        if module >= MAX_MODULES {
            return Err(BinderError::ModuleOutOfRange(module));
        }
        let bytes = translate(chord)?;
        let mut cur = self.group_root(group)?;
        for &b in &bytes {
            cur = self.find_or_insert_child(cur, b)?;
        }
        let node = &mut self.nodes[cur as usize];
        if !node.bindings.is_empty() {
            trace!(target = "keymap.binder", chord, "duplicate_leaf_appended");
        }
        node.has_params |= has_params;
        node.bindings.push(Binding { module, id });
        Ok(())
    }

    /// Registers the printable-character catchall for `group` (spec §4.3:
    /// "Special id 0xff with key=0").
    pub fn bind_catchall(&mut self, group: GroupId, module: u8) -> Result<(), BinderError> {
        if module >= MAX_MODULES {
            return Err(BinderError::ModuleOutOfRange(module));
        }
        let root = self.group_root(group)?;
        let idx = self.find_or_insert_child(root, 0)?;
        self.nodes[idx as usize].bindings.push(Binding { module, id: CATCHALL_ID });
        Ok(())
    }

    /// `true` if `seq` reaches a bound leaf exactly, `false` if no path
    /// matches, `None` if `seq` is a strict unbound prefix of some binding
    /// (the caller should keep reading — this is the resolver's
    /// "redispatch"/-1 case from spec §4.3).
    pub fn is_bound(&self, group: GroupId, seq: &[u8]) -> Result<Option<bool>, BinderError> {
        let mut cur = self.group_root(group)?;
        for &b in seq {
            match self.find_child(cur, b) {
                Some(next) => cur = next,
                None => return Ok(Some(false)),
            }
        }
        let node = &self.nodes[cur as usize];
        if !node.bindings.is_empty() {
            Ok(Some(true))
        } else if node.child.is_some() {
            Ok(None)
        } else {
            Ok(Some(false))
        }
    }

    fn find_child(&self, parent: NodeIndex, key: u8) -> Option<NodeIndex> {
        let mut cur = self.nodes[parent as usize].child;
        while let Some(idx) = cur {
            if self.nodes[idx as usize].key == key {
                return Some(idx);
            }
            cur = self.nodes[idx as usize].sibling;
        }
        None
    }

    pub(crate) fn root_of(&self, group: GroupId) -> Result<NodeIndex, BinderError> {
        self.group_root(group)
    }
    pub(crate) fn child_of(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.nodes[idx as usize].child
    }
    pub(crate) fn sibling_of(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.nodes[idx as usize].sibling
    }
    pub(crate) fn key_of(&self, idx: NodeIndex) -> u8 {
        self.nodes[idx as usize].key
    }
    pub(crate) fn has_params_of(&self, idx: NodeIndex) -> bool {
        self.nodes[idx as usize].has_params
    }
    pub(crate) fn depth_of(&self, idx: NodeIndex) -> u8 {
        self.nodes[idx as usize].depth
    }
    pub(crate) fn bindings_of(&self, idx: NodeIndex) -> &[Binding] {
        &self.nodes[idx as usize].bindings
    }
}

impl Default for Binder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_bind_and_exact_match() {
        let mut b = Binder::new();
        let g = b.default_group();
        b.bind(g, "ab", 0, 1, false).unwrap();
        assert_eq!(b.is_bound(g, b"ab").unwrap(), Some(true));
        assert_eq!(b.is_bound(g, b"a").unwrap(), None);
        assert_eq!(b.is_bound(g, b"ax").unwrap(), Some(false));
    }

    #[test]
    fn groups_are_disjoint() {
        let mut b = Binder::new();
        let g1 = b.default_group();
        let g2 = b.create_group("pager").unwrap();
        b.bind(g1, "q", 0, 1, false).unwrap();
        assert_eq!(b.is_bound(g2, b"q").unwrap(), Some(false));
        b.bind(g2, "q", 1, 2, false).unwrap();
        assert_eq!(b.is_bound(g2, b"q").unwrap(), Some(true));
    }

    #[test]
    fn get_group_resolves_existing_name() {
        let mut b = Binder::new();
        let created = b.create_group("pager").unwrap();
        assert_eq!(b.get_group("pager"), Some(created));
        assert_eq!(b.get_group("nope"), None);
    }

    #[test]
    fn duplicate_leaf_appends_both_owners() {
        let mut b = Binder::new();
        let g = b.default_group();
        b.bind(g, "x", 0, 1, false).unwrap();
        b.bind(g, "x", 1, 2, false).unwrap();
        let root = b.root_of(g).unwrap();
        let child = b.child_of(root).unwrap();
        assert_eq!(b.bindings_of(child).len(), 2);
    }

    #[test]
    fn module_index_out_of_range_rejected() {
        let mut b = Binder::new();
        let g = b.default_group();
        assert!(matches!(
            b.bind(g, "x", MAX_MODULES, 1, false),
            Err(BinderError::ModuleOutOfRange(_))
        ));
    }

    #[test]
    fn catchall_binds_zero_key() {
        let mut b = Binder::new();
        let g = b.default_group();
        b.bind_catchall(g, 3).unwrap();
        let root = b.root_of(g).unwrap();
        let zero_child = b.child_of(root).unwrap();
        assert_eq!(b.key_of(zero_child), 0);
        assert_eq!(b.bindings_of(zero_child)[0].id, CATCHALL_ID);
    }
}
