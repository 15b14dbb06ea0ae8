//! Bind resolver (C12): incremental byte-by-byte matcher against a
//! [`Binder`], with digit-parameter accumulation and a bounded rolling
//! buffer (spec §4.4: "Buffer capacity ≤16 bytes").
//!
//! The binder is passed into each call rather than stored, so a resolver's
//! in-flight state (buffer, accumulated params, pending bindings) can
//! outlive any single borrow of the binder it's stepping through --
//! callers that want to own both together (the line editor loop) aren't
//! forced into a self-referential struct.

use crate::binder::{Binder, Binding, GroupId, NodeIndex};
use smallvec::SmallVec;

const BUF_CAP: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBinding {
    pub module: u8,
    pub id: u8,
    pub consumed_length: usize,
    pub params: SmallVec<[u16; 4]>,
}

pub struct Resolver {
    group: GroupId,
    node: NodeIndex,
    buf: [u8; BUF_CAP],
    len: u8,
    param_bytes: usize,
    cur_digit: Option<u32>,
    params: SmallVec<[u16; 4]>,
    /// Bindings queued at the most recently reached leaf, drained by `next()`
    /// in reverse-registration order (last bound wins first).
    pending: Vec<Binding>,
    pending_consumed: usize,
}

impl Resolver {
    pub fn new(binder: &Binder) -> Self {
        let group = binder.default_group();
        let node = binder.root_of(group).expect("default group always exists");
        Self {
            group,
            node,
            buf: [0; BUF_CAP],
            len: 0,
            param_bytes: 0,
            cur_digit: None,
            params: SmallVec::new(),
            pending: Vec::new(),
            pending_consumed: 0,
        }
    }

    pub fn get_group(&self) -> GroupId {
        self.group
    }

    pub fn set_group(&mut self, binder: &Binder, group: GroupId) {
        self.group = group;
        self.reset(binder);
    }

    /// Returns to the group root, dropping any in-flight buffer/params.
    pub fn reset(&mut self, binder: &Binder) {
        self.node = binder.root_of(self.group).unwrap_or(1);
        self.len = 0;
        self.param_bytes = 0;
        self.cur_digit = None;
        self.params.clear();
        self.pending.clear();
        self.pending_consumed = 0;
    }

    fn find_child(&self, binder: &Binder, parent: NodeIndex, key: u8) -> Option<NodeIndex> {
        let mut cur = binder.child_of(parent);
        while let Some(idx) = cur {
            if binder.key_of(idx) == key {
                return Some(idx);
            }
            cur = binder.sibling_of(idx);
        }
        None
    }

    /// Feeds one byte. Returns `true` if a bound leaf was reached and the
    /// caller should drain it via repeated [`Self::next`] calls.
    pub fn step(&mut self, binder: &Binder, byte: u8) -> bool {
        if self.len as usize >= BUF_CAP {
            self.reset(binder);
            return false;
        }
        self.buf[self.len as usize] = byte;
        self.len += 1;

        if binder.has_params_of(self.node) && byte.is_ascii_digit() {
            let d = (byte - b'0') as u32;
            self.cur_digit = Some(self.cur_digit.unwrap_or(0).saturating_mul(10).saturating_add(d));
            self.param_bytes += 1;
            return false;
        }

        if let Some(d) = self.cur_digit.take() {
            self.params.push(d.min(u16::MAX as u32) as u16);
        }

        let exact = self.find_child(binder, self.node, byte);
        match exact.or_else(|| self.find_child(binder, self.node, 0)) {
            Some(next) => {
                let consumed_bytes = if exact.is_some() { 1 } else { 0 };
                self.node = next;
                self.param_bytes += consumed_bytes;
                let bindings = binder.bindings_of(self.node);
                if !bindings.is_empty() {
                    self.pending = bindings.iter().rev().copied().collect();
                    self.pending_consumed = binder.depth_of(self.node) as usize + self.param_bytes;
                    true
                } else {
                    false
                }
            }
            None => {
                self.reset(binder);
                false
            }
        }
    }

    /// Drains the next queued binding at the current leaf, if any.
    pub fn next(&mut self) -> Option<ResolvedBinding> {
        let binding = self.pending.pop()?;
        Some(ResolvedBinding {
            module: binding.module,
            id: binding.id,
            consumed_length: self.pending_consumed,
            params: self.params.clone(),
        })
    }

    /// Reproduces the exact bytes matched for the current (just-resolved)
    /// chord into `out`.
    pub fn get_chord(&self, out: &mut Vec<u8>) {
        out.clear();
        out.extend_from_slice(&self.buf[..self.len as usize]);
    }

    /// Commits the currently pending match: once every queued binding at
    /// this leaf has been claimed, the resolver returns to the group root
    /// so the next `step()` starts a fresh chord.
    pub fn claim(&mut self, binder: &Binder) {
        if self.pending.is_empty() {
            self.reset(binder);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::Binder;

    #[test]
    fn single_byte_chord_resolves_immediately() {
        let mut b = Binder::new();
        let g = b.default_group();
        b.bind(g, "q", 0, 1, false).unwrap();
        let mut r = Resolver::new(&b);
        assert!(r.step(&b, b'q'));
        let bound = r.next().unwrap();
        assert_eq!((bound.module, bound.id, bound.consumed_length), (0, 1, 1));
        assert!(r.next().is_none());
    }

    #[test]
    fn multi_byte_chord_needs_full_sequence() {
        let mut b = Binder::new();
        let g = b.default_group();
        b.bind(g, "ab", 0, 7, false).unwrap();
        let mut r = Resolver::new(&b);
        assert!(!r.step(&b, b'a'));
        assert!(r.next().is_none());
        assert!(r.step(&b, b'b'));
        let bound = r.next().unwrap();
        assert_eq!(bound.consumed_length, 2);
    }

    #[test]
    fn duplicate_owners_dispatch_last_registered_first() {
        let mut b = Binder::new();
        let g = b.default_group();
        b.bind(g, "x", 0, 1, false).unwrap();
        b.bind(g, "x", 1, 2, false).unwrap();
        let mut r = Resolver::new(&b);
        assert!(r.step(&b, b'x'));
        let first = r.next().unwrap();
        assert_eq!((first.module, first.id), (1, 2));
        let second = r.next().unwrap();
        assert_eq!((second.module, second.id), (0, 1));
        assert!(r.next().is_none());
    }

    #[test]
    fn param_digits_accumulate_without_advancing() {
        let mut b = Binder::new();
        let g = b.default_group();
        b.bind(g, "\\eA", 0, 9, true).unwrap();
        let mut r = Resolver::new(&b);
        assert!(!r.step(&b, 0x1b));
        assert!(r.step(&b, b'A'));
        let bound = r.next().unwrap();
        assert_eq!((bound.module, bound.id), (0, 9));
        assert!(bound.params.is_empty());
    }

    #[test]
    fn overflow_resets_resolver() {
        let mut b = Binder::new();
        let g = b.default_group();
        b.bind(g, &"a".repeat(20), 0, 1, false).unwrap();
        let mut r = Resolver::new(&b);
        for _ in 0..16 {
            assert!(!r.step(&b, b'a'));
        }
        assert!(!r.step(&b, b'a'));
        assert_eq!(r.len, 1);
    }

    #[test]
    fn mismatch_resets_to_root() {
        let mut b = Binder::new();
        let g = b.default_group();
        b.bind(g, "ab", 0, 1, false).unwrap();
        let mut r = Resolver::new(&b);
        assert!(!r.step(&b, b'a'));
        assert!(!r.step(&b, b'z'));
        assert!(r.next().is_none());
    }

    #[test]
    fn catchall_matches_unbound_byte() {
        let mut b = Binder::new();
        let g = b.default_group();
        b.bind_catchall(g, 4).unwrap();
        let mut r = Resolver::new(&b);
        assert!(r.step(&b, b'z'));
        let bound = r.next().unwrap();
        assert_eq!(bound.module, 4);
    }

    #[test]
    fn property_consumed_length_bounded_by_chord_and_params() {
        let mut b = Binder::new();
        let g = b.default_group();
        b.bind(g, "ab", 0, 1, false).unwrap();
        let mut r = Resolver::new(&b);
        r.step(&b, b'a');
        let reached = r.step(&b, b'b');
        assert!(reached);
        let bound = r.next().unwrap();
        let chord_bytes = 2;
        let param_len: usize = bound.params.iter().map(|_| 1).sum();
        assert!(bound.consumed_length <= chord_bytes + param_len);
    }
}
