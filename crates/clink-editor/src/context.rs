//! Editor context (C14): the state a `LineEditor` hands to every module on
//! every callback. Modules hold only a `&mut EditorContext` for the
//! duration of a call, never ownership of it.

use crate::line_buffer::LineBuffer;
use crate::match_set::MatchSet;
use clink_keymap::GroupId;
use clink_settings::Registry;
use clink_text::CompareScope;
use std::path::PathBuf;

/// Name of the registry setting controlling string-comparison scope
/// (spec §4.5 `begin_line` step 2: "apply string-comparison scope per
/// settings (`exact` / `caseless` / `relaxed`)").
pub const COMPARE_SCOPE_SETTING: &str = "match.compare_scope";

fn compare_scope_from_registry(registry: &Registry) -> CompareScope {
    match registry.get(COMPARE_SCOPE_SETTING) {
        Some(clink_settings::Value::Enum(1)) => CompareScope::Caseless,
        Some(clink_settings::Value::Enum(2)) => CompareScope::Relaxed,
        _ => CompareScope::Exact,
    }
}

pub struct EditorContext {
    pub line: LineBuffer,
    pub matches: MatchSet,
    pub compare_scope: CompareScope,
    /// Set by a module via [`Self::set_bind_group`]; consumed by the loop
    /// after the current binding finishes dispatching.
    pending_group: Option<GroupId>,
    /// Stack of groups entered via `set_bind_group`, so `pass` can restore
    /// the one below (spec §4.5 step 3: "`pass` (restore previous bind
    /// group...)").
    group_stack: Vec<GroupId>,
    saved_cwd: Option<PathBuf>,
}

impl EditorContext {
    pub fn new(registry: &Registry) -> Self {
        Self {
            line: LineBuffer::new(),
            matches: MatchSet::new(),
            compare_scope: compare_scope_from_registry(registry),
            pending_group: None,
            group_stack: Vec::new(),
            saved_cwd: None,
        }
    }

    /// Requests that the loop switch the resolver into `group` after the
    /// current dispatch completes (spec §4.5 step 3: "A module may call
    /// `set_bind_group(new_group)` to enter a sub-mode").
    pub fn set_bind_group(&mut self, group: GroupId) {
        self.pending_group = Some(group);
    }

    pub(crate) fn take_pending_group(&mut self) -> Option<GroupId> {
        self.pending_group.take()
    }

    pub(crate) fn push_group(&mut self, group: GroupId) {
        self.group_stack.push(group);
    }

    pub(crate) fn pop_group(&mut self) -> Option<GroupId> {
        self.group_stack.pop()
    }

    /// Re-reads the compare-scope setting (spec §4.5 `begin_line` step 2).
    pub(crate) fn apply_compare_scope(&mut self, registry: &Registry) {
        self.compare_scope = compare_scope_from_registry(registry);
    }

    pub(crate) fn save_cwd(&mut self, cwd: PathBuf) {
        self.saved_cwd = Some(cwd);
    }

    pub(crate) fn take_saved_cwd(&mut self) -> Option<PathBuf> {
        self.saved_cwd.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clink_settings::{Registry, Value};

    #[test]
    fn defaults_to_exact_scope_when_setting_absent() {
        let registry = Registry::new();
        let ctx = EditorContext::new(&registry);
        assert_eq!(ctx.compare_scope, CompareScope::Exact);
    }

    #[test]
    fn reads_caseless_scope_from_registry() {
        let mut registry = Registry::new();
        registry
            .register(clink_settings::Entry {
                name: COMPARE_SCOPE_SETTING.to_string(),
                friendly_name: "Compare scope".to_string(),
                description: "".to_string(),
                default: Value::Enum(0),
                current: Value::Enum(1),
                enum_options: vec!["exact".into(), "caseless".into(), "relaxed".into()],
            })
            .unwrap();
        let ctx = EditorContext::new(&registry);
        assert_eq!(ctx.compare_scope, CompareScope::Caseless);
    }

    #[test]
    fn bind_group_request_is_consumed_once() {
        let registry = Registry::new();
        let mut ctx = EditorContext::new(&registry);
        ctx.set_bind_group(3);
        assert_eq!(ctx.take_pending_group(), Some(3));
        assert_eq!(ctx.take_pending_group(), None);
    }

    #[test]
    fn group_stack_pushes_and_pops() {
        let registry = Registry::new();
        let mut ctx = EditorContext::new(&registry);
        ctx.push_group(0);
        ctx.push_group(2);
        assert_eq!(ctx.pop_group(), Some(2));
        assert_eq!(ctx.pop_group(), Some(0));
        assert_eq!(ctx.pop_group(), None);
    }
}
