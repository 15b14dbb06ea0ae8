//! Host/cmd.exe interception logic (C10): the pure decision layer behind
//! the trap hook and the three steady-state hooks. Actual IAT/detour
//! installation is `clink-winproc::HookSetter`'s job; this module is the
//! byte/string-level logic those hook bodies call into.

use crate::prompt::{is_tagged, tag, untag};

const DEFAULT_AUTOANSWER_PROMPT: &str = "Terminate batch job (Y/N)?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapAction {
    PassThrough,
    /// The trap fired: `GetEnvironmentVariableW("PROMPT")` was seen for the
    /// first time. Caller should write the tagged value back, install the
    /// steady-state hooks, and uninstall the trap (spec §4.10 step 1-3).
    InstallHooksAndRewrite(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The write was a tagged prompt; swallow it (report all bytes
    /// written) and cache the untagged text as the current prompt.
    Swallow,
    PassThrough,
}

pub struct Host {
    trapped: bool,
    captured_prompt: Option<String>,
    autoanswer_prompt: String,
}

impl Default for Host {
    fn default() -> Self {
        Self::new()
    }
}

impl Host {
    pub fn new() -> Self {
        Self {
            trapped: false,
            captured_prompt: None,
            autoanswer_prompt: DEFAULT_AUTOANSWER_PROMPT.to_string(),
        }
    }

    /// Overrides the localised "Terminate batch job (Y/N)?" text pulled
    /// from `cmd.exe.mui`; falls back to the English default when absent.
    pub fn set_autoanswer_prompt(&mut self, localised: Option<String>) {
        self.autoanswer_prompt = localised.unwrap_or_else(|| DEFAULT_AUTOANSWER_PROMPT.to_string());
    }

    pub fn captured_prompt(&self) -> Option<&str> {
        self.captured_prompt.as_deref()
    }

    /// The one-shot trap on `GetEnvironmentVariableW`.
    pub fn on_get_environment_variable(&mut self, name: &str, current_value: Option<&str>) -> TrapAction {
        if self.trapped || !name.eq_ignore_ascii_case("PROMPT") {
            return TrapAction::PassThrough;
        }
        self.trapped = true;
        let tagged = tag(current_value.unwrap_or(""));
        TrapAction::InstallHooksAndRewrite(tagged)
    }

    /// Steady-state `SetEnvironmentVariableW` hook: tags `PROMPT` writes
    /// before forwarding so cmd.exe always sees (and echoes back) a
    /// tagged prompt.
    pub fn on_set_environment_variable(&self, name: &str, value: &str) -> String {
        if name.eq_ignore_ascii_case("PROMPT") {
            tag(value)
        } else {
            value.to_string()
        }
    }

    /// Steady-state `WriteConsoleW` hook.
    pub fn examine_write(&mut self, payload: &str) -> WriteOutcome {
        if is_tagged(payload) {
            self.captured_prompt = Some(untag(payload).to_string());
            WriteOutcome::Swallow
        } else {
            WriteOutcome::PassThrough
        }
    }

    /// Steady-state `ReadConsoleW` hook: `true` means delegate to the
    /// original `ReadConsoleW` rather than invoking the editor.
    pub fn should_delegate_read(&self, is_char_device: bool, max_chars: u32) -> bool {
        !is_char_device || max_chars == 1 || self.captured_prompt.is_none()
    }

    /// Auto-answer subsystem: matches a `max_chars==1` prompt's visible
    /// text against the localised "Terminate batch job" string.
    pub fn auto_answer(&self, prompt_text: &str, setting_enabled: bool) -> Option<char> {
        if setting_enabled && prompt_text.contains(&self.autoanswer_prompt) {
            Some('Y')
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trap_fires_once_on_prompt_lookup() {
        let mut h = Host::new();
        let action = h.on_get_environment_variable("PROMPT", Some("$P$G"));
        assert!(matches!(action, TrapAction::InstallHooksAndRewrite(_)));
        let second = h.on_get_environment_variable("PROMPT", Some("$P$G"));
        assert_eq!(second, TrapAction::PassThrough);
    }

    #[test]
    fn trap_ignores_other_variables() {
        let mut h = Host::new();
        assert_eq!(h.on_get_environment_variable("PATH", Some("x")), TrapAction::PassThrough);
    }

    #[test]
    fn set_prompt_tags_value() {
        let h = Host::new();
        let out = h.on_set_environment_variable("PROMPT", "$P$G");
        assert!(is_tagged(&out));
    }

    #[test]
    fn write_of_tagged_prompt_is_swallowed_and_cached() {
        let mut h = Host::new();
        let tagged = tag("C:\\>");
        assert_eq!(h.examine_write(&tagged), WriteOutcome::Swallow);
        assert_eq!(h.captured_prompt(), Some("C:\\>"));
    }

    #[test]
    fn write_of_untagged_text_passes_through() {
        let mut h = Host::new();
        assert_eq!(h.examine_write("hello"), WriteOutcome::PassThrough);
        assert_eq!(h.captured_prompt(), None);
    }

    #[test]
    fn read_delegates_until_prompt_captured() {
        let h = Host::new();
        assert!(h.should_delegate_read(true, 80));
    }

    #[test]
    fn read_delegates_for_single_char_prompts() {
        let mut h = Host::new();
        h.examine_write(&tag("C:\\>"));
        assert!(h.should_delegate_read(true, 1));
    }

    #[test]
    fn read_uses_editor_once_prompt_captured() {
        let mut h = Host::new();
        h.examine_write(&tag("C:\\>"));
        assert!(!h.should_delegate_read(true, 80));
    }

    #[test]
    fn autoanswer_matches_localised_prompt() {
        let mut h = Host::new();
        h.set_autoanswer_prompt(Some("Trabajo por lotes terminado (S/N)?".to_string()));
        assert_eq!(h.auto_answer("Trabajo por lotes terminado (S/N)?", true), Some('Y'));
        assert_eq!(h.auto_answer("something else", true), None);
        assert_eq!(h.auto_answer("Trabajo por lotes terminado (S/N)?", false), None);
    }
}
