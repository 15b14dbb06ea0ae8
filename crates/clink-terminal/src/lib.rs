//! Console I/O translation (C8): raw `INPUT_RECORD` decoding into xterm-style
//! byte sequences, and an ECMA-48-aware output writer that turns SGR codes
//! into `SetConsoleTextAttribute` calls.
//!
//! Grounded on `core-terminal::CrosstermBackend`/`TerminalGuard` — kept the
//! RAII enter/leave guard shape — generalized from crossterm's portable
//! raw-mode toggle to saving and restoring the real Win32 console mode
//! directly, since Clink needs the low-level `INPUT_RECORD` stream
//! crossterm doesn't expose.

pub mod input;
pub mod mode;
pub mod output;

pub use input::{translate_key_event, KeyEvent, ENHANCED_KEY};
pub use mode::{ConsoleModeGuard, TerminalBackend};
pub use output::OutputTranslator;

#[derive(Debug, thiserror::Error)]
pub enum TerminalError {
    #[error("console call failed: {0}")]
    Win32(u32),
    #[error("not supported on this target")]
    Unsupported,
}

pub type Result<T> = std::result::Result<T, TerminalError>;
