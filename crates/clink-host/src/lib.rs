//! Host-process interception (C9, C10): prompt tagging and the
//! trap/steady-state hook logic that lets Clink recognise cmd.exe's own
//! prompt text and take over `ReadConsoleW`.

pub mod intercept;
pub mod prompt;

pub use intercept::{Host, TrapAction, WriteOutcome};
pub use prompt::{has_hidden_tag, has_plain_tag, is_tagged, tag, untag};

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("console call failed: {0}")]
    Win32(u32),
}

pub type Result<T> = std::result::Result<T, HostError>;
