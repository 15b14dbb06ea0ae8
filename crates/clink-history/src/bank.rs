//! Bank identity and the master file's concurrency tag.
//!
//! Grounded on `original_source/clink/lib/include/lib/history_db.h`'s
//! `concurrency_tag`/`bank_*` enum for the exact shape: a short opaque tag
//! stamped at compaction time so a reader can tell whether another process
//! rewrote the master file underneath it.

use std::fmt;

/// Matches `history_db.h`'s `bank_master`/`bank_session` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bank {
    Master,
    Session,
}

pub type LineId = u32;

/// Opaque per-compaction stamp. `history_db.h` caps the tag at 64 bytes; we
/// keep the same cap for parity even though a `String` doesn't need it.
pub const TAG_MAX_LEN: usize = 64;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConcurrencyTag(String);

impl ConcurrencyTag {
    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn set(&mut self, tag: &str) {
        self.0 = tag.chars().take(TAG_MAX_LEN - 1).collect();
    }

    /// Derives a fresh tag from a monotonically increasing counter (real
    /// Clink mixes in PID and a random salt; a counter is enough to give
    /// every compaction a distinguishable stamp here).
    pub fn generate(seed: u64) -> Self {
        Self(format!("ctag-{seed:016x}"))
    }
}

impl fmt::Display for ConcurrencyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
