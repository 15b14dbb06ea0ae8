pub mod bank;
pub mod expand;
pub mod sticky;
pub mod store;

pub use bank::{Bank, ConcurrencyTag, LineId};
pub use expand::{expand, ExpandMode, ExpandResult};
pub use sticky::StickySearch;
pub use store::{default_history_path, DupeMode, HistoryStore, DEFAULT_MIN_COMPACT_THRESHOLD};
