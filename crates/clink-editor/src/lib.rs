//! The line editor: module protocol (C13) and the begin/update/end loop
//! that dispatches resolved key bindings through it (C14).

pub mod context;
pub mod line_buffer;
pub mod line_editor;
pub mod match_set;
pub mod module;

pub use context::EditorContext;
pub use line_buffer::LineBuffer;
pub use line_editor::{EditorError, LineEditor, LineResult};
pub use match_set::{MatchEntry, MatchFlags, MatchSet};
pub use module::{EditorModule, ModuleResult, ResolvedInput};
