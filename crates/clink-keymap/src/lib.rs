//! Key binding: chord grammar translation, the binder trie, and the
//! incremental resolver that walks it as bytes arrive from the terminal.

pub mod binder;
pub mod chord;
pub mod resolver;

pub use binder::{Binder, BinderError, Binding, GroupId, CATCHALL_ID, MAX_MODULES, MAX_NODES};
pub use chord::{translate, to_chord_text, ChordError, BINDABLE_ESC};
pub use resolver::{ResolvedBinding, Resolver};
