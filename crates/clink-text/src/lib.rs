//! String and path primitives shared across the line-editor engine.
//!
//! Kept deliberately dependency-light: this crate sits at the bottom of the
//! dependency graph (everything else may use it, it uses nothing above
//! `tracing`), the same role `core-text` plays in the teacher workspace.

pub mod compare;
pub mod path;
pub mod wild;

pub use compare::{CompareScope, str_compare};
pub use wild::{WildFlags, match_wild};
