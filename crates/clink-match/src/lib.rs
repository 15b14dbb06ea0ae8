//! Match pipeline (C15): generator trait, file-system generator, and the
//! classic Tab/query/pager UI module. LCD computation lives on
//! `clink_editor::MatchSet` since the line editor owns the match set.

pub mod classic_ui;
pub mod file_generator;
pub mod generator;

pub use classic_ui::{layout_columns, ClassicMatchUi};
pub use file_generator::FileGenerator;
pub use generator::{GenerateContext, MatchGenerator};
