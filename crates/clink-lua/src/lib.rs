//! Lua bridge (C19): script loading, the `path.*` helper table, the
//! `line_state` argument builder, a Lua-backed match generator, and a
//! Lua-backed prompt filter. Kept at interface level — what a loaded script
//! does with these entry points is opaque by design.

pub mod line_state;
pub mod match_generator;
pub mod path_api;
pub mod prompt_filter;
pub mod script_loader;

pub use match_generator::LuaMatchGenerator;
pub use prompt_filter::PromptFilter;
pub use script_loader::load_scripts_from_dir;
