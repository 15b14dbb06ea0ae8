//! Registers every setting the library crates look up by name
//! (`registry.get("match.compare_scope")` and friends). Each crate falls
//! back to a hardcoded default when a name is absent, so this is about
//! making the defaults visible and overridable through the settings file
//! rather than load-bearing for correctness.

use clink_settings::{Entry, Registry, Value};

pub fn register_known_settings(registry: &mut Registry) -> anyhow::Result<()> {
    registry.register(Entry {
        name: "match.compare_scope".to_string(),
        friendly_name: "Match comparison scope".to_string(),
        description: "String comparison used when generating and sorting matches".to_string(),
        default: Value::Enum(0),
        current: Value::Enum(0),
        enum_options: vec!["exact".into(), "caseless".into(), "relaxed".into()],
    })?;
    registry.register(Entry {
        name: "match.max_width".to_string(),
        friendly_name: "Match column width".to_string(),
        description: "Maximum width of the match display, in columns".to_string(),
        default: Value::Int(100),
        current: Value::Int(100),
        enum_options: Vec::new(),
    })?;
    registry.register_bool(
        "match.vertical",
        "Vertical match layout",
        "Fill match columns top-to-bottom before moving right",
        true,
    )?;
    registry.register(Entry {
        name: "match.query_threshold".to_string(),
        friendly_name: "Match query threshold".to_string(),
        description: "Ask before listing more than this many matches".to_string(),
        default: Value::Int(100),
        current: Value::Int(100),
        enum_options: Vec::new(),
    })?;
    registry.register(Entry {
        name: "history.dupe_mode".to_string(),
        friendly_name: "History dupe mode".to_string(),
        description: "How repeated lines are recorded: add, ignore, or erase the earlier dupe".to_string(),
        default: Value::Enum(2),
        current: Value::Enum(2),
        enum_options: vec!["add".into(), "ignore".into(), "erase_prior".into()],
    })?;
    registry.register_bool(
        "history.ignore_space",
        "History ignore leading space",
        "Skip recording lines that begin with whitespace",
        false,
    )?;
    registry.register(Entry {
        name: "history.min_compact_threshold".to_string(),
        friendly_name: "History compaction threshold".to_string(),
        description: "Tombstoned lines before a compaction rewrite is forced".to_string(),
        default: Value::Int(clink_history::DEFAULT_MIN_COMPACT_THRESHOLD as i64),
        current: Value::Int(clink_history::DEFAULT_MIN_COMPACT_THRESHOLD as i64),
        enum_options: Vec::new(),
    })?;
    Ok(())
}
