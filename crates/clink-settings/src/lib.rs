//! Named, typed, default-valued settings registered process-wide (C4).
//!
//! Grounded on `core-config`'s `Config`/`load_from` shape: `anyhow::Result`
//! at the file-IO boundary, `tracing::info!` on mutation, graceful fallback
//! to defaults on a parse error rather than propagating it.

use anyhow::{Result, anyhow};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    /// Current selection index into the option list.
    Enum(i32),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Bool,
    Int,
    Enum,
    Str,
}

impl Value {
    fn kind(&self) -> Kind {
        match self {
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Int,
            Value::Enum(_) => Kind::Enum,
            Value::Str(_) => Kind::Str,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Entry {
    pub name: String,
    pub friendly_name: String,
    pub description: String,
    pub default: Value,
    pub current: Value,
    pub enum_options: Vec<String>,
}

impl Entry {
    fn validate(&self) -> Result<()> {
        if self.current.kind() != self.default.kind() {
            return Err(anyhow!(
                "setting {} current value kind does not match declared kind",
                self.name
            ));
        }
        if let Value::Enum(v) = self.current
            && !self.enum_options.is_empty()
            && !(0..self.enum_options.len() as i32).contains(&v)
        {
            return Err(anyhow!(
                "setting {} enum value {v} out of range [0,{})",
                self.name,
                self.enum_options.len()
            ));
        }
        Ok(())
    }
}

/// Process-wide registry. Iteration order is newest-registered-first
/// (matching spec §3's "registration order not significant" for semantics,
/// but deterministic for display, per the original's head-insert linked
/// list — and stable under deletion).
#[derive(Debug, Default)]
pub struct Registry {
    order: Vec<String>,
    entries: BTreeMap<String, Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, entry: Entry) -> Result<()> {
        entry.validate()?;
        if self.entries.contains_key(&entry.name) {
            return Err(anyhow!("duplicate setting name {}", entry.name));
        }
        self.order.insert(0, entry.name.clone());
        self.entries.insert(entry.name.clone(), entry);
        Ok(())
    }

    pub fn register_bool(&mut self, name: &str, friendly: &str, desc: &str, default: bool) -> Result<()> {
        self.register(Entry {
            name: name.to_string(),
            friendly_name: friendly.to_string(),
            description: desc.to_string(),
            default: Value::Bool(default),
            current: Value::Bool(default),
            enum_options: Vec::new(),
        })
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name).map(|e| &e.current)
    }

    pub fn set(&mut self, name: &str, value: Value) -> Result<()> {
        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| anyhow!("unknown setting {name}"))?;
        if entry.default.kind() != value.kind() {
            return Err(anyhow!("setting {name} kind mismatch"));
        }
        entry.current = value;
        entry.validate()?;
        info!(target = "settings", name, "setting_changed");
        Ok(())
    }

    pub fn delete(&mut self, name: &str) -> bool {
        if self.entries.remove(name).is_some() {
            self.order.retain(|n| n != name);
            true
        } else {
            false
        }
    }

    /// Iterates newest-registered first.
    pub fn iter_insertion_order(&self) -> impl Iterator<Item = &Entry> {
        self.order.iter().filter_map(|n| self.entries.get(n))
    }

    /// Loads a plain-text `key=value` file, applying recognised keys and
    /// leaving unrecognised ones untouched in a side table so a later
    /// `save_to` preserves them verbatim (spec §6: "unknown keys preserved
    /// on rewrite").
    pub fn load_from(&mut self, path: &Path) -> Result<Vec<(String, String)>> {
        let mut unknown = Vec::new();
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Ok(unknown),
        };
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((k, v)) = line.split_once('=') else {
                continue;
            };
            let (k, v) = (k.trim(), v.trim());
            if let Some(entry) = self.entries.get_mut(k) {
                if let Some(parsed) = parse_value(entry.current.kind(), v) {
                    entry.current = parsed;
                } else {
                    warn!(target = "settings", key = k, value = v, "settings_parse_failed");
                }
            } else {
                unknown.push((k.to_string(), v.to_string()));
            }
        }
        Ok(unknown)
    }

    /// Serialises all known settings plus any preserved unknown lines.
    pub fn save_to(&self, path: &Path, unknown: &[(String, String)]) -> Result<()> {
        let mut out = String::new();
        for entry in self.iter_insertion_order() {
            out.push_str(&entry.name);
            out.push('=');
            out.push_str(&render_value(&entry.current));
            out.push('\n');
        }
        for (k, v) in unknown {
            out.push_str(k);
            out.push('=');
            out.push_str(v);
            out.push('\n');
        }
        fs::write(path, out)?;
        Ok(())
    }
}

fn parse_value(kind: Kind, raw: &str) -> Option<Value> {
    match kind {
        Kind::Bool => match raw {
            "0" | "false" => Some(Value::Bool(false)),
            "1" | "true" => Some(Value::Bool(true)),
            _ => None,
        },
        Kind::Int => raw.parse::<i64>().ok().map(Value::Int),
        Kind::Enum => raw.parse::<i32>().ok().map(Value::Enum),
        Kind::Str => Some(Value::Str(raw.to_string())),
    }
}

fn render_value(v: &Value) -> String {
    match v {
        Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Enum(i) => i.to_string(),
        Value::Str(s) => s.clone(),
    }
}

/// Best-effort per-user config directory, following the same local-first
/// discovery order as the teacher's `core-config::discover`.
pub fn discover_settings_path() -> PathBuf {
    let local = PathBuf::from("clink_settings");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("clink").join("settings");
    }
    PathBuf::from("clink_settings")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_bools() -> Registry {
        let mut r = Registry::new();
        for n in ["one", "two", "three", "four"] {
            r.register_bool(n, n, n, false).unwrap();
        }
        r
    }

    #[test]
    fn insertion_order_iteration() {
        let r = four_bools();
        let names: Vec<_> = r.iter_insertion_order().map(|e| e.name.clone()).collect();
        assert_eq!(names, vec!["four", "three", "two", "one"]);
    }

    #[test]
    fn delete_preserves_remaining_order() {
        // S5: registration order one,two,three,four; delete three, then one.
        let mut r = four_bools();
        assert!(r.delete("three"));
        let names: Vec<_> = r.iter_insertion_order().map(|e| e.name.clone()).collect();
        assert_eq!(names, vec!["four", "two", "one"]);
        assert!(r.delete("one"));
        let names: Vec<_> = r.iter_insertion_order().map(|e| e.name.clone()).collect();
        assert_eq!(names, vec!["four", "two"]);
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut r = four_bools();
        assert!(r.register_bool("one", "x", "x", true).is_err());
    }

    #[test]
    fn enum_out_of_range_rejected() {
        let mut r = Registry::new();
        let entry = Entry {
            name: "mode".into(),
            friendly_name: "Mode".into(),
            description: "".into(),
            default: Value::Enum(0),
            current: Value::Enum(5),
            enum_options: vec!["a".into(), "b".into()],
        };
        assert!(r.register(entry).is_err());
    }

    #[test]
    fn load_preserves_unknown_keys() {
        let mut r = four_bools();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings");
        fs::write(&path, "one=1\nmystery.key=42\n").unwrap();
        let unknown = r.load_from(&path).unwrap();
        assert_eq!(r.get("one"), Some(&Value::Bool(true)));
        assert_eq!(unknown, vec![("mystery.key".to_string(), "42".to_string())]);
        r.save_to(&path, &unknown).unwrap();
        let roundtrip = fs::read_to_string(&path).unwrap();
        assert!(roundtrip.contains("mystery.key=42"));
    }
}
