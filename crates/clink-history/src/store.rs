//! Two-bank persistent history store (C16). Grounded on
//! `core-state/src/undo.rs`'s append/snapshot/capacity discipline and
//! `original_source/clink/lib/include/lib/history_db.h`'s
//! `bank_master`/`bank_session` split, concurrency tag, and
//! `m_min_compact_threshold` constant.

use crate::bank::{Bank, ConcurrencyTag, LineId};
use clink_settings::{Registry, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DupeMode {
    Add,
    Ignore,
    EraseDupe,
}

impl DupeMode {
    fn from_setting(registry: &Registry) -> Self {
        match registry.get("history.dupe_mode") {
            Some(Value::Enum(0)) => DupeMode::Add,
            Some(Value::Enum(1)) => DupeMode::Ignore,
            _ => DupeMode::EraseDupe,
        }
    }
}

#[derive(Debug, Clone)]
struct HistoryLine {
    id: LineId,
    text: String,
    timestamp: Option<u64>,
    tombstoned: bool,
}

/// Matches `history_db.h`'s default `m_min_compact_threshold = 200`.
pub const DEFAULT_MIN_COMPACT_THRESHOLD: usize = 200;

pub struct HistoryStore {
    path: PathBuf,
    master: Vec<HistoryLine>,
    session: Vec<HistoryLine>,
    next_id: LineId,
    tag: ConcurrencyTag,
    tag_seed: u64,
    ignore_space: bool,
    dupe_mode: DupeMode,
    min_compact_threshold: usize,
    use_master_bank: bool,
    pending_write_failure: bool,
}

fn now_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>, registry: &Registry, use_master_bank: bool) -> Self {
        let path = path.into();
        let min_compact_threshold = match registry.get("history.min_compact_threshold") {
            Some(Value::Int(v)) if *v > 0 => *v as usize,
            _ => DEFAULT_MIN_COMPACT_THRESHOLD,
        };
        let mut store = Self {
            path,
            master: Vec::new(),
            session: Vec::new(),
            next_id: 0,
            tag: ConcurrencyTag::empty(),
            tag_seed: 0,
            ignore_space: matches!(registry.get("history.ignore_space"), Some(Value::Bool(true))),
            dupe_mode: DupeMode::from_setting(registry),
            min_compact_threshold,
            use_master_bank,
            pending_write_failure: false,
        };
        store.load_internal();
        store
    }

    fn removals_path(&self) -> PathBuf {
        let mut p = self.path.clone().into_os_string();
        p.push(".removals");
        PathBuf::from(p)
    }

    fn ctag_path(&self) -> PathBuf {
        let mut p = self.path.clone().into_os_string();
        p.push(".ctag");
        PathBuf::from(p)
    }

    /// Spec §4.8 failure model: "file open errors on one bank do not
    /// disable the other... on read errors, the bank reports 0 lines".
    fn load_internal(&mut self) {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                for line in content.lines() {
                    self.master.push(HistoryLine { id: self.next_id, text: line.to_string(), timestamp: None, tombstoned: false });
                    self.next_id += 1;
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!(target = "history.store", %err, "master_read_failed"),
        }
        if let Ok(ids) = fs::read_to_string(self.removals_path()) {
            for id_str in ids.lines() {
                if let Ok(id) = id_str.parse::<LineId>() {
                    if let Some(entry) = self.master.iter_mut().find(|l| l.id == id) {
                        entry.tombstoned = true;
                    }
                }
            }
        }
        if let Ok(tag) = fs::read_to_string(self.ctag_path()) {
            self.tag.set(tag.trim());
        }
    }

    /// Spec §4.8: "another process may have rewritten master between our
    /// `begin_line` and `add`; we detect via the concurrency tag and
    /// reload before appending."
    fn reload_if_stale(&mut self) {
        let Ok(on_disk) = fs::read_to_string(self.ctag_path()) else { return };
        let on_disk = on_disk.trim();
        if on_disk != self.tag.as_str() {
            trace!(target = "history.store", on_disk, current = %self.tag, "concurrency_tag_stale");
            let session = std::mem::take(&mut self.session);
            self.master.clear();
            self.load_internal();
            self.session = session;
        }
    }

    fn active_bank_mut(&mut self) -> &mut Vec<HistoryLine> {
        if self.use_master_bank { &mut self.master } else { &mut self.session }
    }

    fn find_live_mut(&mut self, text: &str) -> Option<&mut HistoryLine> {
        self.master
            .iter_mut()
            .chain(self.session.iter_mut())
            .filter(|l| !l.tombstoned)
            .rev()
            .find(|l| l.text == text)
    }

    /// Spec §4.8 `add(line)`.
    pub fn add(&mut self, line: &str) -> bool {
        if self.ignore_space && line.starts_with(|c: char| c.is_whitespace()) {
            return false;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return false;
        }
        self.reload_if_stale();

        match self.dupe_mode {
            DupeMode::Ignore => {
                if self.find_live_mut(trimmed).is_some() {
                    return false;
                }
            }
            DupeMode::EraseDupe => {
                if let Some(entry) = self.find_live_mut(trimmed) {
                    entry.tombstoned = true;
                }
            }
            DupeMode::Add => {}
        }

        let id = self.next_id;
        self.next_id += 1;
        let on_master = self.use_master_bank;
        self.active_bank_mut().push(HistoryLine { id, text: trimmed.to_string(), timestamp: Some(now_secs()), tombstoned: false });

        if on_master {
            self.persist_master();
        }
        true
    }

    fn persist_master(&mut self) {
        let body: String = self
            .master
            .iter()
            .filter(|l| !l.tombstoned)
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        match fs::write(&self.path, body) {
            Ok(()) => self.pending_write_failure = false,
            Err(err) => {
                warn!(target = "history.store", %err, "master_write_failed");
                self.pending_write_failure = true;
            }
        }
    }

    /// Spec §4.8 `remove(id)`: tombstone in the removals sidecar.
    pub fn remove(&mut self, id: LineId) -> bool {
        let found = self
            .master
            .iter_mut()
            .chain(self.session.iter_mut())
            .find(|l| l.id == id && !l.tombstoned);
        let Some(entry) = found else { return false };
        entry.tombstoned = true;
        self.append_removal(id);
        true
    }

    /// Spec §4.8 `remove(line)`.
    pub fn remove_line(&mut self, text: &str) -> Option<LineId> {
        let id = self.find_live_mut(text)?.id;
        self.master.iter_mut().chain(self.session.iter_mut()).find(|l| l.id == id).unwrap().tombstoned = true;
        self.append_removal(id);
        Some(id)
    }

    fn append_removal(&self, id: LineId) {
        use std::io::Write;
        if let Ok(mut f) = fs::OpenOptions::new().create(true).append(true).open(self.removals_path()) {
            let _ = writeln!(f, "{id}");
        }
    }

    pub fn find(&self, text: &str) -> Option<LineId> {
        self.master.iter().chain(self.session.iter()).rev().filter(|l| !l.tombstoned).find(|l| l.text == text).map(|l| l.id)
    }

    /// Spec §4.8 `read_lines(buffer)`: master lines then session lines, in
    /// insertion order, tombstoned entries skipped.
    pub fn read_lines(&self) -> impl DoubleEndedIterator<Item = (LineId, &str, Option<u64>)> {
        self.master
            .iter()
            .chain(self.session.iter())
            .filter(|l| !l.tombstoned)
            .map(|l| (l.id, l.text.as_str(), l.timestamp))
    }

    pub fn len(&self) -> usize {
        self.read_lines().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn tombstone_count(&self) -> usize {
        self.master.iter().filter(|l| l.tombstoned).count()
    }

    /// Spec §4.8 `compact`: rewrite master dropping tombstones, stamp a new
    /// tag, truncate the removals sidecar.
    pub fn compact(&mut self, force: bool) -> bool {
        if !force && self.tombstone_count() < self.min_compact_threshold {
            return false;
        }
        self.master.retain(|l| !l.tombstoned);
        self.tag_seed += 1;
        self.tag = ConcurrencyTag::generate(self.tag_seed);
        let _ = fs::write(self.ctag_path(), self.tag.as_str());
        let _ = fs::write(self.removals_path(), "");
        self.persist_master();
        true
    }
}

pub fn default_history_path(registry: &Registry) -> PathBuf {
    let _ = registry;
    clink_settings::discover_settings_path().join("history")
}
