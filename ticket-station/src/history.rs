//! Print history ledger
//!
//! A capacity-bounded FIFO set of ticket identifiers that have been
//! physically printed. This is the sole source of truth for "has this
//! ticket been printed": it is deliberately decoupled from the
//! repository snapshot so a printed ticket stays remembered after it
//! ages out of the 50-entry snapshot window.
//!
//! Persistence is one identifier per line, rewritten wholesale. A
//! missing or unwritable file puts the store in a degraded,
//! non-persistent mode for the session; it never fails the caller.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default history capacity
pub const HISTORY_CAPACITY: usize = 200;

/// Capacity-bounded FIFO set of printed ticket identifiers
#[derive(Debug)]
pub struct HistoryStore {
    entries: VecDeque<String>,
    capacity: usize,
    path: Option<PathBuf>,
}

impl HistoryStore {
    /// Create an empty store persisted at `path`
    pub fn new(path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            path: Some(path.into()),
        }
    }

    /// Create an in-memory store (degraded mode, used in tests too)
    pub fn in_memory(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            path: None,
        }
    }

    /// Membership test by exact identifier
    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e == id)
    }

    /// Record an identifier, evicting the oldest entry when full
    ///
    /// Adding an already-present identifier is a no-op.
    pub fn add(&mut self, id: &str) {
        if self.contains(id) {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(id.to_string());
    }

    /// Atomically replace the contents with exactly `ids`
    ///
    /// Used once at boot to seed the store with the current snapshot
    /// so a fresh device does not reprint the whole backlog. When more
    /// ids than the capacity are given, only the newest tail is kept.
    pub fn reset_to<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries.clear();
        for id in ids {
            let id: String = id.into();
            if self.entries.len() == self.capacity {
                self.entries.pop_front();
            }
            self.entries.push_back(id);
        }
    }

    /// Number of remembered identifiers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load the persisted set, replacing the in-memory contents
    ///
    /// Returns `true` when a file was found and read. A missing file
    /// is the normal first-boot case, not an error.
    pub fn load(&mut self) -> bool {
        let Some(path) = self.path.clone() else {
            return false;
        };
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                self.reset_to(text.lines().map(str::trim).filter(|l| !l.is_empty()));
                info!(count = self.entries.len(), path = %path.display(), "Print history loaded");
                true
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "No print history file, starting empty");
                false
            }
        }
    }

    /// Rewrite the persisted file wholesale
    ///
    /// In degraded mode (no path, or the write fails) this logs and
    /// carries on; the session keeps working from memory.
    pub fn persist(&self) {
        let Some(path) = &self.path else {
            return;
        };
        let mut text = String::new();
        for id in &self.entries {
            text.push_str(id);
            text.push('\n');
        }
        if let Err(e) = write_atomic(path, &text) {
            warn!(path = %path.display(), error = %e, "Print history not persisted, running non-persistent");
        }
    }
}

/// Write via a sibling temp file and rename, so a power cut mid-save
/// cannot truncate the previous history
fn write_atomic(path: &Path, text: &str) -> std::io::Result<()> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, text)?;
    std::fs::rename(&tmp, path)
}
