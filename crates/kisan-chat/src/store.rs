//! Local persistence of the turn log.
//!
//! The log lives in one fixed JSON slot file under the data directory. It is
//! only consulted when history persistence is enabled.

use std::path::{Path, PathBuf};

use kisan_core::error::{KisanError, Result};
use kisan_core::types::Turn;

/// File name of the history slot.
pub const HISTORY_SLOT: &str = "kisangpt_chat_history.json";

/// Reads and writes the bounded turn log.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    max_entries: usize,
}

impl HistoryStore {
    pub fn new(data_dir: &Path, max_entries: usize) -> Self {
        Self {
            path: data_dir.join(HISTORY_SLOT),
            max_entries,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted turns, newest `max_entries` only.
    ///
    /// A missing slot is an empty history.
    pub fn load(&self) -> Result<Vec<Turn>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut turns: Vec<Turn> = serde_json::from_str(&content)?;
        if turns.len() > self.max_entries {
            let excess = turns.len() - self.max_entries;
            turns.drain(..excess);
        }
        tracing::debug!(path = %self.path.display(), turns = turns.len(), "Chat history loaded");
        Ok(turns)
    }

    /// Overwrite the slot with the newest `max_entries` of `turns`.
    pub fn save(&self, turns: &[Turn]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let start = turns.len().saturating_sub(self.max_entries);
        let content = serde_json::to_string(&turns[start..])?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    /// Remove the slot file.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(KisanError::Storage(format!(
                "failed to clear {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_slot_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path(), 50);
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load_preserves_turns() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(&dir.path().join("data"), 50);
        let turns = vec![
            Turn::user("Best time to sow mustard?", Some("data:image/png;base64,AA==".into())),
            Turn::assistant("Mid October in north India."),
        ];
        store.save(&turns).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, turns);
    }

    #[test]
    fn test_save_keeps_newest_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path(), 5);
        let turns: Vec<Turn> = (0..8).map(|i| Turn::user(format!("t{}", i), None)).collect();
        store.save(&turns).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 5);
        assert_eq!(loaded[0].text(), "t3");
    }

    #[test]
    fn test_load_corrupt_slot_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path(), 50);
        std::fs::write(store.path(), "{oops").unwrap();
        assert!(matches!(store.load(), Err(KisanError::Serialization(_))));
    }

    #[test]
    fn test_clear_removes_slot() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path(), 50);
        store.save(&[Turn::assistant("x")]).unwrap();
        store.clear().unwrap();
        assert!(!store.path().exists());
        // Clearing twice is fine.
        store.clear().unwrap();
    }
}
