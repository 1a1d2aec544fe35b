//! Conversation session: server-issued identity plus the local turn log.

use kisan_core::types::{Author, HistoryEntry, Turn};

/// Session identity and ordered turn history, most recent last.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    session_id: Option<String>,
    turns: Vec<Turn>,
    persistence_enabled: bool,
    max_entries: usize,
}

impl ConversationSession {
    pub fn new(persistence_enabled: bool, max_entries: usize) -> Self {
        Self {
            session_id: None,
            turns: Vec::new(),
            persistence_enabled,
            max_entries,
        }
    }

    /// Start from a previously persisted log, keeping only the newest entries.
    pub fn restore(turns: Vec<Turn>, persistence_enabled: bool, max_entries: usize) -> Self {
        let mut session = Self::new(persistence_enabled, max_entries);
        session.turns = turns;
        session.truncate();
        session
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Record the server-issued id. The first id wins; later ones are ignored.
    ///
    /// Returns whether the id was adopted.
    pub fn adopt_session_id(&mut self, id: &str) -> bool {
        let id = id.trim();
        if id.is_empty() {
            return false;
        }
        if let Some(current) = &self.session_id {
            if current != id {
                tracing::warn!(session_id = %current, offered = %id, "Ignoring different session id from backend");
            }
            return false;
        }
        tracing::info!(session_id = %id, "Session id assigned by backend");
        self.session_id = Some(id.to_string());
        true
    }

    pub fn persistence_enabled(&self) -> bool {
        self.persistence_enabled
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last_assistant_turn(&self) -> Option<&Turn> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.author() == Author::Assistant)
    }

    /// Append a turn, dropping the oldest once the log exceeds its bound.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
        self.truncate();
    }

    /// The last `n` turns, oldest first, in wire form.
    pub fn history_window(&self, n: usize) -> Vec<HistoryEntry> {
        let start = self.turns.len().saturating_sub(n);
        self.turns[start..].iter().map(HistoryEntry::from).collect()
    }

    /// Forget the local log. The session id is kept.
    pub fn clear_turns(&mut self) {
        self.turns.clear();
    }

    fn truncate(&mut self) {
        if self.turns.len() > self.max_entries {
            let excess = self.turns.len() - self.max_entries;
            self.turns.drain(..excess);
        }
    }
}
