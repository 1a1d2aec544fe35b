use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Author
// =============================================================================

/// Who produced a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Author {
    User,
    Assistant,
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Author::User => write!(f, "user"),
            Author::Assistant => write!(f, "assistant"),
        }
    }
}

// =============================================================================
// Turn
// =============================================================================

/// One message in the conversation log.
///
/// Turns are immutable once created: the fields are private and only exposed
/// through accessors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    id: Uuid,
    text: String,
    author: Author,
    timestamp: DateTime<Utc>,
    /// Image preview as a `data:` URI, only on user turns that carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_data: Option<String>,
}

impl Turn {
    /// A user turn, optionally carrying the preview of the image sent with it.
    pub fn user(text: impl Into<String>, image_data: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            author: Author::User,
            timestamp: Utc::now(),
            image_data,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            author: Author::Assistant,
            timestamp: Utc::now(),
            image_data: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn author(&self) -> Author {
        self.author
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn image_data(&self) -> Option<&str> {
        self.image_data.as_deref()
    }
}

// =============================================================================
// HistoryEntry
// =============================================================================

/// Wire form of a turn inside a request's `conversation_history`.
///
/// The backend reads `who` and `text`; image data never leaves the client
/// through the history window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub who: Author,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&Turn> for HistoryEntry {
    fn from(turn: &Turn) -> Self {
        Self {
            who: turn.author,
            text: turn.text.clone(),
            timestamp: turn.timestamp,
        }
    }
}
