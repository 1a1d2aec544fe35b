//! Error types for the turn controller.

use std::sync::{Mutex, MutexGuard};

use kisan_core::error::KisanError;
use kisan_voice::VoiceError;

/// Errors from the chat controller.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("only images can be attached (got {0})")]
    InvalidAttachmentType(String),
    #[error("image is {size} bytes; the limit is {limit} bytes")]
    AttachmentTooLarge { size: u64, limit: u64 },
    #[error("could not read attachment: {0}")]
    AttachmentUnreadable(String),
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("backend returned an empty reply")]
    EmptyReply,
    #[error("a turn is already in flight")]
    TurnInFlight,
    #[error("voice error: {0}")]
    Voice(#[from] VoiceError),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<KisanError> for ChatError {
    fn from(err: KisanError) -> Self {
        ChatError::Storage(err.to_string())
    }
}

impl ChatError {
    /// Whether the turn should be answered with the fallback message.
    pub fn is_fallback(&self) -> bool {
        matches!(self, ChatError::BackendUnavailable(_) | ChatError::EmptyReply)
    }
}

/// Lock a controller mutex, mapping poisoning to a storage error.
pub(crate) fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> Result<MutexGuard<'a, T>, ChatError> {
    mutex
        .lock()
        .map_err(|e| ChatError::Storage(format!("{name} lock poisoned: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        let err = ChatError::InvalidAttachmentType("application/pdf".to_string());
        assert_eq!(err.to_string(), "only images can be attached (got application/pdf)");

        let err = ChatError::AttachmentTooLarge {
            size: 10_485_761,
            limit: 10_485_760,
        };
        assert_eq!(
            err.to_string(),
            "image is 10485761 bytes; the limit is 10485760 bytes"
        );

        let err = ChatError::BackendUnavailable("status 502".to_string());
        assert_eq!(err.to_string(), "backend unavailable: status 502");

        assert_eq!(ChatError::EmptyReply.to_string(), "backend returned an empty reply");
        assert_eq!(ChatError::TurnInFlight.to_string(), "a turn is already in flight");
    }

    #[test]
    fn test_chat_error_from_voice_error() {
        let err: ChatError = VoiceError::CaptureUnavailable.into();
        assert!(matches!(err, ChatError::Voice(VoiceError::CaptureUnavailable)));
        assert_eq!(err.to_string(), "voice error: speech recognition is not available");
    }

    #[test]
    fn test_chat_error_from_kisan_error() {
        let err: ChatError = KisanError::Storage("slot locked".to_string()).into();
        assert!(matches!(err, ChatError::Storage(_)));
        assert!(err.to_string().contains("slot locked"));
    }

    #[test]
    fn test_only_backend_failures_fall_back() {
        assert!(ChatError::BackendUnavailable("timeout".into()).is_fallback());
        assert!(ChatError::EmptyReply.is_fallback());
        assert!(!ChatError::TurnInFlight.is_fallback());
        assert!(!ChatError::InvalidAttachmentType("text/plain".into()).is_fallback());
        assert!(!ChatError::Storage("x".into()).is_fallback());
    }
}
