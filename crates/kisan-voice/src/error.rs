//! Error types for voice capture and playback.

use crate::state::VoicePhase;

/// Errors from the voice subsystem.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VoiceError {
    #[error("speech recognition is not available")]
    CaptureUnavailable,
    #[error("speech synthesis is not available")]
    PlaybackUnavailable,
    #[error("recognition fault: {0}")]
    RecognitionFault(String),
    #[error("synthesis fault: {0}")]
    SynthesisFault(String),
    #[error("invalid voice capture transition: {from} -> {to}")]
    InvalidTransition { from: VoicePhase, to: VoicePhase },
}
