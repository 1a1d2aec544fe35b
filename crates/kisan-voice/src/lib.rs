//! Voice input and spoken output for the KisanGPT client.
//!
//! Speech recognition is driven through an explicit two-state machine
//! (Idle <-> Listening) fed by recognition events, so any event source can
//! drive it. Speech synthesis enforces a single active utterance.

pub mod capture;
pub mod error;
pub mod language;
pub mod playback;
pub mod state;

pub use capture::{
    CaptureUpdate, RecognitionEngine, RecognitionEvent, RecognitionResult, StopReason,
    VoiceCaptureController,
};
pub use error::VoiceError;
pub use language::{LanguageClassifier, ScriptLanguageClassifier};
pub use playback::{SpeechPlaybackController, SpeechSynthesizer, Utterance};
pub use state::{VoiceCaptureState, VoicePhase};
