//! Voice capture controller wrapping a speech-recognition engine.
//!
//! The engine only has to start and stop; everything it hears comes back as
//! [`RecognitionEvent`]s pushed into [`VoiceCaptureController::handle_event`].

use crate::error::VoiceError;
use crate::state::{VoiceCaptureState, VoicePhase};

/// Recognition selector value meaning "use the default locale".
pub const AUTO_LANGUAGE: &str = "auto";

/// A speech-recognition capability.
pub trait RecognitionEngine: Send {
    /// Begin a recognition session in the given BCP-47 language.
    fn start(&mut self, language: &str) -> Result<(), VoiceError>;
    /// Ask the engine to end the current session.
    fn stop(&mut self);
}

/// One recognized fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionResult {
    pub transcript: String,
    pub is_final: bool,
}

impl RecognitionResult {
    pub fn final_text(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: true,
        }
    }

    pub fn interim(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: false,
        }
    }
}

/// Events delivered by the recognition engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// Newly recognized fragments, final and interim.
    Results(Vec<RecognitionResult>),
    /// A terminal engine error.
    Error(String),
    /// The engine ended its session on its own.
    End,
}

/// Why capture returned to Idle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    Requested,
    Fault(String),
    EngineEnded,
}

/// What the caller should reflect on the surface after an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureUpdate {
    /// Live transcript to mirror into the text input.
    Live(String),
    /// Capture returned to Idle. `transcript_ready` gates "send transcript".
    Stopped {
        reason: StopReason,
        transcript_ready: bool,
    },
}

/// Drives a [`RecognitionEngine`] through the Idle/Listening state machine.
pub struct VoiceCaptureController {
    engine: Option<Box<dyn RecognitionEngine>>,
    state: VoiceCaptureState,
    selected_language: String,
    default_locale: String,
}

impl std::fmt::Debug for VoiceCaptureController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceCaptureController")
            .field("available", &self.engine.is_some())
            .field("state", &self.state)
            .field("selected_language", &self.selected_language)
            .finish()
    }
}

impl VoiceCaptureController {
    /// Create a controller. `engine` is `None` when the platform has no
    /// recognition capability.
    pub fn new(engine: Option<Box<dyn RecognitionEngine>>, default_locale: impl Into<String>) -> Self {
        Self {
            engine,
            state: VoiceCaptureState::new(),
            selected_language: AUTO_LANGUAGE.to_string(),
            default_locale: default_locale.into(),
        }
    }

    /// A controller with no recognition capability.
    pub fn unavailable(default_locale: impl Into<String>) -> Self {
        Self::new(None, default_locale)
    }

    pub fn is_available(&self) -> bool {
        self.engine.is_some()
    }

    pub fn phase(&self) -> VoicePhase {
        self.state.phase()
    }

    pub fn is_listening(&self) -> bool {
        self.state.is_listening()
    }

    pub fn state(&self) -> &VoiceCaptureState {
        &self.state
    }

    /// Set the recognition selector: a language code or `"auto"`.
    ///
    /// Applied on the next `start`.
    pub fn select_language(&mut self, language: impl Into<String>) {
        let language = language.into();
        self.selected_language = if language.trim().is_empty() {
            AUTO_LANGUAGE.to_string()
        } else {
            language
        };
    }

    /// The language the engine is started with.
    pub fn effective_language(&self) -> &str {
        if self.selected_language.eq_ignore_ascii_case(AUTO_LANGUAGE) {
            &self.default_locale
        } else {
            &self.selected_language
        }
    }

    /// Idle -> Listening.
    ///
    /// Fails with `CaptureUnavailable` (state untouched) when there is no
    /// engine, and with `RecognitionFault` when the engine refuses to start.
    pub fn start(&mut self) -> Result<(), VoiceError> {
        let language = self.effective_language().to_string();
        let Some(engine) = self.engine.as_mut() else {
            tracing::info!("Voice capture requested but speech recognition is unavailable");
            return Err(VoiceError::CaptureUnavailable);
        };
        if self.state.is_listening() {
            return Err(VoiceError::InvalidTransition {
                from: VoicePhase::Listening,
                to: VoicePhase::Listening,
            });
        }

        engine.start(&language).map_err(|e| match e {
            fault @ VoiceError::RecognitionFault(_) => fault,
            other => VoiceError::RecognitionFault(other.to_string()),
        })?;
        self.state.begin()?;
        tracing::info!(language = %language, "Voice capture started");
        Ok(())
    }

    /// Listening -> Idle on user request. Returns `None` when already Idle.
    pub fn stop(&mut self) -> Option<CaptureUpdate> {
        if !self.state.is_listening() {
            return None;
        }
        if let Some(engine) = self.engine.as_mut() {
            engine.stop();
        }
        self.finish(StopReason::Requested)
    }

    /// Feed one engine event through the state machine.
    ///
    /// Events that arrive while Idle are dropped.
    pub fn handle_event(&mut self, event: RecognitionEvent) -> Option<CaptureUpdate> {
        if !self.state.is_listening() {
            tracing::debug!(?event, "Recognition event ignored while idle");
            return None;
        }
        match event {
            RecognitionEvent::Results(results) => {
                let finals: Vec<&str> = results
                    .iter()
                    .filter(|r| r.is_final)
                    .map(|r| r.transcript.as_str())
                    .collect();
                let interim: Vec<&str> = results
                    .iter()
                    .filter(|r| !r.is_final)
                    .map(|r| r.transcript.trim())
                    .filter(|t| !t.is_empty())
                    .collect();
                let interim = (!interim.is_empty()).then(|| interim.join(" "));
                self.state
                    .apply(&finals, interim.as_deref())
                    .map(CaptureUpdate::Live)
            }
            RecognitionEvent::Error(message) => {
                tracing::warn!(error = %message, "Speech recognition fault");
                self.finish(StopReason::Fault(message))
            }
            RecognitionEvent::End => self.finish(StopReason::EngineEnded),
        }
    }

    /// Take the committed transcript for sending, leaving it empty.
    pub fn take_transcript(&mut self) -> String {
        self.state.take_transcript()
    }

    fn finish(&mut self, reason: StopReason) -> Option<CaptureUpdate> {
        match self.state.end() {
            Ok(transcript_ready) => {
                tracing::info!(?reason, transcript_ready, "Voice capture stopped");
                Some(CaptureUpdate::Stopped {
                    reason,
                    transcript_ready,
                })
            }
            Err(e) => {
                tracing::debug!(error = %e, "Voice capture already idle");
                None
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
