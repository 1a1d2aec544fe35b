//! Speech playback with a single active utterance.
//!
//! Every `speak` cancels whatever is playing before starting; there is no
//! queue.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::VoiceError;
use crate::language::{LanguageClassifier, ScriptLanguageClassifier};

/// A text-to-speech capability.
pub trait SpeechSynthesizer: Send {
    fn speak(&mut self, utterance: &Utterance) -> Result<(), VoiceError>;
    /// Stop the current utterance, if any.
    fn cancel(&mut self);
}

/// One invocation of speech synthesis.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub language: String,
    pub rate: f32,
    pub pitch: f32,
}

/// Drives a [`SpeechSynthesizer`], guaranteeing at most one active utterance.
pub struct SpeechPlaybackController {
    synthesizer: Option<Box<dyn SpeechSynthesizer>>,
    classifier: Box<dyn LanguageClassifier>,
    rate: f32,
    pitch: f32,
    active: Option<Utterance>,
}

impl std::fmt::Debug for SpeechPlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechPlaybackController")
            .field("available", &self.synthesizer.is_some())
            .field("rate", &self.rate)
            .field("pitch", &self.pitch)
            .field("active", &self.active)
            .finish()
    }
}

impl SpeechPlaybackController {
    /// Create a controller using the script-block language classifier.
    pub fn new(synthesizer: Option<Box<dyn SpeechSynthesizer>>, rate: f32, pitch: f32) -> Self {
        Self::with_classifier(synthesizer, Box::new(ScriptLanguageClassifier), rate, pitch)
    }

    pub fn with_classifier(
        synthesizer: Option<Box<dyn SpeechSynthesizer>>,
        classifier: Box<dyn LanguageClassifier>,
        rate: f32,
        pitch: f32,
    ) -> Self {
        Self {
            synthesizer,
            classifier,
            rate,
            pitch,
            active: None,
        }
    }

    /// A controller with no synthesis capability.
    pub fn unavailable() -> Self {
        Self::new(None, 1.0, 1.0)
    }

    pub fn is_available(&self) -> bool {
        self.synthesizer.is_some()
    }

    /// The utterance currently playing, if any.
    pub fn active(&self) -> Option<&Utterance> {
        self.active.as_ref()
    }

    /// Speak `text`, superseding any utterance in progress.
    pub fn speak(&mut self, text: &str) -> Result<&Utterance, VoiceError> {
        let Some(synth) = self.synthesizer.as_mut() else {
            tracing::debug!("Speech requested but synthesis is unavailable");
            return Err(VoiceError::PlaybackUnavailable);
        };

        synth.cancel();
        self.active = None;

        let spoken = strip_markup(text);
        let utterance = Utterance {
            language: self.classifier.classify(&spoken),
            text: spoken,
            rate: self.rate,
            pitch: self.pitch,
        };
        synth.speak(&utterance)?;
        tracing::debug!(language = %utterance.language, chars = utterance.text.len(), "Utterance started");
        Ok(self.active.insert(utterance))
    }

    /// Cancel the active utterance.
    pub fn stop(&mut self) {
        if let Some(synth) = self.synthesizer.as_mut() {
            synth.cancel();
        }
        self.active = None;
    }

    /// The synthesizer reported the end of the active utterance.
    pub fn utterance_finished(&mut self) {
        self.active = None;
    }
}

/// Drop markdown emphasis, heading and list markers so they are not read aloud.
fn strip_markup(text: &str) -> String {
    static MARKERS: OnceLock<Regex> = OnceLock::new();
    let re = MARKERS.get_or_init(|| {
        Regex::new(r"(?m)(\*\*|__|`+|^\s{0,3}#{1,6}\s+|^\s*[-*+]\s+|^\s*>\s?|\*)")
            .expect("static regex is valid")
    });
    re.replace_all(text, "").trim().to_string()
}

// =============================================================================
// Tests
// =============================================================================
