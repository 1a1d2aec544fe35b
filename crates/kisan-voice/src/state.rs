//! Voice capture state machine.
//!
//! Two phases with named transitions:
//! - Idle -> Listening (capture started)
//! - Listening -> Idle (stopped, engine fault, or engine end-of-session)
//!
//! While Listening the transcript is split into committed (final) text, which
//! only grows, and tentative (interim) text, which each recognition event
//! replaces wholesale.

use std::fmt;

use crate::error::VoiceError;

/// Operational phase of voice capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoicePhase {
    /// Not capturing. Ready to start.
    Idle,
    /// The recognition engine is running and delivering events.
    Listening,
}

impl fmt::Display for VoicePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoicePhase::Idle => write!(f, "Idle"),
            VoicePhase::Listening => write!(f, "Listening"),
        }
    }
}

impl VoicePhase {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &VoicePhase) -> bool {
        matches!(
            (self, target),
            (VoicePhase::Idle, VoicePhase::Listening) | (VoicePhase::Listening, VoicePhase::Idle)
        )
    }
}

/// Capture phase plus the committed and tentative transcript buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceCaptureState {
    phase: VoicePhase,
    final_transcript: String,
    interim_transcript: String,
}

impl Default for VoiceCaptureState {
    fn default() -> Self {
        Self::new()
    }
}

impl VoiceCaptureState {
    pub fn new() -> Self {
        Self {
            phase: VoicePhase::Idle,
            final_transcript: String::new(),
            interim_transcript: String::new(),
        }
    }

    pub fn phase(&self) -> VoicePhase {
        self.phase
    }

    pub fn is_listening(&self) -> bool {
        self.phase == VoicePhase::Listening
    }

    pub fn final_transcript(&self) -> &str {
        &self.final_transcript
    }

    pub fn interim_transcript(&self) -> &str {
        &self.interim_transcript
    }

    /// `trim(final + " " + interim)`, the text mirrored into the input field.
    pub fn live_transcript(&self) -> String {
        format!("{} {}", self.final_transcript, self.interim_transcript)
            .trim()
            .to_string()
    }

    /// Whether there is committed text worth sending.
    pub fn has_transcript(&self) -> bool {
        !self.final_transcript.is_empty()
    }

    /// Attempt to move to `target`, validating the transition.
    fn transition(&mut self, target: VoicePhase) -> Result<(), VoiceError> {
        if !self.phase.can_transition_to(&target) {
            return Err(VoiceError::InvalidTransition {
                from: self.phase,
                to: target,
            });
        }
        tracing::debug!("Voice capture phase: {} -> {}", self.phase, target);
        self.phase = target;
        Ok(())
    }

    /// Idle -> Listening. Both transcript buffers are reset.
    pub fn begin(&mut self) -> Result<(), VoiceError> {
        self.transition(VoicePhase::Listening)?;
        self.final_transcript.clear();
        self.interim_transcript.clear();
        Ok(())
    }

    /// Apply one recognition event's fragments and return the live transcript.
    ///
    /// Final fragments are appended space-joined; interim fragments replace the
    /// tentative buffer. Returns `None` when not Listening.
    pub fn apply(&mut self, finals: &[&str], interim: Option<&str>) -> Option<String> {
        if !self.is_listening() {
            return None;
        }
        for fragment in finals {
            let fragment = fragment.trim();
            if fragment.is_empty() {
                continue;
            }
            if !self.final_transcript.is_empty() {
                self.final_transcript.push(' ');
            }
            self.final_transcript.push_str(fragment);
        }
        self.interim_transcript = interim.map(|s| s.trim().to_string()).unwrap_or_default();
        Some(self.live_transcript())
    }

    /// Listening -> Idle. The interim buffer is discarded; committed text is kept.
    ///
    /// Returns whether committed text is available for sending.
    pub fn end(&mut self) -> Result<bool, VoiceError> {
        self.transition(VoicePhase::Idle)?;
        self.interim_transcript.clear();
        Ok(self.has_transcript())
    }

    /// Hand the committed transcript to the caller, leaving it empty.
    pub fn take_transcript(&mut self) -> String {
        std::mem::take(&mut self.final_transcript)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display() {
        assert_eq!(VoicePhase::Idle.to_string(), "Idle");
        assert_eq!(VoicePhase::Listening.to_string(), "Listening");
    }

    #[test]
    fn test_valid_transitions() {
        assert!(VoicePhase::Idle.can_transition_to(&VoicePhase::Listening));
        assert!(VoicePhase::Listening.can_transition_to(&VoicePhase::Idle));
    }

    #[test]
    fn test_invalid_self_transitions() {
        assert!(!VoicePhase::Idle.can_transition_to(&VoicePhase::Idle));
        assert!(!VoicePhase::Listening.can_transition_to(&VoicePhase::Listening));
    }

    #[test]
    fn test_begin_resets_buffers() {
        let mut state = VoiceCaptureState::new();
        state.begin().unwrap();
        state.apply(&["namaste"], Some("kis"));
        state.end().unwrap();

        state.begin().unwrap();
        assert!(state.final_transcript().is_empty());
        assert!(state.interim_transcript().is_empty());
        assert!(state.is_listening());
    }

    #[test]
    fn test_begin_twice_is_invalid() {
        let mut state = VoiceCaptureState::new();
        state.begin().unwrap();
        let err = state.begin().unwrap_err();
        assert_eq!(
            err,
            VoiceError::InvalidTransition {
                from: VoicePhase::Listening,
                to: VoicePhase::Listening
            }
        );
    }

    #[test]
    fn test_end_while_idle_is_invalid() {
        let mut state = VoiceCaptureState::new();
        assert!(state.end().is_err());
    }

    #[test]
    fn test_apply_joins_finals_with_spaces() {
        let mut state = VoiceCaptureState::new();
        state.begin().unwrap();
        state.apply(&["what crops"], None);
        state.apply(&[" should I ", "grow"], None);
        assert_eq!(state.final_transcript(), "what crops should I grow");
    }

    #[test]
    fn test_apply_replaces_interim() {
        let mut state = VoiceCaptureState::new();
        state.begin().unwrap();
        state.apply(&[], Some("whe"));
        state.apply(&[], Some("wheat pri"));
        assert_eq!(state.interim_transcript(), "wheat pri");
        state.apply(&["wheat price"], None);
        assert_eq!(state.interim_transcript(), "");
    }

    #[test]
    fn test_live_transcript_is_trimmed_concatenation() {
        let mut state = VoiceCaptureState::new();
        state.begin().unwrap();
        assert_eq!(state.apply(&[], Some("mandi")), Some("mandi".to_string()));
        assert_eq!(
            state.apply(&["mandi bhav"], Some("in Indore")),
            Some("mandi bhav in Indore".to_string())
        );
        assert_eq!(state.apply(&[], None), Some("mandi bhav".to_string()));
    }

    #[test]
    fn test_apply_ignored_when_idle() {
        let mut state = VoiceCaptureState::new();
        assert_eq!(state.apply(&["late result"], Some("x")), None);
        assert!(state.final_transcript().is_empty());
    }

    #[test]
    fn test_empty_final_fragments_skipped() {
        let mut state = VoiceCaptureState::new();
        state.begin().unwrap();
        state.apply(&["", "  ", "rice"], None);
        assert_eq!(state.final_transcript(), "rice");
    }

    #[test]
    fn test_end_discards_interim_and_reports_transcript() {
        let mut state = VoiceCaptureState::new();
        state.begin().unwrap();
        state.apply(&["cotton"], Some("pests"));
        assert!(state.end().unwrap());
        assert_eq!(state.final_transcript(), "cotton");
        assert_eq!(state.interim_transcript(), "");
        assert_eq!(state.phase(), VoicePhase::Idle);
    }

    #[test]
    fn test_end_without_finals_reports_nothing_to_send() {
        let mut state = VoiceCaptureState::new();
        state.begin().unwrap();
        state.apply(&[], Some("only tentative"));
        assert!(!state.end().unwrap());
    }

    #[test]
    fn test_take_transcript_empties_buffer() {
        let mut state = VoiceCaptureState::new();
        state.begin().unwrap();
        state.apply(&["soil testing"], None);
        state.end().unwrap();
        assert_eq!(state.take_transcript(), "soil testing");
        assert!(!state.has_transcript());
    }
}
