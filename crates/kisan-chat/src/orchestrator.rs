//! Turn orchestrator: the top-level controller.
//!
//! Owns the session, the attachment slot and both voice controllers, each
//! behind its own mutex. Sequences the surface around every turn and
//! guarantees it is re-enabled whatever the outcome.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use kisan_core::config::KisanConfig;
use kisan_core::types::{Author, Turn};
use kisan_voice::{
    CaptureUpdate, RecognitionEngine, RecognitionEvent, SpeechPlaybackController,
    SpeechSynthesizer, StopReason, VoiceCaptureController, VoiceError,
};

use crate::attachment::{AttachmentFile, AttachmentStaging, StagedAttachment};
use crate::backend::Backend;
use crate::dispatcher::{DispatchMode, RequestDispatcher};
use crate::error::{lock, ChatError};
use crate::fallback::fallback_message;
use crate::location::LocationExtractor;
use crate::markdown::{HtmlMarkdown, MarkdownRenderer};
use crate::request::BackendInfo;
use crate::session::ConversationSession;
use crate::store::HistoryStore;
use crate::surface::ChatSurface;

/// Message sent with an image when the user typed nothing.
const IMAGE_ONLY_PROMPT: &str = "Please analyze this image.";

/// Result of one completed turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub user_turn: Turn,
    pub assistant_turn: Turn,
    /// The assistant turn is the canned fallback.
    pub used_fallback: bool,
}

/// Marker that a turn is in flight.
///
/// Holding one disables input and shows the typing indicator; dropping it
/// undoes both and frees the slot.
struct PendingTurn<'a> {
    flag: &'a AtomicBool,
    surface: &'a dyn ChatSurface,
}

impl<'a> PendingTurn<'a> {
    fn begin(flag: &'a AtomicBool, surface: &'a dyn ChatSurface) -> Result<Self, ChatError> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| ChatError::TurnInFlight)?;
        surface.set_input_enabled(false);
        surface.set_typing(true);
        Ok(Self { flag, surface })
    }
}

impl Drop for PendingTurn<'_> {
    fn drop(&mut self) {
        self.surface.set_typing(false);
        self.surface.set_input_enabled(true);
        self.flag.store(false, Ordering::SeqCst);
    }
}

pub struct TurnOrchestrator {
    config: KisanConfig,
    dispatcher: RequestDispatcher,
    session: Mutex<ConversationSession>,
    staging: Mutex<AttachmentStaging>,
    capture: Mutex<VoiceCaptureController>,
    playback: Mutex<SpeechPlaybackController>,
    surface: Arc<dyn ChatSurface>,
    renderer: Box<dyn MarkdownRenderer>,
    store: Option<HistoryStore>,
    in_flight: AtomicBool,
}

impl TurnOrchestrator {
    /// Build an orchestrator with no voice capabilities.
    ///
    /// When persistence is enabled the stored history is restored; a slot
    /// that cannot be read is logged and treated as empty.
    pub fn new(config: KisanConfig, backend: Arc<dyn Backend>, surface: Arc<dyn ChatSurface>) -> Self {
        let history = &config.history;
        let store = history
            .persistence_enabled
            .then(|| HistoryStore::new(&config.general.resolved_data_dir(), history.max_entries));

        let restored = match &store {
            Some(store) => store.load().unwrap_or_else(|e| {
                tracing::warn!(path = %store.path().display(), error = %e, "Could not restore chat history");
                Vec::new()
            }),
            None => Vec::new(),
        };
        let session =
            ConversationSession::restore(restored, history.persistence_enabled, history.max_entries);

        let dispatcher =
            RequestDispatcher::new(backend, history.context_turns, config.backend.api_key.clone());

        Self {
            capture: Mutex::new(Self::capture_controller(&config, None)),
            playback: Mutex::new(Self::playback_controller(&config, None)),
            staging: Mutex::new(AttachmentStaging::new(config.attachment.max_bytes)),
            session: Mutex::new(session),
            dispatcher,
            surface,
            renderer: Box::new(HtmlMarkdown),
            store,
            in_flight: AtomicBool::new(false),
            config,
        }
    }

    pub fn with_recognition(mut self, engine: Box<dyn RecognitionEngine>) -> Self {
        self.capture = Mutex::new(Self::capture_controller(&self.config, Some(engine)));
        self
    }

    pub fn with_synthesizer(mut self, synthesizer: Box<dyn SpeechSynthesizer>) -> Self {
        self.playback = Mutex::new(Self::playback_controller(&self.config, Some(synthesizer)));
        self
    }

    pub fn with_renderer(mut self, renderer: Box<dyn MarkdownRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_location_extractor(mut self, locator: Box<dyn LocationExtractor>) -> Self {
        self.dispatcher = self.dispatcher.with_location_extractor(locator);
        self
    }

    fn capture_controller(
        config: &KisanConfig,
        engine: Option<Box<dyn RecognitionEngine>>,
    ) -> VoiceCaptureController {
        let mut capture = VoiceCaptureController::new(engine, config.voice.default_locale.clone());
        capture.select_language(config.voice.recognition_language.clone());
        capture
    }

    fn playback_controller(
        config: &KisanConfig,
        synthesizer: Option<Box<dyn SpeechSynthesizer>>,
    ) -> SpeechPlaybackController {
        SpeechPlaybackController::new(synthesizer, config.speech.rate, config.speech.pitch)
    }

    // =========================================================================
    // Startup
    // =========================================================================

    /// Fetch the backend configuration and bring the surface to its idle state.
    ///
    /// An unreachable backend is not an error here: it is assumed to have no
    /// key of its own, so a configured client key is forwarded.
    pub async fn initialize(&self) -> Result<BackendInfo, ChatError> {
        let info = match self.dispatcher.backend().fetch_info().await {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!(error = %e, "Backend configuration unavailable; assuming no server key");
                BackendInfo::default()
            }
        };
        self.dispatcher.set_backend_has_key(info.has_api_key);

        let voice = lock(&self.capture, "capture")?.is_available();
        let speech = lock(&self.playback, "playback")?.is_available();
        self.surface.set_voice_available(voice);
        self.surface.set_speech_available(speech);
        self.surface.set_listening(false);
        self.surface.set_send_transcript_enabled(false);

        let restored = lock(&self.session, "session")?.turns().to_vec();
        for turn in &restored {
            self.show(turn);
        }
        self.surface.set_input_enabled(true);

        tracing::info!(
            has_api_key = info.has_api_key,
            voice,
            speech,
            restored = restored.len(),
            "Turn controller ready"
        );
        Ok(info)
    }

    // =========================================================================
    // Attachments
    // =========================================================================

    /// Stage an image. Rejections are shown as an inline notice and the
    /// previously staged image, if any, is kept.
    pub async fn attach(&self, file: AttachmentFile) -> Result<(), ChatError> {
        let max_bytes = lock(&self.staging, "attachment")?.max_bytes();
        let staged = match StagedAttachment::prepare(file, max_bytes).await {
            Ok(staged) => staged,
            Err(e) => {
                tracing::info!(error = %e, "Attachment rejected");
                self.surface.show_notice(&e.to_string());
                return Err(e);
            }
        };

        let preview = {
            let mut staging = lock(&self.staging, "attachment")?;
            staging.replace(staged).preview_uri().to_string()
        };
        self.surface.show_attachment(Some(&preview));
        Ok(())
    }

    pub fn remove_attachment(&self) -> Result<(), ChatError> {
        lock(&self.staging, "attachment")?.clear();
        self.surface.show_attachment(None);
        Ok(())
    }

    pub fn has_attachment(&self) -> Result<bool, ChatError> {
        Ok(!lock(&self.staging, "attachment")?.is_empty())
    }

    pub fn set_location(&self, location: Option<String>) -> Result<(), ChatError> {
        self.dispatcher.set_location(location)
    }

    // =========================================================================
    // Voice capture
    // =========================================================================

    pub fn select_recognition_language(&self, language: &str) -> Result<(), ChatError> {
        lock(&self.capture, "capture")?.select_language(language);
        Ok(())
    }

    pub fn start_voice_capture(&self) -> Result<(), ChatError> {
        lock(&self.capture, "capture")?.start()?;
        self.surface.set_listening(true);
        self.surface.set_send_transcript_enabled(false);
        self.surface.set_input_text("");
        Ok(())
    }

    pub fn stop_voice_capture(&self) -> Result<(), ChatError> {
        let update = lock(&self.capture, "capture")?.stop();
        if let Some(update) = update {
            self.reflect_capture(update);
        }
        Ok(())
    }

    /// Feed one recognition event and mirror its effect on the surface.
    pub fn handle_recognition_event(&self, event: RecognitionEvent) -> Result<(), ChatError> {
        let update = lock(&self.capture, "capture")?.handle_event(event);
        if let Some(update) = update {
            self.reflect_capture(update);
        }
        Ok(())
    }

    pub fn is_listening(&self) -> Result<bool, ChatError> {
        Ok(lock(&self.capture, "capture")?.is_listening())
    }

    fn reflect_capture(&self, update: CaptureUpdate) {
        match update {
            CaptureUpdate::Live(text) => self.surface.set_input_text(&text),
            CaptureUpdate::Stopped {
                reason,
                transcript_ready,
            } => {
                if let StopReason::Fault(message) = &reason {
                    tracing::debug!(error = %message, "Listening ended by recognition fault");
                }
                self.surface.set_listening(false);
                self.surface.set_send_transcript_enabled(transcript_ready);
            }
        }
    }

    // =========================================================================
    // Turns
    // =========================================================================

    /// Submit typed text, with the staged image if there is one.
    ///
    /// Returns `Ok(None)` when there is nothing to send.
    pub async fn submit_turn(&self, text: &str) -> Result<Option<TurnOutcome>, ChatError> {
        let text = text.trim();
        let preview = lock(&self.staging, "attachment")?
            .current()
            .map(|s| s.preview_uri().to_string());
        if text.is_empty() && preview.is_none() {
            return Ok(None);
        }

        let _pending = PendingTurn::begin(&self.in_flight, self.surface.as_ref())?;
        self.surface.set_input_text("");
        self.end_capture_for_typed_send()?;

        let message = if text.is_empty() { IMAGE_ONLY_PROMPT } else { text };
        let user_turn = Turn::user(message, preview);
        self.surface.show_turn(&user_turn, None);

        let result = self
            .dispatcher
            .dispatch(message, DispatchMode::Typed, &self.session, &self.staging)
            .await;
        let speak = self.config.speech.speak_replies;
        self.complete_turn(user_turn, result, speak).await.map(Some)
    }

    /// Send the committed voice transcript through the voice endpoint.
    ///
    /// Capture is stopped first. The reply is spoken when playback exists.
    pub async fn submit_transcript(&self) -> Result<Option<TurnOutcome>, ChatError> {
        let _pending = PendingTurn::begin(&self.in_flight, self.surface.as_ref())?;

        let transcript = {
            let mut capture = lock(&self.capture, "capture")?;
            if let Some(update) = capture.stop() {
                self.reflect_capture(update);
            }
            capture.take_transcript()
        };
        self.surface.set_send_transcript_enabled(false);
        if transcript.trim().is_empty() {
            return Ok(None);
        }
        self.surface.set_input_text("");

        let user_turn = Turn::user(transcript.trim(), None);
        self.surface.show_turn(&user_turn, None);

        let result = self
            .dispatcher
            .dispatch(user_turn.text(), DispatchMode::Transcript, &self.session, &self.staging)
            .await;
        self.complete_turn(user_turn, result, true).await.map(Some)
    }

    /// Stop a recording that a typed send interrupts. The committed
    /// transcript was mirrored into the sent text, so it is dropped.
    fn end_capture_for_typed_send(&self) -> Result<(), ChatError> {
        let mut capture = lock(&self.capture, "capture")?;
        if let Some(update) = capture.stop() {
            self.reflect_capture(update);
            let dropped = capture.take_transcript();
            tracing::debug!(chars = dropped.len(), "Transcript superseded by typed send");
            self.surface.set_send_transcript_enabled(false);
        }
        Ok(())
    }

    pub fn is_turn_pending(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    async fn complete_turn(
        &self,
        user_turn: Turn,
        result: Result<String, ChatError>,
        speak: bool,
    ) -> Result<TurnOutcome, ChatError> {
        let (reply, used_fallback) = match result {
            Ok(reply) => (reply, false),
            Err(e) if e.is_fallback() => {
                tracing::warn!(error = %e, "Answering turn with fallback message");
                (fallback_message().to_string(), true)
            }
            Err(e) => {
                tracing::error!(error = %e, "Turn failed");
                self.surface.show_notice(&e.to_string());
                return Err(e);
            }
        };

        let assistant_turn = Turn::assistant(reply);
        self.show(&assistant_turn);

        let snapshot = {
            let mut session = lock(&self.session, "session")?;
            session.append(user_turn.clone());
            session.append(assistant_turn.clone());
            self.store.as_ref().map(|_| session.turns().to_vec())
        };
        if let Some(turns) = snapshot {
            self.persist(turns).await;
        }

        if lock(&self.staging, "attachment")?.is_empty() {
            self.surface.show_attachment(None);
        }
        if speak {
            self.speak_quietly(assistant_turn.text());
        }

        Ok(TurnOutcome {
            user_turn,
            assistant_turn,
            used_fallback,
        })
    }

    fn show(&self, turn: &Turn) {
        match turn.author() {
            Author::User => self.surface.show_turn(turn, None),
            Author::Assistant => {
                let markup = self.renderer.render(turn.text());
                self.surface.show_turn(turn, Some(&markup));
            }
        }
    }

    /// Write the slot off the async thread. Failures are logged only.
    async fn persist(&self, turns: Vec<Turn>) {
        let Some(store) = self.store.clone() else {
            return;
        };
        let path = store.path().display().to_string();
        match tokio::task::spawn_blocking(move || store.save(&turns)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(path = %path, error = %e, "Could not persist chat history"),
            Err(e) => tracing::warn!(path = %path, error = %e, "History write task failed"),
        }
    }

    // =========================================================================
    // Speech
    // =========================================================================

    /// Speak `text`, replacing whatever is being spoken.
    pub fn speak(&self, text: &str) -> Result<(), ChatError> {
        lock(&self.playback, "playback")?.speak(text)?;
        Ok(())
    }

    /// Speak the most recent assistant reply. Returns `false` when there is none.
    pub fn speak_last_reply(&self) -> Result<bool, ChatError> {
        let last = lock(&self.session, "session")?
            .last_assistant_turn()
            .map(|t| t.text().to_string());
        match last {
            Some(text) => {
                self.speak(&text)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn stop_speaking(&self) -> Result<(), ChatError> {
        lock(&self.playback, "playback")?.stop();
        Ok(())
    }

    /// The synthesizer finished the active utterance.
    pub fn speech_finished(&self) -> Result<(), ChatError> {
        lock(&self.playback, "playback")?.utterance_finished();
        Ok(())
    }

    fn speak_quietly(&self, text: &str) {
        match self.speak(text) {
            Ok(()) => {}
            Err(ChatError::Voice(VoiceError::PlaybackUnavailable)) => {}
            Err(e) => tracing::warn!(error = %e, "Could not speak reply"),
        }
    }

    // =========================================================================
    // Session
    // =========================================================================

    pub fn session_id(&self) -> Result<Option<String>, ChatError> {
        Ok(lock(&self.session, "session")?.session_id().map(str::to_string))
    }

    pub fn turns(&self) -> Result<Vec<Turn>, ChatError> {
        Ok(lock(&self.session, "session")?.turns().to_vec())
    }

    /// Forget the local log and the persisted slot. The session id is kept.
    pub fn clear_history(&self) -> Result<(), ChatError> {
        lock(&self.session, "session")?.clear_turns();
        if let Some(store) = &self.store {
            store.clear()?;
        }
        tracing::info!("Chat history cleared");
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
