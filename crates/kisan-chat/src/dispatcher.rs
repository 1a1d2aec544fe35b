//! Builds one outbound request per turn, performs it, and classifies the outcome.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::attachment::{AttachmentStaging, StagedAttachment};
use crate::backend::Backend;
use crate::error::{lock, ChatError};
use crate::location::{CityListExtractor, LocationExtractor};
use crate::request::{ImageChatForm, OutboundRequest, TextChatBody, VoiceChatBody};
use crate::session::ConversationSession;

/// How the turn text was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Typed into the input field; may carry the staged image.
    Typed,
    /// Committed voice transcript; never carries an image.
    Transcript,
}

pub struct RequestDispatcher {
    backend: Arc<dyn Backend>,
    locator: Box<dyn LocationExtractor>,
    context_turns: usize,
    client_api_key: Option<String>,
    backend_has_key: AtomicBool,
    location: Mutex<Option<String>>,
}

impl std::fmt::Debug for RequestDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestDispatcher")
            .field("context_turns", &self.context_turns)
            .field("has_client_key", &self.client_api_key.is_some())
            .field("backend_has_key", &self.backend_has_key.load(Ordering::Relaxed))
            .finish()
    }
}

impl RequestDispatcher {
    pub fn new(backend: Arc<dyn Backend>, context_turns: usize, client_api_key: Option<String>) -> Self {
        Self {
            backend,
            locator: Box::new(CityListExtractor::default()),
            context_turns,
            client_api_key: client_api_key.filter(|k| !k.trim().is_empty()),
            backend_has_key: AtomicBool::new(false),
            location: Mutex::new(None),
        }
    }

    pub fn with_location_extractor(mut self, locator: Box<dyn LocationExtractor>) -> Self {
        self.locator = locator;
        self
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Record whether the backend has its own key. When it does, the client
    /// key is never forwarded.
    pub fn set_backend_has_key(&self, has_key: bool) {
        self.backend_has_key.store(has_key, Ordering::SeqCst);
    }

    /// Pin an explicit location; `None` returns to extraction from the text.
    pub fn set_location(&self, location: Option<String>) -> Result<(), ChatError> {
        let location = location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());
        *lock(&self.location, "location")? = location;
        Ok(())
    }

    fn forwarded_key(&self) -> Option<String> {
        if self.backend_has_key.load(Ordering::SeqCst) {
            None
        } else {
            self.client_api_key.clone()
        }
    }

    fn resolve_location(&self, text: &str) -> Result<Option<String>, ChatError> {
        let explicit = lock(&self.location, "location")?.clone();
        Ok(explicit.or_else(|| self.locator.extract(text)))
    }

    /// Shape the request for `text` from the current session and staged image.
    pub fn build_request(
        &self,
        text: &str,
        mode: DispatchMode,
        session: &ConversationSession,
        attachment: Option<&StagedAttachment>,
    ) -> Result<OutboundRequest, ChatError> {
        let session_id = session.session_id().map(str::to_string);

        let request = match (mode, attachment) {
            (DispatchMode::Transcript, _) => OutboundRequest::Voice(VoiceChatBody {
                transcript: text.to_string(),
                session_id,
                conversation_history: session.history_window(self.context_turns),
                gemini_api_key: self.forwarded_key(),
            }),
            (DispatchMode::Typed, Some(staged)) => OutboundRequest::Image(ImageChatForm {
                message: text.to_string(),
                image: staged.file().clone(),
                attachment_id: staged.id(),
                location: self.resolve_location(text)?,
                session_id,
                api_key: self.forwarded_key(),
            }),
            (DispatchMode::Typed, None) => OutboundRequest::Text(TextChatBody {
                message: text.to_string(),
                location: self.resolve_location(text)?,
                session_id,
                gemini_api_key: self.forwarded_key(),
                conversation_history: session.history_window(self.context_turns),
            }),
        };
        Ok(request)
    }

    /// Send one turn and return the reply text.
    ///
    /// Locks are only held while the request is built and while the outcome is
    /// applied, never across the network call. The staged image is cleared
    /// only if the reply is usable and the slot still holds the image sent.
    pub async fn dispatch(
        &self,
        text: &str,
        mode: DispatchMode,
        session: &Mutex<ConversationSession>,
        staging: &Mutex<AttachmentStaging>,
    ) -> Result<String, ChatError> {
        let request = {
            let session = lock(session, "session")?;
            let staging = lock(staging, "attachment")?;
            let attachment = match mode {
                DispatchMode::Typed => staging.current(),
                DispatchMode::Transcript => None,
            };
            self.build_request(text, mode, &session, attachment)?
        };

        let endpoint = request.endpoint();
        let reply = self.backend.send(&request).await?;

        let response = match reply.response {
            Some(r) if !r.trim().is_empty() => r,
            _ => {
                tracing::warn!(endpoint, "Backend reply had no response text");
                return Err(ChatError::EmptyReply);
            }
        };

        if let Some(id) = reply.session_id.as_deref() {
            lock(session, "session")?.adopt_session_id(id);
        }
        if let Some(id) = request.attachment_id() {
            if lock(staging, "attachment")?.clear_if(id) {
                tracing::debug!(attachment_id = %id, "Staged image consumed");
            }
        }

        tracing::info!(endpoint, chars = response.len(), "Turn answered");
        Ok(response)
    }
}
