//! Wire shapes for the backend endpoints.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use kisan_core::types::HistoryEntry;

use crate::attachment::AttachmentFile;

pub const CONFIG_PATH: &str = "/api/config";
pub const CHAT_PATH: &str = "/api/chat";
pub const IMAGE_CHAT_PATH: &str = "/api/chat-with-image";
pub const VOICE_CHAT_PATH: &str = "/api/voice-chat";

/// `GET /api/config` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendInfo {
    /// The backend holds its own Gemini key; the client must not send one.
    #[serde(default)]
    pub has_api_key: bool,
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub app_version: Option<String>,
}

/// JSON body for `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextChatBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gemini_api_key: Option<String>,
    pub conversation_history: Vec<HistoryEntry>,
}

/// Multipart fields for `POST /api/chat-with-image`.
#[derive(Debug, Clone)]
pub struct ImageChatForm {
    pub message: String,
    pub image: AttachmentFile,
    /// Staged attachment this form was built from.
    pub attachment_id: Uuid,
    pub location: Option<String>,
    pub session_id: Option<String>,
    pub api_key: Option<String>,
}

/// JSON body for `POST /api/voice-chat`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoiceChatBody {
    pub transcript: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub conversation_history: Vec<HistoryEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gemini_api_key: Option<String>,
}

/// One outbound request per turn.
#[derive(Debug, Clone)]
pub enum OutboundRequest {
    Text(TextChatBody),
    Image(ImageChatForm),
    Voice(VoiceChatBody),
}

impl OutboundRequest {
    /// Path of the endpoint this request targets.
    pub fn endpoint(&self) -> &'static str {
        match self {
            OutboundRequest::Text(_) => CHAT_PATH,
            OutboundRequest::Image(_) => IMAGE_CHAT_PATH,
            OutboundRequest::Voice(_) => VOICE_CHAT_PATH,
        }
    }

    /// The staged attachment carried by an image request.
    pub fn attachment_id(&self) -> Option<Uuid> {
        match self {
            OutboundRequest::Image(form) => Some(form.attachment_id),
            _ => None,
        }
    }
}

/// Response shape shared by all chat endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}
