//! Turn and session controller for the KisanGPT client.
//!
//! Stages image attachments, keeps the conversation log, builds one request
//! per user turn for the right backend endpoint, and sequences the surface
//! around each turn so it can never be left disabled.

pub mod attachment;
pub mod backend;
pub mod dispatcher;
pub mod error;
pub mod fallback;
pub mod location;
pub mod markdown;
pub mod orchestrator;
pub mod request;
pub mod session;
pub mod store;
pub mod surface;

pub use attachment::{AttachmentFile, AttachmentStaging, StagedAttachment};
pub use backend::{Backend, HttpBackend};
pub use dispatcher::{DispatchMode, RequestDispatcher};
pub use error::ChatError;
pub use fallback::fallback_message;
pub use location::{CityListExtractor, LocationExtractor};
pub use markdown::{HtmlMarkdown, MarkdownRenderer};
pub use orchestrator::{TurnOrchestrator, TurnOutcome};
pub use request::{BackendInfo, ChatReply, ImageChatForm, OutboundRequest, TextChatBody, VoiceChatBody};
pub use session::ConversationSession;
pub use store::HistoryStore;
pub use surface::ChatSurface;
