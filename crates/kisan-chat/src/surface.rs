//! Presentation seam driven by the orchestrator.

use kisan_core::types::Turn;

/// Whatever shows the conversation to the user: a window, a terminal, a test
/// recorder. Calls are fire-and-forget.
pub trait ChatSurface: Send + Sync {
    /// Enable or disable the text input and send affordance.
    fn set_input_enabled(&self, enabled: bool);

    /// Replace the text input contents (live transcript, or empty after send).
    fn set_input_text(&self, text: &str);

    /// Show or hide the typing indicator.
    fn set_typing(&self, typing: bool);

    fn set_send_transcript_enabled(&self, enabled: bool);

    fn set_voice_available(&self, available: bool);

    fn set_speech_available(&self, available: bool);

    fn set_listening(&self, listening: bool);

    /// Show the staged image preview, or clear it with `None`.
    fn show_attachment(&self, preview_uri: Option<&str>);

    /// Append a turn. Assistant turns carry rendered markup.
    fn show_turn(&self, turn: &Turn, markup: Option<&str>);

    /// Inline assistant-style notice that is not part of the conversation.
    fn show_notice(&self, text: &str);
}
