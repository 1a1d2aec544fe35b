//! Line-oriented terminal front-end: command parsing and a stdout surface.

use std::io::Write;
use std::path::PathBuf;

use kisan_chat::ChatSurface;
use kisan_core::types::{Author, Turn};

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(String),
    Attach(PathBuf),
    Detach,
    /// `None` returns to extracting the location from each message.
    Location(Option<String>),
    Lang(String),
    Speak,
    Clear,
    Help,
    Quit,
    Unknown(String),
}

pub const HELP: &str = "\
Type a question and press Enter to send it.
  /attach <path>        stage an image for the next message
  /detach               remove the staged image
  /location <name|auto> pin a location, or go back to detecting it
  /lang <code|auto>     speech recognition language
  /speak                read the last reply aloud
  /clear                forget the conversation history
  /help                 show this help
  /quit                 exit";

pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Send(line.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match name {
        "attach" if !arg.is_empty() => Command::Attach(PathBuf::from(arg)),
        "detach" => Command::Detach,
        "location" if arg.is_empty() || arg.eq_ignore_ascii_case("auto") => Command::Location(None),
        "location" => Command::Location(Some(arg.to_string())),
        "lang" if !arg.is_empty() => Command::Lang(arg.to_string()),
        "speak" => Command::Speak,
        "clear" => Command::Clear,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    }
}

/// Writes conversation events to stdout.
#[derive(Debug, Default)]
pub struct TerminalSurface;

impl TerminalSurface {
    fn print(&self, text: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{text}");
    }
}

impl ChatSurface for TerminalSurface {
    fn set_input_enabled(&self, enabled: bool) {
        if enabled {
            let mut out = std::io::stdout().lock();
            let _ = write!(out, "> ");
            let _ = out.flush();
        }
    }

    // The terminal owns its input line.
    fn set_input_text(&self, _text: &str) {}

    fn set_typing(&self, typing: bool) {
        if typing {
            self.print("KisanGPT is typing...");
        }
    }

    fn set_send_transcript_enabled(&self, _enabled: bool) {}

    fn set_voice_available(&self, available: bool) {
        if !available {
            tracing::debug!("Voice input disabled: no speech recognition in the terminal");
        }
    }

    fn set_speech_available(&self, available: bool) {
        if !available {
            tracing::debug!("Spoken replies disabled: no speech synthesis in the terminal");
        }
    }

    fn set_listening(&self, _listening: bool) {}

    fn show_attachment(&self, preview_uri: Option<&str>) {
        if let Some(uri) = preview_uri {
            self.print(&format!("[image staged, {} byte preview]", uri.len()));
        }
    }

    fn show_turn(&self, turn: &Turn, _markup: Option<&str>) {
        let label = match turn.author() {
            Author::User => "you",
            Author::Assistant => "KisanGPT",
        };
        let image = if turn.image_data().is_some() { " [image]" } else { "" };
        self.print(&format!("\n{label}{image}: {}\n", turn.text()));
    }

    fn show_notice(&self, text: &str) {
        self.print(&format!("! {text}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_line_is_send() {
        assert_eq!(
            parse_command("  What crops suit black soil?  "),
            Command::Send("What crops suit black soil?".to_string())
        );
        assert_eq!(parse_command(""), Command::Send(String::new()));
    }

    #[test]
    fn test_attach_and_detach() {
        assert_eq!(
            parse_command("/attach /tmp/leaf photo.jpg"),
            Command::Attach(PathBuf::from("/tmp/leaf photo.jpg"))
        );
        assert_eq!(parse_command("/attach"), Command::Unknown("/attach".to_string()));
        assert_eq!(parse_command("/detach"), Command::Detach);
    }

    #[test]
    fn test_location() {
        assert_eq!(
            parse_command("/location Tamil Nadu"),
            Command::Location(Some("Tamil Nadu".to_string()))
        );
        assert_eq!(parse_command("/location auto"), Command::Location(None));
        assert_eq!(parse_command("/location"), Command::Location(None));
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse_command("/lang hi-IN"), Command::Lang("hi-IN".to_string()));
        assert_eq!(parse_command("/speak"), Command::Speak);
        assert_eq!(parse_command("/clear"), Command::Clear);
        assert_eq!(parse_command("/help"), Command::Help);
        assert_eq!(parse_command("/quit"), Command::Quit);
        assert_eq!(parse_command("/exit"), Command::Quit);
        assert_eq!(parse_command("/dance"), Command::Unknown("/dance".to_string()));
    }
}
