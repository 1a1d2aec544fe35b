//! Spoken-language heuristic for speech synthesis.
//!
//! Picks a regional locale from the Unicode block of the text's characters.

/// Chooses the locale an utterance should be spoken in.
pub trait LanguageClassifier: Send + Sync {
    fn classify(&self, text: &str) -> String;
}

/// Locale used when no regional script is found.
pub const DEFAULT_SPEECH_LOCALE: &str = "en-IN";

/// Script blocks in priority order. The first block with any character in the
/// text wins.
const SCRIPT_LOCALES: &[(char, char, &str)] = &[
    ('\u{0900}', '\u{097F}', "hi-IN"), // Devanagari
    ('\u{0A80}', '\u{0AFF}', "gu-IN"), // Gujarati
    ('\u{0A00}', '\u{0A7F}', "pa-IN"), // Gurmukhi
    ('\u{0980}', '\u{09FF}', "bn-IN"), // Bengali
    ('\u{0C80}', '\u{0CFF}', "kn-IN"), // Kannada
    ('\u{0C00}', '\u{0C7F}', "te-IN"), // Telugu
    ('\u{0B80}', '\u{0BFF}', "ta-IN"), // Tamil
];

/// Unicode-block classifier over the Indic scripts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptLanguageClassifier;

impl LanguageClassifier for ScriptLanguageClassifier {
    fn classify(&self, text: &str) -> String {
        SCRIPT_LOCALES
            .iter()
            .find(|(lo, hi, _)| text.chars().any(|c| (*lo..=*hi).contains(&c)))
            .map(|(_, _, locale)| *locale)
            .unwrap_or(DEFAULT_SPEECH_LOCALE)
            .to_string()
    }
}
