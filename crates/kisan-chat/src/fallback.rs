//! Canned reply used when the backend cannot answer a turn.

const FALLBACK_MESSAGE: &str = "\
I'm having trouble reaching the KisanGPT service right now. Here is what I can help you with once it is back:

**Crop recommendations** for your soil, season and region
**Market prices** for crops at nearby mandis
**Weather updates** and farming advice for your area
**Pest and disease identification** from a photo of the affected plant
**Government schemes** and subsidies for farmers

Please try again in a moment.";

/// The deterministic capability overview shown in place of a reply.
pub fn fallback_message() -> &'static str {
    FALLBACK_MESSAGE
}
