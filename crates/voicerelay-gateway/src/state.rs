//! Shared relay state.

use std::sync::Arc;

use voicerelay_providers::ChatProvider;
use voicerelay_speech::azure::TokenIssuer;
use voicerelay_speech::{SpeechBackend, VoiceProfile};

/// State shared by all request handlers. Everything here is read-only
/// after startup, so concurrent sessions need no locking.
pub struct AppState {
    pub chat: Arc<dyn ChatProvider>,
    pub speech: Arc<dyn SpeechBackend>,
    pub voice: VoiceProfile,
    /// Token proxy; absent when speech credentials were not configured
    /// for it (tests).
    pub tokens: Option<Arc<TokenIssuer>>,
    /// Output cap for one streamed completion.
    pub max_tokens: u32,
}

impl AppState {
    pub fn new(
        chat: Arc<dyn ChatProvider>,
        speech: Arc<dyn SpeechBackend>,
        voice: VoiceProfile,
        tokens: Option<Arc<TokenIssuer>>,
        max_tokens: u32,
    ) -> Self {
        Self { chat, speech, voice, tokens, max_tokens }
    }
}
