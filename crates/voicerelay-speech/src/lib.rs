//! Speech synthesis client abstraction.
//!
//! The backend reports exactly three outcomes per call: audio, a
//! cancellation with a category (and detail when the category is an
//! error), or a failure — the `Err` arm of the surrounding `Result`.

use async_trait::async_trait;
use bytes::Bytes;

pub mod azure;
pub mod ssml;

/// MIME type of synthesized audio returned to clients.
pub const AUDIO_MIME: &str = "audio/mpeg";

/// Why the backend canceled a synthesis request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancellationCategory {
    /// The backend reported an error (bad credentials, malformed markup,
    /// quota exhaustion).
    Error,
    /// The request was interrupted before completion.
    Interrupted,
}

impl std::fmt::Display for CancellationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CancellationCategory::Error => write!(f, "Error"),
            CancellationCategory::Interrupted => write!(f, "Interrupted"),
        }
    }
}

/// Outcome of one synthesis call, as reported by the backend itself.
#[derive(Debug, Clone)]
pub enum SynthesisOutcome {
    /// Synthesis completed; the full encoded audio payload.
    Audio(Bytes),
    /// The backend canceled the request.
    Canceled {
        reason: CancellationCategory,
        detail: Option<String>,
    },
}

/// A synthesis backend. One outbound call per invocation, no retries;
/// implementations must be safe to share across concurrent calls.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    async fn synthesize(&self, ssml: &str) -> anyhow::Result<SynthesisOutcome>;
}

/// Voice selection applied to every synthesized fragment.
#[derive(Debug, Clone)]
pub struct VoiceProfile {
    pub name: String,
    pub language: String,
    /// Speaking-rate multiplier, in percent.
    pub rate_percent: u32,
}

impl Default for VoiceProfile {
    fn default() -> Self {
        Self {
            name: "ja-JP-NanamiNeural".into(),
            language: "ja-JP".into(),
            rate_percent: 150,
        }
    }
}
