//! Streaming chat-completion client.
//!
//! The relay talks to one OpenAI-compatible provider; the [`ChatProvider`]
//! trait is the seam that lets the gateway run against a scripted stub in
//! tests.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

use voicerelay_core::protocol::ConversationTurn;

pub mod openai;
pub mod sse;

/// A request for one streamed completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub messages: Vec<ConversationTurn>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// One streamed increment from the provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionChunk {
    /// Incremental assistant text, exactly as the provider emitted it.
    pub delta: Option<String>,
    /// Provider-reported stop reason, when the turn is done.
    pub stop_reason: Option<String>,
}

pub type ChunkStream = Pin<Box<dyn Stream<Item = anyhow::Result<CompletionChunk>> + Send>>;

/// A streaming chat-completion provider.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider identifier (e.g. "openai").
    fn id(&self) -> &str;

    /// Open a token-streamed completion. The returned stream is pulled by
    /// a single consumer; dropping it stops the upstream request.
    async fn stream(&self, request: &CompletionRequest) -> anyhow::Result<ChunkStream>;
}
