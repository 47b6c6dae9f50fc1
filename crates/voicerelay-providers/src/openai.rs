//! OpenAI Chat Completions streaming client.
//!
//! Speaks the `/v1/chat/completions` streaming protocol, which also
//! covers OpenAI-compatible proxies via a custom base URL.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;
use tracing::{debug, trace};

use voicerelay_core::protocol::ConversationTurn;

use crate::sse::decode_sse;
use crate::{ChatProvider, ChunkStream, CompletionChunk, CompletionRequest};

const OPENAI_BASE_URL: &str = "https://api.openai.com";
const DONE_SENTINEL: &str = "[DONE]";

pub struct OpenAiChatProvider {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiChatProvider {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, base_url: Option<&str>) -> Self {
        Self {
            base_url: base_url
                .unwrap_or(OPENAI_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            model: model.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[derive(Debug, Serialize)]
struct ChatRequestBody<'a> {
    model: &'a str,
    messages: &'a [ConversationTurn],
    max_tokens: u32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl ChatProvider for OpenAiChatProvider {
    fn id(&self) -> &str {
        "openai"
    }

    async fn stream(&self, request: &CompletionRequest) -> anyhow::Result<ChunkStream> {
        let body = ChatRequestBody {
            model: &self.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            stream: true,
            temperature: request.temperature,
        };

        debug!(model = %self.model, turns = request.messages.len(), "Opening streamed chat completion");

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Chat completion request failed ({status}): {body}");
        }

        let events = Box::pin(decode_sse(response));

        let chunks = futures::stream::unfold(events, |mut events| async move {
            loop {
                match events.next().await {
                    Some(Ok(sse_event)) => {
                        let data = sse_event.data.trim();
                        if data == DONE_SENTINEL {
                            return None;
                        }

                        let chunk: ChatCompletionChunk = match serde_json::from_str(data) {
                            Ok(c) => c,
                            Err(e) => {
                                trace!(%e, data, "Skipping unparseable completion chunk");
                                continue;
                            }
                        };

                        let Some(choice) = chunk.choices.into_iter().next() else {
                            continue;
                        };

                        if let Some(content) = choice.delta.content {
                            if !content.is_empty() {
                                let c = CompletionChunk { delta: Some(content), stop_reason: None };
                                return Some((Ok(c), events));
                            }
                        }

                        if let Some(reason) = choice.finish_reason {
                            let c = CompletionChunk { delta: None, stop_reason: Some(reason) };
                            return Some((Ok(c), events));
                        }
                    }
                    Some(Err(e)) => return Some((Err(e), events)),
                    None => return None,
                }
            }
        });

        Ok(Box::pin(chunks))
    }
}
