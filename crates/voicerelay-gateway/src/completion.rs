//! Completion streaming endpoint.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::response::sse::{Event, Sse};
use futures::Stream;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

use voicerelay_core::protocol::{ConversationTurn, StreamEvent};
use voicerelay_providers::{ChunkStream, CompletionRequest};

use crate::state::AppState;

/// Leading system turn prepended to every conversation.
const SYSTEM_PROMPT: &str = "あなたは役立つAIアシスタントです。";

/// POST /completion/stream — relay a conversation as a live SSE stream.
///
/// Validation and upstream failures are reported in-band as a terminal
/// `{"error": ...}` frame; the transport has already committed to a 200
/// streaming response. Input rejection happens before the upstream call
/// is ever issued.
pub async fn completion_stream(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let phase = match parse_conversation(&body) {
        Ok(turns) => Phase::Open(state, turns),
        Err(message) => {
            warn!(%message, "Rejecting completion request");
            Phase::Fail(message)
        }
    };
    Sse::new(event_stream(phase))
}

fn parse_conversation(body: &[u8]) -> Result<Vec<ConversationTurn>, String> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|_| "No conversation provided".to_string())?;
    let Some(conversation) = value.get("conversation") else {
        return Err("No conversation provided".into());
    };
    if !conversation.is_array() {
        return Err("Conversation should be a list".into());
    }
    serde_json::from_value(conversation.clone()).map_err(|e| format!("Malformed conversation: {e}"))
}

enum Phase {
    /// Input was rejected; emit one terminal error.
    Fail(String),
    /// Open the upstream completion stream.
    Open(Arc<AppState>, Vec<ConversationTurn>),
    /// Relay upstream chunks.
    Stream(ChunkStream),
    Done,
}

/// Drive the relay as an unfold: zero or more `Delta` frames, then
/// exactly one terminal frame (`End` or `Error`), then nothing.
fn event_stream(initial: Phase) -> impl Stream<Item = Result<Event, Infallible>> {
    futures::stream::unfold(initial, |mut phase| async move {
        loop {
            match phase {
                Phase::Fail(message) => {
                    return Some((sse_frame(&StreamEvent::Error { message }), Phase::Done));
                }
                Phase::Open(state, turns) => {
                    let mut messages = Vec::with_capacity(turns.len() + 1);
                    messages.push(ConversationTurn::system(SYSTEM_PROMPT));
                    messages.extend(turns);

                    let request = CompletionRequest {
                        messages,
                        max_tokens: state.max_tokens,
                        temperature: None,
                    };

                    match state.chat.stream(&request).await {
                        Ok(chunks) => phase = Phase::Stream(chunks),
                        Err(e) => {
                            warn!(error = %e, "Failed to open completion stream");
                            let event = StreamEvent::Error { message: e.to_string() };
                            return Some((sse_frame(&event), Phase::Done));
                        }
                    }
                }
                Phase::Stream(mut chunks) => match chunks.next().await {
                    Some(Ok(chunk)) => {
                        if let Some(content) = chunk.delta {
                            if !content.is_empty() {
                                let event = StreamEvent::Delta { content };
                                return Some((sse_frame(&event), Phase::Stream(chunks)));
                            }
                        }
                        // Stop-reason chunks and empty deltas are not frames
                        phase = Phase::Stream(chunks);
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "Completion stream failed");
                        let event = StreamEvent::Error { message: e.to_string() };
                        return Some((sse_frame(&event), Phase::Done));
                    }
                    None => {
                        debug!("Completion stream finished");
                        return Some((sse_frame(&StreamEvent::End), Phase::Done));
                    }
                },
                Phase::Done => return None,
            }
        }
    })
}

fn sse_frame(event: &StreamEvent) -> Result<Event, Infallible> {
    Ok(Event::default().data(event.wire_payload().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_conversation_ok() {
        let turns =
            parse_conversation(br#"{"conversation":[{"role":"user","content":"hello"}]}"#).unwrap();
        assert_eq!(turns, vec![ConversationTurn::user("hello")]);
    }

    #[test]
    fn test_parse_conversation_missing_key() {
        assert_eq!(parse_conversation(b"{}").unwrap_err(), "No conversation provided");
    }

    #[test]
    fn test_parse_conversation_invalid_json() {
        assert_eq!(parse_conversation(b"").unwrap_err(), "No conversation provided");
    }

    #[test]
    fn test_parse_conversation_not_a_list() {
        assert_eq!(
            parse_conversation(br#"{"conversation":"hi"}"#).unwrap_err(),
            "Conversation should be a list"
        );
    }

    #[test]
    fn test_parse_conversation_bad_turn_shape() {
        let err = parse_conversation(br#"{"conversation":[{"role":"robot","content":"x"}]}"#)
            .unwrap_err();
        assert!(err.starts_with("Malformed conversation"));
    }
}
