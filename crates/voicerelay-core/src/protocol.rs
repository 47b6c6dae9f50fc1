//! Wire protocol shared by the completion streamer and the synthesis relay.

use serde::{Deserialize, Serialize};
use serde_json::json;

/// Reserved sentinel signaling end-of-turn to the client.
///
/// The system prompt and the output token cap make an organic collision
/// with model output unlikely, not impossible; the marker is an accepted
/// approximation.
pub const END_MARKER: &str = "【END】";

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of a conversation. An ordered list of turns is the full
/// context sent upstream; turns are never mutated mid-stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// One server-push event in a completion stream.
///
/// Every opened stream yields zero or more `Delta` events followed by
/// exactly one terminal event (`End` or `Error`) — never a silent close.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// One incremental piece of assistant text, in arrival order.
    Delta { content: String },
    /// Normal completion; the wire payload carries [`END_MARKER`].
    End,
    /// Terminal failure, reported in-band.
    Error { message: String },
}

impl StreamEvent {
    /// JSON payload carried in the SSE `data:` field.
    pub fn wire_payload(&self) -> serde_json::Value {
        match self {
            StreamEvent::Delta { content } => json!({ "content": content }),
            StreamEvent::End => json!({ "content": END_MARKER }),
            StreamEvent::Error { message } => json!({ "error": message }),
        }
    }

    /// `End` and `Error` close the stream; nothing may follow them.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::Delta { .. })
    }
}

/// Typed view of one inbound synthesis text.
///
/// The sentinel string is interpreted here and nowhere else; the rest of
/// the relay only ever sees the two variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpokenFragment {
    /// Trimmed text to synthesize.
    Text(String),
    /// The turn is over; nothing should be synthesized.
    EndOfTurn,
}

impl SpokenFragment {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed == END_MARKER {
            SpokenFragment::EndOfTurn
        } else {
            SpokenFragment::Text(trimmed.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serialization_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), r#""user""#);
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), r#""assistant""#);
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), r#""system""#);
    }

    #[test]
    fn test_turn_roundtrip_from_client_json() {
        let turn: ConversationTurn =
            serde_json::from_str(r#"{"role":"user","content":"hello"}"#).unwrap();
        assert_eq!(turn, ConversationTurn::user("hello"));
    }

    #[test]
    fn test_delta_wire_payload() {
        let event = StreamEvent::Delta { content: "Hi".into() };
        assert_eq!(event.wire_payload(), json!({"content": "Hi"}));
        assert!(!event.is_terminal());
    }

    #[test]
    fn test_end_wire_payload_carries_marker() {
        let event = StreamEvent::End;
        assert_eq!(event.wire_payload(), json!({"content": "【END】"}));
        assert!(event.is_terminal());
    }

    #[test]
    fn test_error_wire_payload() {
        let event = StreamEvent::Error { message: "boom".into() };
        assert_eq!(event.wire_payload(), json!({"error": "boom"}));
        assert!(event.is_terminal());
    }

    #[test]
    fn test_fragment_parse_end_marker() {
        assert_eq!(SpokenFragment::parse("【END】"), SpokenFragment::EndOfTurn);
        assert_eq!(SpokenFragment::parse("  【END】\n"), SpokenFragment::EndOfTurn);
    }

    #[test]
    fn test_fragment_parse_text_is_trimmed() {
        assert_eq!(
            SpokenFragment::parse(" こんにちは "),
            SpokenFragment::Text("こんにちは".into())
        );
    }

    #[test]
    fn test_fragment_parse_marker_inside_text_is_not_end() {
        // Only an exact (trimmed) match is the end-of-turn signal.
        assert_eq!(
            SpokenFragment::parse("done 【END】"),
            SpokenFragment::Text("done 【END】".into())
        );
    }
}
