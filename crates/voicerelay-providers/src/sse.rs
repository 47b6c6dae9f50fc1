//! Minimal SSE (Server-Sent Events) decoder for provider response bodies.

use futures::Stream;
use tokio_stream::StreamExt;

/// A decoded SSE event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

/// Incremental line-oriented decoder. Lines are fed one at a time; a
/// blank line dispatches the accumulated event.
#[derive(Debug, Default)]
pub struct SseDecoder {
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn feed_line(&mut self, line: &str) -> Option<SseEvent> {
        let line = line.trim_end_matches('\r');

        if line.is_empty() {
            return self.flush();
        }
        if line.starts_with(':') {
            // Comment, skip
            return None;
        }

        if let Some(value) = line.strip_prefix("event:") {
            self.event = Some(value.trim_start().to_string());
        } else if let Some(value) = line.strip_prefix("data:") {
            self.data.push(value.trim_start().to_string());
        }
        // id and unknown fields are ignored
        None
    }

    /// Dispatch whatever has accumulated, if anything. Used at blank
    /// lines and once more when the transport closes.
    pub fn flush(&mut self) -> Option<SseEvent> {
        if self.data.is_empty() {
            self.event = None;
            return None;
        }
        Some(SseEvent {
            event: self.event.take(),
            data: std::mem::take(&mut self.data).join("\n"),
        })
    }
}

/// Decode a streaming HTTP response body into SSE events.
pub fn decode_sse(response: reqwest::Response) -> impl Stream<Item = anyhow::Result<SseEvent>> {
    let state = DecodeState {
        body: Box::pin(response.bytes_stream()),
        buffer: String::new(),
        decoder: SseDecoder::default(),
        done: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if state.done {
                return None;
            }

            // Drain complete lines already buffered
            if let Some(pos) = state.buffer.find('\n') {
                let line: String = state.buffer.drain(..=pos).collect();
                if let Some(event) = state.decoder.feed_line(line.trim_end_matches('\n')) {
                    return Some((Ok(event), state));
                }
                continue;
            }

            match state.body.next().await {
                Some(Ok(chunk)) => {
                    state.buffer.push_str(&String::from_utf8_lossy(&chunk));
                }
                Some(Err(e)) => {
                    state.done = true;
                    return Some((Err(anyhow::anyhow!("SSE stream error: {e}")), state));
                }
                None => {
                    state.done = true;
                    // Dispatch a trailing event that was never newline-terminated
                    let tail = std::mem::take(&mut state.buffer);
                    if !tail.is_empty() {
                        if let Some(event) = state.decoder.feed_line(&tail) {
                            return Some((Ok(event), state));
                        }
                    }
                    if let Some(event) = state.decoder.flush() {
                        return Some((Ok(event), state));
                    }
                    return None;
                }
            }
        }
    })
}

struct DecodeState {
    body: std::pin::Pin<Box<dyn Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send>>,
    buffer: String,
    decoder: SseDecoder,
    done: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(input: &str) -> Vec<SseEvent> {
        let mut decoder = SseDecoder::default();
        let mut events = Vec::new();
        for line in input.split('\n') {
            if let Some(event) = decoder.feed_line(line) {
                events.push(event);
            }
        }
        if let Some(event) = decoder.flush() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_single_data_event() {
        let events = decode_all("data: {\"content\":\"Hi\"}\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "{\"content\":\"Hi\"}");
        assert_eq!(events[0].event, None);
    }

    #[test]
    fn test_multiline_data_joined_with_newline() {
        let events = decode_all("data: one\ndata: two\n\n");
        assert_eq!(events[0].data, "one\ntwo");
    }

    #[test]
    fn test_event_field_and_crlf() {
        let events = decode_all("event: delta\r\ndata: x\r\n\r\n");
        assert_eq!(events[0].event.as_deref(), Some("delta"));
        assert_eq!(events[0].data, "x");
    }

    #[test]
    fn test_comments_and_unknown_fields_ignored() {
        let events = decode_all(": keepalive\nretry: 500\ndata: x\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "x");
    }

    #[test]
    fn test_blank_line_without_data_dispatches_nothing() {
        assert!(decode_all("\n\n\n").is_empty());
    }

    #[test]
    fn test_unterminated_trailing_event_is_flushed() {
        let events = decode_all("data: [DONE]");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "[DONE]");
    }
}
