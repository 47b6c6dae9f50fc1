//! Synthesis relay endpoints.

use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{debug, info, warn};

use voicerelay_core::protocol::SpokenFragment;
use voicerelay_speech::{AUDIO_MIME, CancellationCategory, SynthesisOutcome, ssml};

use crate::state::AppState;

/// Fixed filler text synthesized by the warm-up endpoint.
const WARMUP_TEXT: &str = "ウォームアップ用のダミーテキストです。";

/// POST /synthesis — turn one text fragment into audio.
///
/// The end marker short-circuits to a completion signal without touching
/// the backend; it is the only way the client learns the turn is over.
pub async fn synthesize(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(&body) else {
        return client_error("No text provided");
    };
    let Some(text) = value.get("text") else {
        return client_error("No text provided");
    };
    let Some(text) = text.as_str() else {
        return client_error("Text should be a string");
    };

    match SpokenFragment::parse(text) {
        SpokenFragment::EndOfTurn => {
            debug!("End marker received, no synthesis needed");
            Json(json!({ "status": "completed" })).into_response()
        }
        SpokenFragment::Text(text) => speak(&state, &text).await,
    }
}

async fn speak(state: &AppState, text: &str) -> Response {
    let ssml = ssml::wrap_fragment(&state.voice, text);

    let started = Instant::now();
    let outcome = state.speech.synthesize(&ssml).await;
    let elapsed = started.elapsed();

    match outcome {
        Ok(SynthesisOutcome::Audio(audio)) => {
            info!(
                duration_ms = elapsed.as_millis() as u64,
                bytes = audio.len(),
                chars = text.chars().count(),
                "Synthesis completed"
            );
            ([(header::CONTENT_TYPE, AUDIO_MIME)], audio).into_response()
        }
        Ok(SynthesisOutcome::Canceled { reason, detail }) => {
            let mut message = format!("Speech synthesis canceled: {reason}");
            if reason == CancellationCategory::Error {
                if let Some(detail) = detail {
                    message.push_str(", ");
                    message.push_str(&detail);
                }
            }
            warn!(%message, "Synthesis canceled by backend");
            backend_error(&message)
        }
        Err(e) => {
            warn!(error = %e, "Synthesis failed");
            backend_error("Speech synthesis failed")
        }
    }
}

/// GET /synthesis/warmup — one synthesis call against fixed filler text
/// to pre-warm backend connections. The audio is discarded.
pub async fn warmup(State(state): State<Arc<AppState>>) -> Response {
    let ssml = ssml::wrap_fragment(&state.voice, WARMUP_TEXT);

    let started = Instant::now();
    match state.speech.synthesize(&ssml).await {
        Ok(SynthesisOutcome::Audio(audio)) => {
            let duration = started.elapsed().as_secs_f64();
            info!(duration, bytes = audio.len(), "Warmup synthesis completed");
            Json(json!({ "status": "warmup_completed", "duration": duration })).into_response()
        }
        Ok(SynthesisOutcome::Canceled { reason, detail }) => {
            warn!(%reason, ?detail, "Warmup synthesis canceled");
            backend_error("Warmup synthesis failed or canceled")
        }
        Err(e) => {
            warn!(error = %e, "Warmup synthesis failed");
            backend_error("Warmup synthesis failed or canceled")
        }
    }
}

fn client_error(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

fn backend_error(message: &str) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": message }))).into_response()
}
