//! Azure Cognitive Services speech REST client.

use anyhow::Context;
use async_trait::async_trait;
use tracing::debug;

use crate::{CancellationCategory, SpeechBackend, SynthesisOutcome};

/// Canonical output encoding: 48kHz/192kbps mono MP3.
pub const OUTPUT_FORMAT: &str = "audio-48khz-192kbitrate-mono-mp3";

const USER_AGENT: &str = concat!("voicerelay/", env!("CARGO_PKG_VERSION"));

/// Synthesis endpoint client for one region. Safe to share across
/// concurrent calls; construct once at startup.
pub struct AzureSynthesizer {
    region: String,
    subscription_key: String,
    client: reqwest::Client,
}

impl AzureSynthesizer {
    pub fn new(subscription_key: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            subscription_key: subscription_key.into(),
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("https://{}.tts.speech.microsoft.com/cognitiveservices/v1", self.region)
    }
}

#[async_trait]
impl SpeechBackend for AzureSynthesizer {
    async fn synthesize(&self, ssml: &str) -> anyhow::Result<SynthesisOutcome> {
        let response = self
            .client
            .post(self.endpoint())
            .header("Ocp-Apim-Subscription-Key", &self.subscription_key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", OUTPUT_FORMAT)
            .header("User-Agent", USER_AGENT)
            .body(ssml.to_string())
            .send()
            .await
            .context("speech synthesis request failed")?;

        let status = response.status();
        if status.is_success() {
            let audio = response
                .bytes()
                .await
                .context("failed to read synthesized audio")?;
            debug!(bytes = audio.len(), "Speech synthesis completed");
            return Ok(SynthesisOutcome::Audio(audio));
        }

        // The service reports synthesis problems in the response body;
        // surface them as a cancellation carrying the service's detail.
        let body = response.text().await.unwrap_or_default();
        let detail = if body.is_empty() { status.to_string() } else { body };
        Ok(SynthesisOutcome::Canceled {
            reason: CancellationCategory::Error,
            detail: Some(detail),
        })
    }
}

/// Issues short-lived bearer tokens for the browser speech SDK by
/// forwarding to the region's token service.
pub struct TokenIssuer {
    region: String,
    subscription_key: String,
    client: reqwest::Client,
}

impl TokenIssuer {
    pub fn new(subscription_key: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            subscription_key: subscription_key.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    fn endpoint(&self) -> String {
        format!("https://{}.api.cognitive.microsoft.com/sts/v1.0/issueToken", self.region)
    }

    /// Fetch one ephemeral token. The response body is the token string.
    pub async fn issue(&self) -> anyhow::Result<String> {
        let response = self
            .client
            .post(self.endpoint())
            .header("Ocp-Apim-Subscription-Key", &self.subscription_key)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .send()
            .await
            .context("token request failed")?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to get token: {body}");
        }

        Ok(response.text().await?)
    }
}
