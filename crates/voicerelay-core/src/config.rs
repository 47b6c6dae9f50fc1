//! Configuration loading and credential resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::VoiceRelayError;

const DEFAULT_BIND: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_MODEL: &str = "gpt-4";
const DEFAULT_MAX_TOKENS: u32 = 300;
const DEFAULT_VOICE: &str = "ja-JP-NanamiNeural";
const DEFAULT_LANGUAGE: &str = "ja-JP";
const DEFAULT_RATE_PERCENT: u32 = 150;

/// Top-level voicerelay configuration. Every section is optional; the
/// defaults plus the three credential environment variables are enough to
/// run the relay.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm: Option<LlmConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech: Option<SpeechConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// Chat-completion provider configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Speech-synthesis backend configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_key_env: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_percent: Option<u32>,
}

/// Credentials the relay needs before it can serve requests. Resolved
/// once at startup; a missing credential is fatal there, never deferred
/// to first request.
#[derive(Debug, Clone)]
pub struct ResolvedCredentials {
    pub llm_api_key: String,
    pub speech_key: String,
    pub speech_region: String,
}

/// Resolve a secret: direct config value first, then the configured
/// environment variable, then the conventional one. Empty values are
/// treated as unset.
pub fn resolve_secret(
    direct: Option<&str>,
    env_override: Option<&str>,
    default_env: &str,
) -> Option<String> {
    if let Some(val) = direct {
        if !val.is_empty() {
            return Some(val.to_string());
        }
    }
    if let Some(env) = env_override {
        return env_var_nonempty(env);
    }
    env_var_nonempty(default_env)
}

fn env_var_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

impl Config {
    /// Load config from a JSON5 file. A missing file yields the defaults.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(VoiceRelayError::Io)?;
        let config: Config =
            json5::from_str(&raw).map_err(|e| VoiceRelayError::Config(e.to_string()))?;

        Ok(config)
    }

    /// Default config file path, relative to the working directory.
    pub fn default_path() -> PathBuf {
        PathBuf::from("voicerelay.json")
    }

    pub fn bind_addr(&self) -> String {
        self.server
            .as_ref()
            .and_then(|s| s.bind.clone())
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
    }

    pub fn port(&self) -> u16 {
        self.server.as_ref().and_then(|s| s.port).unwrap_or(DEFAULT_PORT)
    }

    pub fn model(&self) -> String {
        self.llm
            .as_ref()
            .and_then(|l| l.model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    pub fn llm_base_url(&self) -> Option<String> {
        self.llm.as_ref().and_then(|l| l.base_url.clone())
    }

    /// Output cap for one streamed completion.
    pub fn max_tokens(&self) -> u32 {
        self.llm.as_ref().and_then(|l| l.max_tokens).unwrap_or(DEFAULT_MAX_TOKENS)
    }

    pub fn voice_name(&self) -> String {
        self.speech
            .as_ref()
            .and_then(|s| s.voice.clone())
            .unwrap_or_else(|| DEFAULT_VOICE.to_string())
    }

    pub fn voice_language(&self) -> String {
        self.speech
            .as_ref()
            .and_then(|s| s.language.clone())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
    }

    /// Speaking-rate multiplier applied to every synthesized fragment.
    pub fn speaking_rate_percent(&self) -> u32 {
        self.speech
            .as_ref()
            .and_then(|s| s.rate_percent)
            .unwrap_or(DEFAULT_RATE_PERCENT)
    }

    pub fn resolve_llm_api_key(&self) -> Option<String> {
        let llm = self.llm.as_ref();
        resolve_secret(
            llm.and_then(|l| l.api_key.as_deref()),
            llm.and_then(|l| l.api_key_env.as_deref()),
            "OPENAI_API_KEY",
        )
    }

    pub fn resolve_speech_key(&self) -> Option<String> {
        let speech = self.speech.as_ref();
        resolve_secret(
            speech.and_then(|s| s.subscription_key.as_deref()),
            speech.and_then(|s| s.subscription_key_env.as_deref()),
            "AZURE_SPEECH_KEY",
        )
    }

    pub fn resolve_speech_region(&self) -> Option<String> {
        let region = self.speech.as_ref().and_then(|s| s.region.as_deref());
        resolve_secret(region, None, "AZURE_SPEECH_REGION")
    }

    /// Resolve everything the relay needs, failing on the first missing
    /// credential.
    pub fn resolve_credentials(&self) -> crate::error::Result<ResolvedCredentials> {
        let llm_api_key = self.resolve_llm_api_key().ok_or_else(|| {
            VoiceRelayError::Config("LLM API key not set (llm.api_key or OPENAI_API_KEY)".into())
        })?;
        let speech_key = self.resolve_speech_key().ok_or_else(|| {
            VoiceRelayError::Config(
                "Speech subscription key not set (speech.subscription_key or AZURE_SPEECH_KEY)"
                    .into(),
            )
        })?;
        let speech_region = self.resolve_speech_region().ok_or_else(|| {
            VoiceRelayError::Config("Speech region not set (speech.region or AZURE_SPEECH_REGION)".into())
        })?;

        Ok(ResolvedCredentials { llm_api_key, speech_key, speech_region })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port(), 5000);
        assert_eq!(config.bind_addr(), "0.0.0.0");
        assert_eq!(config.model(), "gpt-4");
        assert_eq!(config.max_tokens(), 300);
        assert_eq!(config.voice_name(), "ja-JP-NanamiNeural");
        assert_eq!(config.voice_language(), "ja-JP");
        assert_eq!(config.speaking_rate_percent(), 150);
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let config = Config::load(Path::new("/nonexistent/voicerelay.json")).unwrap();
        assert_eq!(config.port(), 5000);
    }

    #[test]
    fn test_load_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voicerelay.json");
        std::fs::write(
            &path,
            r#"{
                server: { port: 8080 },
                llm: { model: "gpt-4o-mini", max_tokens: 120 },
                speech: { voice: "en-US-JennyNeural", language: "en-US", rate_percent: 100 },
            }"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.port(), 8080);
        assert_eq!(config.model(), "gpt-4o-mini");
        assert_eq!(config.max_tokens(), 120);
        assert_eq!(config.voice_name(), "en-US-JennyNeural");
        assert_eq!(config.speaking_rate_percent(), 100);
    }

    #[test]
    fn test_resolve_secret_prefers_direct_value() {
        assert_eq!(
            resolve_secret(Some("direct"), None, "VOICERELAY_TEST_UNSET"),
            Some("direct".to_string())
        );
    }

    #[test]
    fn test_resolve_secret_empty_direct_is_unset() {
        assert_eq!(resolve_secret(Some(""), None, "VOICERELAY_TEST_UNSET"), None);
    }

    #[test]
    fn test_resolve_secret_env_override() {
        unsafe { std::env::set_var("VOICERELAY_TEST_KEY", "from-env") };
        assert_eq!(
            resolve_secret(None, Some("VOICERELAY_TEST_KEY"), "VOICERELAY_TEST_UNSET"),
            Some("from-env".to_string())
        );
        unsafe { std::env::remove_var("VOICERELAY_TEST_KEY") };
    }

    #[test]
    fn test_resolve_credentials_reports_first_missing() {
        let config = Config {
            llm: Some(LlmConfig { api_key: Some("sk-test".into()), ..Default::default() }),
            // Env lookups are pointed at names nothing sets.
            speech: Some(SpeechConfig {
                subscription_key_env: Some("VOICERELAY_TEST_UNSET".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = config.resolve_credentials().unwrap_err();
        assert!(err.to_string().contains("Speech subscription key"));
    }
}
