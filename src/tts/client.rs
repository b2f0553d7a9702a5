//! HTTP speech provider.

use super::provider::{ProviderAudio, SpeechProvider};
use super::types::{AudioFormat, Voice};
use crate::config::ProviderSettings;
use crate::error_code::FailureKind;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use keyring::Entry;
use reqwest::header::CONTENT_TYPE;
use reqwest::Proxy;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const KEYRING_SERVICE: &str = "speechgen";
const API_KEY_ENV: &str = "SPEECHGEN_API_KEY";
// Keep error bodies in messages short enough to show to a user.
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Provider reached over HTTP: JSON in, encoded audio out.
///
/// The request body follows the common `/v1/audio/speech` shape
/// (`model`, `input`, `voice`, `response_format`) plus a `language` field
/// carrying the request locale.
pub struct HttpSpeechProvider {
    http_client: reqwest::Client,
    name: String,
    model: String,
    base_url: String,
    speech_path: String,
    voices_path: Option<String>,
    response_format: AudioFormat,
    api_key: Option<String>,
}

impl HttpSpeechProvider {
    pub fn builder() -> HttpSpeechProviderBuilder {
        HttpSpeechProviderBuilder::new()
    }

    pub fn from_settings(settings: &ProviderSettings) -> Result<Self> {
        let mut builder = Self::builder()
            .name(settings.name.clone())
            .model(settings.model.clone())
            .base_url(settings.base_url.clone())
            .speech_path(settings.speech_path.clone())
            .response_format(settings.audio_format()?)
            .timeout_secs(settings.timeout_secs);
        if let Some(path) = &settings.voices_path {
            builder = builder.voices_path(path.clone());
        }
        if let Some(proxy) = &settings.proxy_url {
            builder = builder.proxy_url(proxy.clone());
        }
        builder.build()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn transport_error(&self, what: &str, err: reqwest::Error) -> Error {
        let kind = FailureKind::from_reqwest(&err);
        info!(
            provider = self.name.as_str(),
            failure_kind = kind.name(),
            "speech provider {} failed",
            what
        );
        Error::synthesis_with_context(
            kind,
            format!("{} failed: {}", what, err),
            ErrorContext::new().with_source(self.name.clone()),
        )
    }

    fn status_error(&self, what: &str, status: reqwest::StatusCode, body: &[u8]) -> Error {
        let kind = FailureKind::from_http_status(status.as_u16());
        let excerpt: String = String::from_utf8_lossy(body)
            .chars()
            .take(MAX_ERROR_BODY_CHARS)
            .collect();
        info!(
            provider = self.name.as_str(),
            http_status = status.as_u16(),
            failure_kind = kind.name(),
            "speech provider rejected {}",
            what
        );
        Error::synthesis_with_context(
            kind,
            format!("{} rejected by provider ({})", what, status),
            ErrorContext::new()
                .with_details(excerpt)
                .with_source(self.name.clone()),
        )
    }
}

#[async_trait]
impl SpeechProvider for HttpSpeechProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn synthesize_segment(
        &self,
        text: &str,
        voice: &str,
        locale: &str,
    ) -> Result<ProviderAudio> {
        let endpoint = self.url(&self.speech_path);
        let mut body = serde_json::json!({
            "model": self.model,
            "input": text,
            "voice": voice,
            "response_format": self.response_format.extension(),
        });
        if !locale.is_empty() {
            body["language"] = serde_json::Value::String(locale.to_string());
        }

        let start = Instant::now();
        let mut request = self.http_client.post(&endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error("TTS request", e))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error("Reading TTS response", e))?;

        if !status.is_success() {
            return Err(self.status_error("TTS request", status, &bytes));
        }
        if bytes.is_empty() {
            return Err(Error::synthesis_with_context(
                FailureKind::Provider,
                "Provider returned no audio",
                ErrorContext::new().with_source(self.name.clone()),
            ));
        }

        let format = content_type
            .as_deref()
            .and_then(AudioFormat::from_mime)
            .unwrap_or(self.response_format);
        debug!(
            provider = self.name.as_str(),
            voice,
            chars = text.chars().count(),
            bytes = bytes.len(),
            duration_ms = start.elapsed().as_millis(),
            "segment synthesized"
        );
        Ok(ProviderAudio {
            data: bytes,
            format,
        })
    }

    async fn list_voices(&self) -> Result<Option<Vec<Voice>>> {
        let Some(path) = &self.voices_path else {
            return Ok(None);
        };

        let mut request = self.http_client.get(self.url(path));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error("Voice list request", e))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error("Reading voice list", e))?;
        if !status.is_success() {
            return Err(self.status_error("Voice list request", status, &bytes));
        }

        let list: VoiceList = serde_json::from_slice(&bytes).map_err(|e| {
            Error::synthesis_with_context(
                FailureKind::Provider,
                format!("Unreadable voice list: {}", e),
                ErrorContext::new().with_source(self.name.clone()),
            )
        })?;
        let voices = list.into_voices();
        debug!(provider = self.name.as_str(), count = voices.len(), "voice list fetched");
        Ok(Some(voices))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum VoiceList {
    Bare(Vec<Voice>),
    Wrapped { voices: Vec<Voice> },
}

impl VoiceList {
    fn into_voices(self) -> Vec<Voice> {
        match self {
            VoiceList::Bare(v) | VoiceList::Wrapped { voices: v } => v,
        }
    }
}

pub struct HttpSpeechProviderBuilder {
    name: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    speech_path: Option<String>,
    voices_path: Option<String>,
    response_format: AudioFormat,
    proxy_url: Option<String>,
    credential_lookup: bool,
    timeout_secs: u64,
}

impl HttpSpeechProviderBuilder {
    pub fn new() -> Self {
        Self {
            name: None,
            model: None,
            api_key: None,
            base_url: None,
            speech_path: None,
            voices_path: None,
            response_format: AudioFormat::Wav,
            proxy_url: None,
            credential_lookup: true,
            timeout_secs: 60,
        }
    }
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }
    pub fn speech_path(mut self, path: impl Into<String>) -> Self {
        self.speech_path = Some(path.into());
        self
    }
    pub fn voices_path(mut self, path: impl Into<String>) -> Self {
        self.voices_path = Some(path.into());
        self
    }
    pub fn response_format(mut self, format: AudioFormat) -> Self {
        self.response_format = format;
        self
    }
    pub fn proxy_url(mut self, url: impl Into<String>) -> Self {
        self.proxy_url = Some(url.into());
        self
    }
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Skip the keyring and environment when no key was given explicitly.
    pub fn without_credential_lookup(mut self) -> Self {
        self.credential_lookup = false;
        self
    }

    pub fn build(self) -> Result<HttpSpeechProvider> {
        let name = self.name.unwrap_or_else(|| "openai".to_string());
        let model = self.model.unwrap_or_else(|| "tts-1".to_string());
        let api_key = match self.api_key {
            Some(key) => Some(key),
            None if self.credential_lookup => lookup_api_key(&name),
            None => None,
        };
        if !self.response_format.is_decodable() {
            return Err(Error::configuration_with_context(
                format!(
                    "Response format '{}' cannot be assembled",
                    self.response_format.extension()
                ),
                ErrorContext::new().with_field_path("provider.response_format"),
            ));
        }
        let base_url = self
            .base_url
            .unwrap_or_else(|| "https://api.openai.com".to_string());
        url::Url::parse(&base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("Invalid provider base URL: {}", e),
                ErrorContext::new().with_field_path("provider.base_url"),
            )
        })?;
        let speech_path = normalize_path(
            self.speech_path
                .unwrap_or_else(|| "/v1/audio/speech".to_string()),
        );
        let voices_path = self.voices_path.map(normalize_path);

        let mut http = reqwest::Client::builder().timeout(Duration::from_secs(self.timeout_secs));
        if let Some(proxy_url) = &self.proxy_url {
            let proxy = Proxy::all(proxy_url).map_err(|e| {
                Error::configuration_with_context(
                    format!("Invalid proxy URL: {}", e),
                    ErrorContext::new().with_field_path("provider.proxy_url"),
                )
            })?;
            http = http.proxy(proxy);
        }
        let http_client = http
            .build()
            .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(HttpSpeechProvider {
            http_client,
            name,
            model,
            base_url,
            speech_path,
            voices_path,
            response_format: self.response_format,
            api_key,
        })
    }
}

impl Default for HttpSpeechProviderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_path(path: String) -> String {
    if path.starts_with('/') {
        path
    } else {
        format!("/{}", path)
    }
}

fn lookup_api_key(provider: &str) -> Option<String> {
    // 1. OS keyring
    if let Ok(entry) = Entry::new(KEYRING_SERVICE, provider) {
        if let Ok(key) = entry.get_password() {
            return Some(key);
        }
    }

    // 2. SPEECHGEN_API_KEY, then <PROVIDER>_API_KEY
    std::env::var(API_KEY_ENV)
        .ok()
        .or_else(|| std::env::var(format!("{}_API_KEY", provider.to_uppercase())).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_list_accepts_bare_and_wrapped() {
        let bare: VoiceList =
            serde_json::from_str(r#"[{"id":"alloy","locale":"en-US"}]"#).unwrap();
        assert_eq!(bare.into_voices().len(), 1);

        let wrapped: VoiceList = serde_json::from_str(
            r#"{"voices":[{"ShortName":"en-US-GuyNeural","Locale":"en-US"},{"id":"b","locale":"fr-FR"}]}"#,
        )
        .unwrap();
        let voices = wrapped.into_voices();
        assert_eq!(voices[0].id, "en-US-GuyNeural");
        assert_eq!(voices[1].locale, "fr-FR");
    }

    #[test]
    fn builder_normalizes_paths_and_rejects_bad_urls() {
        let provider = HttpSpeechProvider::builder()
            .base_url("http://localhost:1234/")
            .speech_path("speak")
            .voices_path("voices")
            .without_credential_lookup()
            .build()
            .unwrap();
        assert_eq!(provider.url(&provider.speech_path), "http://localhost:1234/speak");
        assert_eq!(provider.voices_path.as_deref(), Some("/voices"));
        assert!(provider.api_key.is_none());

        let err = HttpSpeechProvider::builder()
            .base_url("::nope::")
            .without_credential_lookup()
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn builder_rejects_formats_that_cannot_be_assembled() {
        let err = HttpSpeechProvider::builder()
            .response_format(AudioFormat::Pcm)
            .without_credential_lookup()
            .build()
            .err()
            .unwrap();
        assert_eq!(
            err.context().field_path.as_deref(),
            Some("provider.response_format")
        );

        let mut settings = ProviderSettings::default();
        settings.response_format = "wavv".into();
        assert!(HttpSpeechProvider::from_settings(&settings).is_err());
    }
}
