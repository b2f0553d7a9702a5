//! Voice catalog: the provider's voice list, fetched once and cached.

use super::provider::SpeechProvider;
use super::types::Voice;
use crate::error_code::FailureKind;
use crate::{Error, ErrorContext, Result};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Voices assumed for a provider that publishes no listing.
///
/// The `openai` provider gets its own multilingual voices; anything else is
/// assumed to serve the Azure-style neural voices.
pub fn builtin_voices(provider: &str) -> Vec<Voice> {
    if provider.eq_ignore_ascii_case("openai") {
        openai_voices()
    } else {
        neural_voices()
    }
}

/// Voices of the OpenAI speech endpoint. They speak any input language.
pub fn openai_voices() -> Vec<Voice> {
    ["alloy", "ash", "coral", "echo", "fable", "nova", "onyx", "sage", "shimmer"]
        .into_iter()
        .map(|id| Voice::new(id, ""))
        .collect()
}

/// English neural voices named `<locale>-<Name>Neural`.
pub fn neural_voices() -> Vec<Voice> {
    [
        ("en-US-AriaNeural", "en-US", "Female", "English (US) - Aria"),
        ("en-US-GuyNeural", "en-US", "Male", "English (US) - Guy"),
        ("en-US-JennyNeural", "en-US", "Female", "English (US) - Jenny"),
        ("en-GB-LibbyNeural", "en-GB", "Female", "English (UK) - Libby"),
        ("en-GB-RyanNeural", "en-GB", "Male", "English (UK) - Ryan"),
        ("en-AU-NatashaNeural", "en-AU", "Female", "English (Australia) - Natasha"),
        ("en-AU-WilliamNeural", "en-AU", "Male", "English (Australia) - William"),
    ]
    .into_iter()
    .map(|(id, locale, gender, name)| {
        Voice::new(id, locale)
            .with_gender(gender)
            .with_display_name(name)
    })
    .collect()
}

pub struct VoiceCatalog {
    provider: Arc<dyn SpeechProvider>,
    cache: RwLock<Option<Arc<Vec<Voice>>>>,
}

impl VoiceCatalog {
    pub fn new(provider: Arc<dyn SpeechProvider>) -> Self {
        Self {
            provider,
            cache: RwLock::new(None),
        }
    }

    /// Catalog with a fixed list; the provider is never asked.
    pub fn with_voices(provider: Arc<dyn SpeechProvider>, voices: Vec<Voice>) -> Self {
        Self {
            provider,
            cache: RwLock::new(Some(Arc::new(voices))),
        }
    }

    /// All known voices, fetching on first use.
    pub async fn voices(&self) -> Result<Arc<Vec<Voice>>> {
        if let Some(voices) = self.cache.read().await.as_ref() {
            return Ok(Arc::clone(voices));
        }

        let mut cache = self.cache.write().await;
        // Another caller may have filled it while we waited for the lock.
        if let Some(voices) = cache.as_ref() {
            return Ok(Arc::clone(voices));
        }
        let voices = Arc::new(self.fetch().await?);
        *cache = Some(Arc::clone(&voices));
        Ok(voices)
    }

    /// Drop the cache and fetch again.
    pub async fn refresh(&self) -> Result<Arc<Vec<Voice>>> {
        let voices = Arc::new(self.fetch().await?);
        *self.cache.write().await = Some(Arc::clone(&voices));
        Ok(voices)
    }

    async fn fetch(&self) -> Result<Vec<Voice>> {
        match self.provider.list_voices().await? {
            Some(voices) if !voices.is_empty() => Ok(voices),
            Some(_) => Err(Error::synthesis_with_context(
                FailureKind::Provider,
                "Provider published an empty voice list",
                ErrorContext::new().with_source(self.provider.name().to_string()),
            )),
            None => {
                debug!(provider = self.provider.name(), "no voice listing, using built-in voices");
                Ok(builtin_voices(self.provider.name()))
            }
        }
    }

    /// Look up `voice_id` and check it speaks `locale` (empty matches any).
    pub async fn resolve(&self, voice_id: &str, locale: &str) -> Result<Voice> {
        let voices = self.voices().await?;
        let voice = voices.iter().find(|v| v.id == voice_id).ok_or_else(|| {
            Error::synthesis_with_context(
                FailureKind::InvalidVoice,
                format!("Unknown voice '{}'", voice_id),
                ErrorContext::new().with_field_path("voice_id"),
            )
        })?;
        if !voice.speaks(locale) {
            return Err(Error::synthesis_with_context(
                FailureKind::InvalidVoice,
                format!("Voice '{}' does not speak '{}'", voice_id, locale),
                ErrorContext::new()
                    .with_field_path("locale")
                    .with_details(format!("voice locale is {}", voice.locale)),
            ));
        }
        Ok(voice.clone())
    }

    /// Voices whose locale starts with `prefix` (`"en"`, `"en-GB"`), case-insensitive.
    pub async fn voices_for_locale(&self, prefix: &str) -> Result<Vec<Voice>> {
        let prefix = prefix.to_lowercase();
        Ok(self
            .voices()
            .await?
            .iter()
            .filter(|v| v.locale.to_lowercase().starts_with(&prefix))
            .cloned()
            .collect())
    }
}
