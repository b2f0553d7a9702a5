//! The provider boundary.

use super::types::{AudioFormat, Voice};
use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;

/// Encoded audio returned by one provider call.
#[derive(Debug, Clone)]
pub struct ProviderAudio {
    pub data: Bytes,
    pub format: AudioFormat,
}

/// An external text-to-speech service.
///
/// Implementations report every failure as [`crate::Error::Synthesis`].
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Short identifier used in logs and for credential lookup.
    fn name(&self) -> &str;

    /// Synthesize one text segment.
    async fn synthesize_segment(&self, text: &str, voice: &str, locale: &str)
        -> Result<ProviderAudio>;

    /// Voices the provider publishes, or `None` if it has no voice listing.
    async fn list_voices(&self) -> Result<Option<Vec<Voice>>>;
}
