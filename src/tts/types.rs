//! TTS (Text-to-Speech) types.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// What the caller asks for: some text, spoken by one voice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice_id: String,
    /// Locale tag such as `en-US`. Empty means "whatever the voice speaks".
    pub locale: String,
}

impl SynthesisRequest {
    /// Build a request whose locale is taken from the voice id
    /// (`en-GB-RyanNeural` speaks `en-GB`).
    pub fn new(text: impl Into<String>, voice_id: impl Into<String>) -> Self {
        let voice_id = voice_id.into();
        let locale = locale_from_voice_id(&voice_id).unwrap_or_default();
        Self {
            text: text.into(),
            voice_id,
            locale,
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }
}

/// Extract the `ll-RR` prefix from ids like `en-US-AriaNeural`.
pub fn locale_from_voice_id(voice_id: &str) -> Option<String> {
    let mut parts = voice_id.splitn(3, '-');
    let lang = parts.next()?;
    let region = parts.next()?;
    parts.next()?;
    let plausible = (2..=3).contains(&lang.len())
        && lang.chars().all(|c| c.is_ascii_lowercase())
        && (2..=4).contains(&region.len())
        && region.chars().all(|c| c.is_ascii_alphanumeric());
    plausible.then(|| format!("{}-{}", lang, region))
}

/// A voice published by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    #[serde(alias = "ShortName", alias = "voice_id")]
    pub id: String,
    /// Empty for multilingual voices.
    #[serde(default, alias = "Locale")]
    pub locale: String,
    #[serde(default, alias = "Gender", skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(
        default,
        alias = "FriendlyName",
        alias = "DisplayName",
        skip_serializing_if = "Option::is_none"
    )]
    pub display_name: Option<String>,
}

impl Voice {
    pub fn new(id: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            locale: locale.into(),
            gender: None,
            display_name: None,
        }
    }

    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn speaks(&self, locale: &str) -> bool {
        locale.is_empty() || self.locale.is_empty() || self.locale.eq_ignore_ascii_case(locale)
    }
}

/// Supported audio formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioFormat {
    Mp3,
    Wav,
    Flac,
    Ogg,
    Aac,
    Pcm,
}

impl AudioFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Wav => "audio/wav",
            Self::Flac => "audio/flac",
            Self::Ogg => "audio/ogg",
            Self::Aac => "audio/aac",
            Self::Pcm => "audio/pcm",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Flac => "flac",
            Self::Ogg => "ogg",
            Self::Aac => "aac",
            Self::Pcm => "pcm",
        }
    }

    /// Parse a format name or file extension. Unknown names are `None`.
    pub fn from_extension(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mp3" => Some(Self::Mp3),
            "wav" | "wave" => Some(Self::Wav),
            "flac" => Some(Self::Flac),
            "ogg" => Some(Self::Ogg),
            "aac" => Some(Self::Aac),
            "pcm" => Some(Self::Pcm),
            _ => None,
        }
    }

    /// Whether chunks in this format can be decoded for assembly.
    ///
    /// Headerless PCM carries no rate or channel count, and AAC has no
    /// decoder in this build.
    pub fn is_decodable(&self) -> bool {
        match self {
            Self::Wav | Self::Flac | Self::Ogg => true,
            Self::Mp3 => cfg!(feature = "mp3"),
            Self::Aac | Self::Pcm => false,
        }
    }

    /// Best guess from a `Content-Type` header value.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_lowercase();
        match essence.as_str() {
            "audio/mpeg" | "audio/mp3" => Some(Self::Mp3),
            "audio/wav" | "audio/wave" | "audio/x-wav" => Some(Self::Wav),
            "audio/flac" | "audio/x-flac" => Some(Self::Flac),
            "audio/ogg" => Some(Self::Ogg),
            "audio/aac" => Some(Self::Aac),
            "audio/pcm" | "audio/l16" => Some(Self::Pcm),
            _ => None,
        }
    }
}

/// One segment of synthesized audio, ordered by `index`.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub index: usize,
    pub data: Bytes,
    pub format: AudioFormat,
}

impl AudioChunk {
    pub fn new(index: usize, data: impl Into<Bytes>, format: AudioFormat) -> Self {
        Self {
            index,
            data: data.into(),
            format,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Progress through the segments of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisProgress {
    pub completed: usize,
    pub total: usize,
}

impl SynthesisProgress {
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f32 / self.total as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_is_derived_from_neural_voice_ids() {
        assert_eq!(locale_from_voice_id("en-US-AriaNeural").as_deref(), Some("en-US"));
        assert_eq!(locale_from_voice_id("zh-Hans-X").as_deref(), Some("zh-Hans"));
        assert_eq!(locale_from_voice_id("alloy"), None);
        assert_eq!(locale_from_voice_id("en-US"), None);

        let req = SynthesisRequest::new("Hello", "en-AU-WilliamNeural");
        assert_eq!(req.locale, "en-AU");
        let req = SynthesisRequest::new("Hello", "alloy").with_locale("en-US");
        assert_eq!(req.locale, "en-US");
    }

    #[test]
    fn voice_deserializes_from_provider_shapes() {
        let edge: Voice = serde_json::from_str(
            r#"{"ShortName":"en-GB-LibbyNeural","Locale":"en-GB","Gender":"Female","FriendlyName":"Libby"}"#,
        )
        .unwrap();
        assert_eq!(edge.id, "en-GB-LibbyNeural");
        assert_eq!(edge.gender.as_deref(), Some("Female"));

        let plain: Voice = serde_json::from_str(r#"{"id":"alloy","locale":"en-US"}"#).unwrap();
        assert_eq!(plain, Voice::new("alloy", "en-US"));
    }

    #[test]
    fn voice_locale_match_is_case_insensitive() {
        let voice = Voice::new("en-US-GuyNeural", "en-US");
        assert!(voice.speaks("en-us"));
        assert!(voice.speaks(""));
        assert!(!voice.speaks("en-GB"));

        let multilingual = Voice::new("alloy", "");
        assert!(multilingual.speaks("de-DE"));
        assert!(multilingual.speaks(""));
    }

    #[test]
    fn format_lookup() {
        assert_eq!(AudioFormat::from_extension("WAV"), Some(AudioFormat::Wav));
        assert_eq!(AudioFormat::from_extension("mp4"), None);
        assert_eq!(AudioFormat::from_extension("opus"), None);
        assert_eq!(AudioFormat::from_mime("audio/opus"), None);
        assert_eq!(AudioFormat::from_mime("audio/wav; codecs=1"), Some(AudioFormat::Wav));
        assert_eq!(AudioFormat::from_mime("application/json"), None);
        assert_eq!(AudioFormat::Mp3.extension(), "mp3");
    }

    #[test]
    fn only_self_describing_formats_are_decodable() {
        assert!(AudioFormat::Wav.is_decodable());
        assert!(AudioFormat::Flac.is_decodable());
        assert!(!AudioFormat::Pcm.is_decodable());
        assert!(!AudioFormat::Aac.is_decodable());
        assert_eq!(AudioFormat::Mp3.is_decodable(), cfg!(feature = "mp3"));
    }

    #[test]
    fn progress_fraction() {
        let p = SynthesisProgress { completed: 1, total: 4 };
        assert!((p.fraction() - 0.25).abs() < f32::EPSILON);
        assert_eq!(SynthesisProgress { completed: 0, total: 0 }.fraction(), 1.0);
    }
}
