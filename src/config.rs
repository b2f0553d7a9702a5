//! Runtime configuration.
//!
//! Settings come from three layers, later wins: built-in defaults, an optional
//! YAML file, then `SPEECHGEN_*` environment variables.

use crate::audio::WavEncoding;
use crate::text::DEFAULT_MAX_CHARS;
use crate::tts::{AudioFormat, Voice};
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming a YAML settings file.
pub const CONFIG_ENV: &str = "SPEECHGEN_CONFIG";

/// Provider endpoint configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_provider_name")]
    pub name: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_speech_path")]
    pub speech_path: String,
    /// Path of the voice listing. Without one the built-in catalog is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voices_path: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_response_format")]
    pub response_format: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
    /// Fixed voice list. Takes precedence over `voices_path` and the built-in voices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voices: Option<Vec<Voice>>,
}

impl ProviderSettings {
    /// `response_format` as a decodable [`AudioFormat`].
    pub fn audio_format(&self) -> Result<AudioFormat> {
        let field = || ErrorContext::new().with_field_path("provider.response_format");
        let format = AudioFormat::from_extension(&self.response_format).ok_or_else(|| {
            Error::configuration_with_context(
                format!("Unknown response format '{}'", self.response_format),
                field(),
            )
        })?;
        if !format.is_decodable() {
            return Err(Error::configuration_with_context(
                format!("Response format '{}' cannot be assembled", self.response_format),
                field().with_details("use wav, flac, ogg or mp3"),
            ));
        }
        Ok(format)
    }
}

fn default_provider_name() -> String {
    "openai".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_speech_path() -> String {
    "/v1/audio/speech".to_string()
}

fn default_model() -> String {
    "tts-1".to_string()
}

fn default_response_format() -> String {
    "wav".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            base_url: default_base_url(),
            speech_path: default_speech_path(),
            voices_path: None,
            model: default_model(),
            response_format: default_response_format(),
            timeout_secs: default_timeout_secs(),
            proxy_url: None,
            voices: None,
        }
    }
}

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub provider: ProviderSettings,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    #[serde(default)]
    pub wav_encoding: WavEncoding,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("speech_output")
}

fn default_max_chars() -> usize {
    DEFAULT_MAX_CHARS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: ProviderSettings::default(),
            output_dir: default_output_dir(),
            max_chars: default_max_chars(),
            wav_encoding: WavEncoding::default(),
        }
    }
}

impl Settings {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| {
            Error::configuration_with_context(
                format!("Invalid settings YAML: {}", e),
                ErrorContext::new().with_source("settings"),
            )
        })
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration_with_context(
                format!("Failed to read settings file: {}", e),
                ErrorContext::new().with_field_path(path.display().to_string()),
            )
        })?;
        Self::from_yaml_str(&raw)
    }

    /// Load from `path` (or `SPEECHGEN_CONFIG`), apply env overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from));
        let mut settings = match file {
            Some(file) => Self::from_yaml_file(file)?,
            None => Self::default(),
        };
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Apply `SPEECHGEN_*` overrides from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SPEECHGEN_BASE_URL") {
            self.provider.base_url = v;
        }
        if let Some(v) = lookup("SPEECHGEN_MODEL") {
            self.provider.model = v;
        }
        if let Some(v) = lookup("SPEECHGEN_VOICES_PATH") {
            self.provider.voices_path = Some(v).filter(|p| !p.is_empty());
        }
        if let Some(v) = lookup("SPEECHGEN_PROXY_URL") {
            self.provider.proxy_url = Some(v).filter(|p| !p.is_empty());
        }
        if let Some(v) = lookup("SPEECHGEN_TIMEOUT_SECS") {
            self.provider.timeout_secs = parse_number("SPEECHGEN_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("SPEECHGEN_MAX_CHARS") {
            self.max_chars = parse_number("SPEECHGEN_MAX_CHARS", &v)?;
        }
        if let Some(v) = lookup("SPEECHGEN_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.provider.base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("Invalid base URL: {}", e),
                ErrorContext::new()
                    .with_field_path("provider.base_url")
                    .with_details(self.provider.base_url.clone()),
            )
        })?;
        if self.max_chars == 0 {
            return Err(Error::configuration_with_context(
                "max_chars must be greater than zero",
                ErrorContext::new().with_field_path("max_chars"),
            ));
        }
        self.provider.audio_format()?;
        if matches!(&self.provider.voices, Some(voices) if voices.is_empty()) {
            return Err(Error::configuration_with_context(
                "voice list must not be empty",
                ErrorContext::new().with_field_path("provider.voices"),
            ));
        }
        if self.provider.timeout_secs == 0 {
            return Err(Error::configuration_with_context(
                "timeout must be greater than zero",
                ErrorContext::new().with_field_path("provider.timeout_secs"),
            ));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim().parse::<T>().map_err(|_| {
        Error::configuration_with_context(
            format!("{} must be a number", key),
            ErrorContext::new().with_field_path(key).with_details(raw),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn yaml_fills_missing_fields_with_defaults() {
        let yaml = r#"
provider:
  base_url: "http://localhost:5050"
  voices_path: "/voices"
max_chars: 500
"#;
        let settings = Settings::from_yaml_str(yaml).unwrap();
        assert_eq!(settings.provider.base_url, "http://localhost:5050");
        assert_eq!(settings.provider.voices_path.as_deref(), Some("/voices"));
        assert_eq!(settings.provider.speech_path, "/v1/audio/speech");
        assert_eq!(settings.provider.response_format, "wav");
        assert_eq!(settings.max_chars, 500);
        assert_eq!(settings.output_dir, PathBuf::from("speech_output"));
        assert_eq!(settings.wav_encoding, WavEncoding::Pcm16);
    }

    #[test]
    fn env_overrides_win() {
        let env: HashMap<&str, &str> = [
            ("SPEECHGEN_BASE_URL", "http://tts.internal"),
            ("SPEECHGEN_TIMEOUT_SECS", "5"),
            ("SPEECHGEN_OUTPUT_DIR", "/tmp/out"),
            ("SPEECHGEN_VOICES_PATH", ""),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings.provider.voices_path = Some("/voices".into());
        settings
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(settings.provider.base_url, "http://tts.internal");
        assert_eq!(settings.provider.timeout_secs, 5);
        assert_eq!(settings.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(settings.provider.voices_path, None);
    }

    #[test]
    fn bad_numeric_override_is_reported() {
        let mut settings = Settings::default();
        let err = settings
            .apply_overrides(|k| (k == "SPEECHGEN_MAX_CHARS").then(|| "lots".to_string()))
            .unwrap_err();
        assert_eq!(err.context().field_path.as_deref(), Some("SPEECHGEN_MAX_CHARS"));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut settings = Settings::default();
        assert!(settings.validate().is_ok());

        settings.provider.base_url = "not a url".into();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.max_chars = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.provider.voices = Some(Vec::new());
        assert!(settings.validate().is_err());
    }

    #[test]
    fn response_format_must_be_decodable() {
        for format in ["pcm", "aac", "opus", "mp4"] {
            let mut settings = Settings::default();
            settings.provider.response_format = format.to_string();
            let err = settings.validate().unwrap_err();
            assert_eq!(
                err.context().field_path.as_deref(),
                Some("provider.response_format"),
                "{} should be rejected",
                format
            );
        }

        let mut settings = Settings::default();
        for format in ["wav", "FLAC", "ogg"] {
            settings.provider.response_format = format.to_string();
            assert!(settings.validate().is_ok(), "{} should be accepted", format);
        }
    }

    #[test]
    fn yaml_voice_list() {
        let yaml = r#"
provider:
  name: local
  voices:
    - id: narrator
    - ShortName: de-DE-KatjaNeural
      Locale: de-DE
"#;
        let settings = Settings::from_yaml_str(yaml).unwrap();
        let voices = settings.provider.voices.unwrap();
        assert_eq!(voices[0], Voice::new("narrator", ""));
        assert_eq!(voices[1].locale, "de-DE");
    }
}
