//! Finished audio files.

use crate::audio::decode::{decode, frames_to_duration};
use crate::tts::AudioFormat;
use crate::{Error, ErrorContext, Result};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A finished audio file in the output directory. Never modified once written.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioArtifact {
    pub path: PathBuf,
    pub format: AudioFormat,
    pub duration: Duration,
    pub sample_rate: u32,
    pub channels: u16,
    pub size_bytes: u64,
}

impl AudioArtifact {
    /// Inspect an existing file. WAV headers are read directly; other
    /// containers are decoded to measure their length.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let fail = |msg: String| {
            Error::assembly_with_context(
                msg,
                ErrorContext::new().with_field_path(path.display().to_string()),
            )
        };

        let size_bytes = std::fs::metadata(path)
            .map_err(|e| fail(format!("cannot stat artifact: {}", e)))?
            .len();
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(AudioFormat::from_extension)
            .ok_or_else(|| fail("unknown audio file extension".to_string()))?;

        let (duration, sample_rate, channels) = if format == AudioFormat::Wav {
            let reader = hound::WavReader::open(path)
                .map_err(|e| fail(format!("unreadable WAV: {}", e)))?;
            let spec = reader.spec();
            (
                frames_to_duration(reader.duration() as u64, spec.sample_rate),
                spec.sample_rate,
                spec.channels,
            )
        } else {
            let data = std::fs::read(path)
                .map_err(|e| fail(format!("cannot read artifact: {}", e)))?;
            let pcm = decode(Bytes::from(data), Some(format))?;
            (pcm.duration(), pcm.sample_rate, pcm.channels)
        };

        Ok(Self {
            path: path.to_path_buf(),
            format,
            duration,
            sample_rate,
            channels,
            size_bytes,
        })
    }

    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        std::fs::read(&self.path).map_err(|e| {
            Error::assembly_with_context(
                format!("cannot read artifact: {}", e),
                ErrorContext::new().with_field_path(self.path.display().to_string()),
            )
        })
    }
}
