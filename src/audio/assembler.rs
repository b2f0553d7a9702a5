//! Chunk assembly: decode every chunk, concatenate in index order, write one WAV.

use super::decode::{decode, PcmAudio};
use crate::artifact::AudioArtifact;
use crate::tts::{AudioChunk, AudioFormat};
use crate::{Error, ErrorContext, Result};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Sample encoding of the assembled WAV.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WavEncoding {
    #[default]
    Pcm16,
    Float32,
}

impl WavEncoding {
    fn spec(&self, sample_rate: u32, channels: u16) -> hound::WavSpec {
        match self {
            WavEncoding::Pcm16 => hound::WavSpec {
                channels,
                sample_rate,
                bits_per_sample: 16,
                sample_format: hound::SampleFormat::Int,
            },
            WavEncoding::Float32 => hound::WavSpec {
                channels,
                sample_rate,
                bits_per_sample: 32,
                sample_format: hound::SampleFormat::Float,
            },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AudioAssembler {
    encoding: WavEncoding,
}

impl AudioAssembler {
    pub fn new(encoding: WavEncoding) -> Self {
        Self { encoding }
    }

    pub fn encoding(&self) -> WavEncoding {
        self.encoding
    }

    /// Merge `chunks` into a single WAV at `dest`.
    ///
    /// All or nothing: on any failure no file is left at `dest`.
    pub fn merge(&self, chunks: &[AudioChunk], dest: &Path) -> Result<AudioArtifact> {
        let pcm = self.concat(chunks)?;
        self.write_wav(&pcm, dest)?;
        let artifact = AudioArtifact::open(dest)?;
        info!(
            chunks = chunks.len(),
            duration_ms = artifact.duration.as_millis(),
            path = %dest.display(),
            "audio assembled"
        );
        Ok(artifact)
    }

    /// Merge audio files, in the order given.
    pub fn merge_files(&self, paths: &[PathBuf], dest: &Path) -> Result<AudioArtifact> {
        let chunks = paths
            .iter()
            .enumerate()
            .map(|(index, path)| -> Result<AudioChunk> {
                let data = std::fs::read(path).map_err(|e| {
                    Error::assembly_with_context(
                        format!("cannot read chunk: {}", e),
                        ErrorContext::new().with_field_path(path.display().to_string()),
                    )
                })?;
                let format = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .and_then(AudioFormat::from_extension)
                    .ok_or_else(|| {
                        Error::assembly_with_context(
                            "unknown audio file extension",
                            ErrorContext::new().with_field_path(path.display().to_string()),
                        )
                    })?;
                Ok(AudioChunk::new(index, Bytes::from(data), format))
            })
            .collect::<Result<Vec<_>>>()?;
        self.merge(&chunks, dest)
    }

    /// Decode and concatenate in memory.
    pub fn concat(&self, chunks: &[AudioChunk]) -> Result<PcmAudio> {
        if chunks.is_empty() {
            return Err(Error::assembly_with_context(
                "no chunks to merge",
                ErrorContext::new().with_source("assembler"),
            ));
        }

        let mut ordered: Vec<&AudioChunk> = chunks.iter().collect();
        ordered.sort_by_key(|c| c.index);
        if let Some(pair) = ordered.windows(2).find(|w| w[0].index == w[1].index) {
            return Err(Error::assembly_with_context(
                format!("duplicate chunk index {}", pair[0].index),
                ErrorContext::new().with_source("assembler"),
            ));
        }

        let mut merged: Option<PcmAudio> = None;
        for chunk in ordered {
            let pcm = decode(chunk.data.clone(), Some(chunk.format)).map_err(|e| {
                Error::assembly_with_context(
                    e.reason().to_string(),
                    ErrorContext::new()
                        .with_field_path(format!("chunks[{}]", chunk.index))
                        .with_source("decoder"),
                )
            })?;
            debug!(
                index = chunk.index,
                frames = pcm.frames(),
                sample_rate = pcm.sample_rate,
                "chunk decoded"
            );

            match merged.as_mut() {
                None => merged = Some(pcm),
                Some(acc) => {
                    if acc.sample_rate != pcm.sample_rate || acc.channels != pcm.channels {
                        return Err(Error::assembly_with_context(
                            "chunks have different audio formats",
                            ErrorContext::new()
                                .with_field_path(format!("chunks[{}]", chunk.index))
                                .with_details(format!(
                                    "expected {} Hz x{}, got {} Hz x{}",
                                    acc.sample_rate, acc.channels, pcm.sample_rate, pcm.channels
                                )),
                        ));
                    }
                    acc.samples.extend_from_slice(&pcm.samples);
                }
            }
        }

        merged.ok_or_else(|| Error::assembly("no chunks to merge"))
    }

    fn write_wav(&self, pcm: &PcmAudio, dest: &Path) -> Result<()> {
        let tmp = part_path(dest);
        let result = self.write_samples(pcm, &tmp).and_then(|()| {
            std::fs::rename(&tmp, dest).map_err(|e| {
                Error::assembly_with_context(
                    format!("cannot move artifact into place: {}", e),
                    ErrorContext::new().with_field_path(dest.display().to_string()),
                )
            })
        });
        if result.is_err() {
            let _ = std::fs::remove_file(&tmp);
        }
        result
    }

    fn write_samples(&self, pcm: &PcmAudio, path: &Path) -> Result<()> {
        let fail = |e: hound::Error| {
            Error::assembly_with_context(
                format!("WAV encoding failed: {}", e),
                ErrorContext::new().with_field_path(path.display().to_string()),
            )
        };

        let spec = self.encoding.spec(pcm.sample_rate, pcm.channels);
        let mut writer = hound::WavWriter::create(path, spec).map_err(fail)?;
        match self.encoding {
            WavEncoding::Pcm16 => {
                for &s in &pcm.samples {
                    let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
                    writer.write_sample(v).map_err(fail)?;
                }
            }
            WavEncoding::Float32 => {
                for &s in &pcm.samples {
                    writer.write_sample(s).map_err(fail)?;
                }
            }
        }
        writer.finalize().map_err(fail)
    }
}

/// Hidden sibling used while a WAV is being written.
fn part_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());
    dest.with_file_name(format!(".{}.part", name))
}
