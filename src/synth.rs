//! The synthesis pipeline.
//!
//! validate -> split -> one provider call per segment -> chunk files in a work
//! directory -> assemble into one WAV artifact -> drop the work directory.

use crate::artifact::AudioArtifact;
use crate::audio::{AudioAssembler, WavEncoding};
use crate::config::Settings;
use crate::error_code::FailureKind;
use crate::store::{discard_work_dir, ArtifactStore};
use crate::text::{self, TextSegment, DEFAULT_MAX_CHARS};
use crate::tts::{
    AudioChunk, HttpSpeechProvider, SpeechProvider, SynthesisProgress, SynthesisRequest, Voice,
    VoiceCatalog,
};
use crate::{Error, ErrorContext, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Turns text into audio artifacts using an explicitly supplied provider.
pub struct Synthesizer {
    provider: Arc<dyn SpeechProvider>,
    catalog: VoiceCatalog,
    store: ArtifactStore,
    assembler: AudioAssembler,
    max_chars: usize,
}

impl Synthesizer {
    pub fn builder() -> SynthesizerBuilder {
        SynthesizerBuilder::new()
    }

    /// HTTP provider and output directory as described by `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let provider = HttpSpeechProvider::from_settings(&settings.provider)?;
        let mut builder = Self::builder()
            .provider(Arc::new(provider))
            .output_dir(settings.output_dir.clone())
            .max_chars(settings.max_chars)
            .wav_encoding(settings.wav_encoding);
        if let Some(voices) = &settings.provider.voices {
            builder = builder.voices(voices.clone());
        }
        builder.build()
    }

    pub fn provider(&self) -> &Arc<dyn SpeechProvider> {
        &self.provider
    }

    pub fn catalog(&self) -> &VoiceCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn assembler(&self) -> &AudioAssembler {
        &self.assembler
    }

    pub async fn synthesize(&self, request: &SynthesisRequest) -> Result<AudioArtifact> {
        self.synthesize_with_progress(request, |_| {}).await
    }

    /// Like [`Synthesizer::synthesize`], reporting after every finished segment.
    pub async fn synthesize_with_progress<F>(
        &self,
        request: &SynthesisRequest,
        mut on_progress: F,
    ) -> Result<AudioArtifact>
    where
        F: FnMut(SynthesisProgress) + Send,
    {
        if request.text.trim().is_empty() {
            return Err(empty_text());
        }
        let voice = self
            .catalog
            .resolve(&request.voice_id, &request.locale)
            .await?;
        let locale = if request.locale.is_empty() {
            voice.locale.clone()
        } else {
            request.locale.clone()
        };

        let segments = text::segments(&request.text, self.max_chars);
        if segments.is_empty() {
            return Err(empty_text());
        }

        let start = Instant::now();
        info!(
            provider = self.provider.name(),
            voice = voice.id.as_str(),
            locale = locale.as_str(),
            chars = request.text.chars().count(),
            segments = segments.len(),
            "synthesis started"
        );

        let work_dir = self.store.create_work_dir()?;
        let result = self
            .run(request, &voice, &locale, &segments, &work_dir, &mut on_progress)
            .await;
        discard_work_dir(&work_dir);

        if let Ok(artifact) = &result {
            info!(
                path = %artifact.path.display(),
                audio_ms = artifact.duration.as_millis(),
                duration_ms = start.elapsed().as_millis(),
                "synthesis finished"
            );
        }
        result
    }

    async fn run<F>(
        &self,
        request: &SynthesisRequest,
        voice: &Voice,
        locale: &str,
        segments: &[TextSegment],
        work_dir: &Path,
        on_progress: &mut F,
    ) -> Result<AudioArtifact>
    where
        F: FnMut(SynthesisProgress) + Send,
    {
        let total = segments.len();
        let mut chunk_files = Vec::with_capacity(total);

        for segment in segments {
            let audio = self
                .provider
                .synthesize_segment(&segment.text, &voice.id, locale)
                .await
                .map_err(|e| at_segment(e, segment.index))?;

            let path = work_dir.join(format!(
                "chunk_{}.{}",
                segment.index,
                audio.format.extension()
            ));
            tokio::fs::write(&path, &audio.data).await.map_err(|e| {
                Error::assembly_with_context(
                    format!("cannot write chunk: {}", e),
                    ErrorContext::new().with_field_path(path.display().to_string()),
                )
            })?;
            chunk_files.push(path);

            on_progress(SynthesisProgress {
                completed: segment.index + 1,
                total,
            });
        }

        let seed = format!("{}\u{1f}{}\u{1f}{}", voice.id, locale, request.text);
        let dest = self.store.artifact_path("speech", seed.as_bytes(), "wav");
        self.assemble_blocking(move |assembler| assembler.merge_files(&chunk_files, &dest))
            .await
    }

    /// Merge already synthesized chunks into a new artifact in the output directory.
    pub async fn merge(&self, chunks: Vec<AudioChunk>) -> Result<AudioArtifact> {
        let seed: Vec<u8> = chunks
            .iter()
            .flat_map(|c| (c.data.len() as u64).to_le_bytes())
            .collect();
        let dest = self.store.artifact_path("merged", &seed, "wav");
        self.assemble_blocking(move |assembler| assembler.merge(&chunks, &dest))
            .await
    }

    async fn assemble_blocking<F>(&self, job: F) -> Result<AudioArtifact>
    where
        F: FnOnce(&AudioAssembler) -> Result<AudioArtifact> + Send + 'static,
    {
        let assembler = self.assembler.clone();
        tokio::task::spawn_blocking(move || job(&assembler))
            .await
            .map_err(|e| Error::assembly(format!("assembly task failed: {}", e)))?
    }
}

fn empty_text() -> Error {
    Error::synthesis_with_context(
        FailureKind::EmptyText,
        "Text is empty",
        ErrorContext::new().with_field_path("text"),
    )
}

// Provider failures are synthesis failures, whatever the implementation returned.
fn at_segment(err: Error, index: usize) -> Error {
    let path = format!("segments[{}]", index);
    match err {
        Error::Synthesis {
            kind,
            message,
            context,
        } => Error::Synthesis {
            kind,
            message,
            context: context.with_field_path(path),
        },
        other => Error::synthesis_with_context(
            FailureKind::Unknown,
            other.reason().to_string(),
            other.context().clone().with_field_path(path),
        ),
    }
}

pub struct SynthesizerBuilder {
    provider: Option<Arc<dyn SpeechProvider>>,
    voices: Option<Vec<Voice>>,
    output_dir: Option<PathBuf>,
    max_chars: usize,
    wav_encoding: WavEncoding,
}

impl SynthesizerBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            voices: None,
            output_dir: None,
            max_chars: DEFAULT_MAX_CHARS,
            wav_encoding: WavEncoding::default(),
        }
    }

    pub fn provider(mut self, provider: Arc<dyn SpeechProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Use a fixed voice list instead of asking the provider.
    pub fn voices(mut self, voices: Vec<Voice>) -> Self {
        self.voices = Some(voices);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    pub fn wav_encoding(mut self, encoding: WavEncoding) -> Self {
        self.wav_encoding = encoding;
        self
    }

    pub fn build(self) -> Result<Synthesizer> {
        let provider = self
            .provider
            .ok_or_else(|| Error::configuration("A speech provider must be specified"))?;
        if self.max_chars == 0 {
            return Err(Error::configuration_with_context(
                "max_chars must be greater than zero",
                ErrorContext::new().with_field_path("max_chars"),
            ));
        }
        let store =
            ArtifactStore::new(self.output_dir.unwrap_or_else(|| PathBuf::from("speech_output")))?;
        let catalog = match self.voices {
            Some(voices) => VoiceCatalog::with_voices(Arc::clone(&provider), voices),
            None => VoiceCatalog::new(Arc::clone(&provider)),
        };
        Ok(Synthesizer {
            provider,
            catalog,
            store,
            assembler: AudioAssembler::new(self.wav_encoding),
            max_chars: self.max_chars,
        })
    }
}

impl Default for SynthesizerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
