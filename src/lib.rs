//! # speechgen
//!
//! Text-to-speech generation on top of an external speech provider.
//!
//! Text of any length goes in; a single WAV file in an output directory comes
//! out. Long text is split on sentence boundaries, each segment is synthesized
//! by the provider, and the resulting chunks are decoded and joined into one
//! artifact.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use speechgen::{Settings, SynthesisRequest, Synthesizer};
//!
//! #[tokio::main]
//! async fn main() -> speechgen::Result<()> {
//!     let settings = Settings::load(None)?;
//!     let synthesizer = Synthesizer::from_settings(&settings)?;
//!
//!     let request = SynthesisRequest::new("Hello world.", "alloy");
//!     let artifact = synthesizer.synthesize(&request).await?;
//!     println!("{} ({:?})", artifact.path.display(), artifact.duration);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`synth`] | The synthesis pipeline ([`Synthesizer`]) |
//! | [`tts`] | Provider boundary, HTTP provider, voice catalog |
//! | [`audio`] | Chunk decoding and WAV assembly |
//! | [`text`] | Sentence-aware text splitting |
//! | [`store`] | Output directory management |
//! | [`config`] | Settings from YAML and environment |
//! | [`error_code`] | Failure kinds for synthesis errors |

pub mod artifact;
pub mod audio;
pub mod config;
pub mod error_code;
pub mod store;
pub mod synth;
pub mod text;
pub mod tts;

// Re-export main types for convenience
pub use artifact::AudioArtifact;
pub use audio::{AudioAssembler, WavEncoding};
pub use config::{ProviderSettings, Settings};
pub use error_code::FailureKind;
pub use store::ArtifactStore;
pub use synth::{Synthesizer, SynthesizerBuilder};
pub use tts::{
    AudioChunk, AudioFormat, HttpSpeechProvider, SpeechProvider, SynthesisProgress,
    SynthesisRequest, Voice, VoiceCatalog,
};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
