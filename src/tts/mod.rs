//! TTS module: the provider boundary, the HTTP provider and the voice catalog.

mod client;
mod provider;
mod types;
mod voices;

pub use client::{HttpSpeechProvider, HttpSpeechProviderBuilder};
pub use provider::{ProviderAudio, SpeechProvider};
pub use types::{
    locale_from_voice_id, AudioChunk, AudioFormat, SynthesisProgress, SynthesisRequest, Voice,
};
pub use voices::{builtin_voices, neural_voices, openai_voices, VoiceCatalog};
