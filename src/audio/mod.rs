//! Audio assembly: symphonia decodes provider chunks, hound writes the merged WAV.

mod assembler;
pub mod decode;

pub use assembler::{AudioAssembler, WavEncoding};
pub use decode::PcmAudio;
