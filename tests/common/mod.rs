//! Shared test helpers: WAV fixtures and a mock speech provider server.

#![allow(dead_code)]

pub mod mock_server;

use std::io::Cursor;

/// Encode `seconds` of a 440 Hz tone as 16-bit PCM WAV.
pub fn tone_wav(seconds: f32, sample_rate: u32, channels: u16) -> Vec<u8> {
    wav_from_fn(seconds, sample_rate, channels, |t| {
        (t * 440.0 * 2.0 * std::f32::consts::PI).sin() * 0.3
    })
}

/// Encode `seconds` of silence as 16-bit PCM WAV.
pub fn silence_wav(seconds: f32, sample_rate: u32, channels: u16) -> Vec<u8> {
    wav_from_fn(seconds, sample_rate, channels, |_| 0.0)
}

fn wav_from_fn<F: Fn(f32) -> f32>(seconds: f32, sample_rate: u32, channels: u16, f: F) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let frames = (seconds * sample_rate as f32).round() as usize;
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).expect("wav writer");
        for i in 0..frames {
            let v = (f(i as f32 / sample_rate as f32) * i16::MAX as f32) as i16;
            for _ in 0..channels {
                writer.write_sample(v).expect("write sample");
            }
        }
        writer.finalize().expect("finalize wav");
    }
    cursor.into_inner()
}

/// Read a WAV file back as (spec, i16 samples).
pub fn read_wav(path: &std::path::Path) -> (hound::WavSpec, Vec<i16>) {
    let mut reader = hound::WavReader::open(path).expect("open wav");
    let spec = reader.spec();
    let samples = reader
        .samples::<i16>()
        .map(|s| s.expect("sample"))
        .collect();
    (spec, samples)
}

pub fn assert_secs_close(actual: std::time::Duration, expected: f64) {
    let actual = actual.as_secs_f64();
    assert!(
        (actual - expected).abs() < 0.01,
        "expected about {}s, got {}s",
        expected,
        actual
    );
}
