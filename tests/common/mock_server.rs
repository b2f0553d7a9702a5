//! Mock HTTP server standing in for the speech provider.

use mockito::{Matcher, Mock, Server, ServerGuard};
use speechgen::{HttpSpeechProvider, Synthesizer};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const SPEECH_PATH: &str = "/v1/audio/speech";
pub const VOICES_PATH: &str = "/voices";
pub const API_KEY: &str = "test-key";

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: Arc<Mutex<ServerGuard>>,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self {
            server: Arc::new(Mutex::new(server)),
            base_url,
        }
    }

    /// Provider pointed at the mock server, without a voice listing.
    pub fn provider(&self) -> HttpSpeechProvider {
        HttpSpeechProvider::builder()
            .name("mock")
            .base_url(&self.base_url)
            .api_key(API_KEY)
            .timeout_secs(5)
            .build()
            .expect("build provider")
    }

    /// Provider pointed at the mock server, listing voices at [`VOICES_PATH`].
    pub fn provider_with_voices(&self) -> HttpSpeechProvider {
        HttpSpeechProvider::builder()
            .name("mock")
            .base_url(&self.base_url)
            .voices_path(VOICES_PATH)
            .api_key(API_KEY)
            .timeout_secs(5)
            .build()
            .expect("build provider")
    }

    pub fn synthesizer(&self, output_dir: &Path, max_chars: usize) -> Synthesizer {
        Synthesizer::builder()
            .provider(Arc::new(self.provider()))
            .output_dir(output_dir)
            .max_chars(max_chars)
            .build()
            .expect("build synthesizer")
    }

    /// Every speech request answers with `audio` as WAV.
    pub async fn mock_speech(&self, audio: Vec<u8>, expected_calls: usize) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", SPEECH_PATH)
            .match_header("authorization", format!("Bearer {}", API_KEY).as_str())
            .with_status(200)
            .with_header("content-type", "audio/wav")
            .with_body(audio)
            .expect(expected_calls)
            .create_async()
            .await
    }

    /// Speech requests whose JSON body contains `partial` answer with `audio`.
    pub async fn mock_speech_matching(
        &self,
        partial: serde_json::Value,
        audio: Vec<u8>,
    ) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", SPEECH_PATH)
            .match_body(Matcher::PartialJson(partial))
            .with_status(200)
            .with_header("content-type", "audio/wav")
            .with_body(audio)
            .create_async()
            .await
    }

    /// Create a mock for an error response
    pub async fn mock_speech_error(&self, status: usize, body: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", SPEECH_PATH)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    pub async fn mock_voices(&self, body: &str, expected_calls: usize) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("GET", VOICES_PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(expected_calls)
            .create_async()
            .await
    }
}
